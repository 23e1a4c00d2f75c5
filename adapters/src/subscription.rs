use std::time::Duration;

use market::OrderBookStore;
use tokio::sync::{mpsc, watch};

use crate::client::{ExchangeClient, StreamMode};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Reconnect-forever wrapper around one pair's depth subscription:
/// connect, read until error, sleep, loop — with bounded exponential
/// backoff and book invalidation on error. One flapping pair never
/// affects another — each pair gets its own task and its own backoff
/// state.
pub async fn run_pair_subscription(
    client: &dyn ExchangeClient,
    pair: &str,
    mode: StreamMode,
    books: &OrderBookStore,
    changed: mpsc::UnboundedSender<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if *shutdown.borrow() {
            return;
        }

        let attempt = match mode {
            StreamMode::Snapshot => {
                client
                    .stream_book_depth(pair, books, changed.clone(), shutdown.clone())
                    .await
            }
            StreamMode::Diff => {
                client
                    .stream_book_diff(pair, books, changed.clone(), shutdown.clone())
                    .await
            }
        };

        if *shutdown.borrow() {
            return;
        }

        match attempt {
            Ok(()) => {
                // The stream ended without an error (shutdown observed
                // inside the adapter); nothing left to do.
                return;
            }
            Err(err) => {
                tracing::warn!(pair, error = %err, "book subscription error; reconnecting");
                books.delete(pair);

                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown.changed() => return,
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExchange;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn reconnects_after_error_and_stops_on_shutdown() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let client = MockExchange::new().with_stream_failures(attempts.clone(), 2);

        let books = OrderBookStore::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let books2 = books.clone();
        let handle = tokio::spawn(async move {
            run_pair_subscription(&client, "AUSDT", StreamMode::Snapshot, &books2, tx, shutdown_rx)
                .await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(attempts.load(Ordering::SeqCst) >= 1);
    }
}
