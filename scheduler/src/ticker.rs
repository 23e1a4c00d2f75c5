use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adapters::ExchangeClient;
use market::BalanceStore;
use tokio::sync::{watch, RwLock};

/// Latest `asset -> USD price` snapshot, refreshed on an hourly timer.
/// Same `Arc<RwLock<HashMap<...>>>` shape as `market::BalanceStore` —
/// read by the dispatcher's minimum-USD-equivalent gate, written only
/// by `run_periodic_refresh`.
#[derive(Clone, Default)]
pub struct TickerStore {
    inner: Arc<RwLock<HashMap<String, f64>>>,
}

impl TickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn price(&self, asset: &str) -> Option<f64> {
        self.inner.read().await.get(asset).copied()
    }

    pub async fn replace_all(&self, snapshot: HashMap<String, f64>) {
        *self.inner.write().await = snapshot;
    }

    pub async fn snapshot(&self) -> HashMap<String, f64> {
        self.inner.read().await.clone()
    }
}

/// Runs `client.all_tickers()` + `client.update_balance()` once
/// immediately, then on every tick of `interval`, until `shutdown`
/// fires. Failures are logged and skipped — a missed hourly refresh is
/// routine, not fatal (unlike the orchestrator's post-trade refresh,
/// which has its own bounded-retry-then-fatal policy).
pub async fn run_periodic_refresh<C: ExchangeClient>(
    client: Arc<C>,
    tickers: TickerStore,
    balances: BalanceStore,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match client.all_tickers().await {
                    Ok(snapshot) => tickers.replace_all(snapshot).await,
                    Err(err) => tracing::warn!(error = %err, "periodic ticker refresh failed"),
                }
                if let Err(err) = client.update_balance(&balances).await {
                    tracing::warn!(error = %err, "periodic balance refresh failed");
                }
            }
            _ = shutdown.changed() => return,
        }

        if *shutdown.borrow() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::MockExchange;
    use corelib::Balance;

    #[tokio::test]
    async fn price_reflects_latest_replace_all() {
        let store = TickerStore::new();
        assert!(store.price("USDT").await.is_none());

        let mut snap = HashMap::new();
        snap.insert("USDT".to_string(), 1.0);
        store.replace_all(snap).await;

        assert_eq!(store.price("USDT").await, Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_populates_stores_and_stops_on_shutdown() {
        let client = Arc::new(
            MockExchange::new()
                .with_tickers(HashMap::from([("USDT".to_string(), 1.0)]))
                .with_balance(
                    "USDT",
                    Balance {
                        free: 10.0,
                        locked: 0.0,
                        last_updated: 1,
                    },
                ),
        );
        let tickers = TickerStore::new();
        let balances = BalanceStore::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let t2 = tickers.clone();
        let b2 = balances.clone();
        let handle = tokio::spawn(run_periodic_refresh(
            client,
            t2,
            b2,
            Duration::from_secs(3600),
            shutdown_rx,
        ));

        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(tickers.price("USDT").await, Some(1.0));
        assert_eq!(balances.get("USDT").await.unwrap().free, 10.0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
