use async_trait::async_trait;
use corelib::Side;
use futures::{SinkExt, StreamExt};
use market::{BalanceStore, OrderBookStore};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::client::{ExchangeClient, TradeFill};

/// Minimal level-update wire shape a depth stream is expected to emit:
/// `{"symbol": "...", "asks": [[price, size], ...], "bids": [[price, size], ...]}`.
/// Full vs incremental is a property of which message the venue sends,
/// not of this struct.
#[derive(Debug, Deserialize)]
struct DepthMessage {
    symbol: String,
    #[serde(default)]
    asks: Vec<(f64, f64)>,
    #[serde(default)]
    bids: Vec<(f64, f64)>,
    ts_ms: u64,
}

/// WebSocket-backed depth stream against a single venue endpoint.
///
/// The REST half of `ExchangeClient` (pairs metadata, balances,
/// tickers, signed order submission) is an external collaborator this
/// crate only specifies at its interface. Those methods are left as
/// thin stubs here: the shape a concrete venue integration would fill
/// in, not filled in.
pub struct WsExchangeClient {
    pub ws_url: String,
}

impl WsExchangeClient {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    async fn run_depth_loop(
        &self,
        pair: &str,
        books: &OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (ws, _) = connect_async(&self.ws_url).await?;
        let (mut write, mut read) = ws.split();

        let subscribe = serde_json::json!({ "method": "subscribe", "symbol": pair });
        write
            .send(Message::Text(serde_json::to_string(&subscribe)?.into()))
            .await?;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(msg) = msg else { return Ok(()); };
                    let msg = msg?;
                    if !msg.is_text() {
                        continue;
                    }
                    let depth: DepthMessage = serde_json::from_str(msg.to_text()?)?;
                    if !depth.asks.is_empty() {
                        books.apply_update(&depth.symbol, Side::Buy, &depth.asks, depth.ts_ms);
                    }
                    if !depth.bids.is_empty() {
                        books.apply_update(&depth.symbol, Side::Sell, &depth.bids, depth.ts_ms);
                    }
                    let _ = changed.send(depth.symbol);
                }
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

#[async_trait]
impl ExchangeClient for WsExchangeClient {
    async fn all_pairs(&self) -> anyhow::Result<Vec<corelib::Pair>> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn pair(&self, _name: &str) -> anyhow::Result<corelib::Pair> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn all_tickers(&self) -> anyhow::Result<std::collections::HashMap<String, f64>> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn update_balance(&self, _balances: &BalanceStore) -> anyhow::Result<()> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn send_market(
        &self,
        _pair: &str,
        _side: Side,
        _base_qty: f64,
        _quote_qty: f64,
    ) -> anyhow::Result<f64> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn last_trade(&self, _pair: &str, _n: u32) -> anyhow::Result<TradeFill> {
        anyhow::bail!("REST exchange client is not implemented by WsExchangeClient")
    }

    async fn stream_book_depth(
        &self,
        pair: &str,
        books: &OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        self.run_depth_loop(pair, books, changed, shutdown).await
    }

    async fn stream_book_diff(
        &self,
        pair: &str,
        books: &OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        // Same wire decode as the snapshot path; whether the venue sends
        // full books or incremental diffs on this endpoint is a deployment
        // detail, not something this loop needs to distinguish.
        self.run_depth_loop(pair, books, changed, shutdown).await
    }
}
