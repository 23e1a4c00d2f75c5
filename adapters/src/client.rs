use std::collections::HashMap;

use async_trait::async_trait;
use corelib::{Pair, Side};
use market::BalanceStore;
use tokio::sync::{mpsc, watch};

/// A single fill, as reported by the venue's last-trade endpoint. Used
/// as a fallback to re-derive a leg's executed amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeFill {
    pub price: f64,
    pub base_qty: f64,
    pub quote_qty: f64,
    pub fee: f64,
}

/// Snapshot (`stream_book_depth`) vs incremental diff
/// (`stream_book_diff`) subscription mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Snapshot,
    Diff,
}

/// The capability set the core depends on, per the "interface-per-
/// exchange" redesign note in spec.md §9: a polymorphic exchange
/// abstraction reduced to exactly the operations the core calls,
/// instead of one concrete client type threaded everywhere. Grounded on
/// the teacher's narrow, `#[async_trait] pub trait X: Send + Sync`
/// capability traits (`executor/src/types.rs`'s `MarketReader` /
/// `SwapBuilder` / `TonClient` / `Notifier`).
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn all_pairs(&self) -> anyhow::Result<Vec<Pair>>;

    async fn pair(&self, name: &str) -> anyhow::Result<Pair>;

    /// name -> USD price. Used only to convert balances to USD-equivalent
    /// for the dispatcher's minimum-balance gate.
    async fn all_tickers(&self) -> anyhow::Result<HashMap<String, f64>>;

    /// Refreshes `balances` with the venue's current per-asset free/locked
    /// amounts. Called by the hourly ticker task and by the orchestrator
    /// after a completed cycle (§4.E step 4).
    async fn update_balance(&self, balances: &BalanceStore) -> anyhow::Result<()>;

    /// Submits a market order. Exactly one of `base_qty`/`quote_qty` is
    /// non-zero — `Buy` legs size in quote notional where the venue
    /// supports it, `Sell` legs size in base. Returns the filled
    /// quantity in the receiving asset.
    async fn send_market(
        &self,
        pair: &str,
        side: Side,
        base_qty: f64,
        quote_qty: f64,
    ) -> anyhow::Result<f64>;

    /// The most recent `n` trades' aggregate fill, used as a fallback to
    /// re-derive a leg's amount if the order response didn't carry one.
    async fn last_trade(&self, pair: &str, n: u32) -> anyhow::Result<TradeFill>;

    /// Runs a full-snapshot depth subscription for `pair` until a read
    /// error occurs or `shutdown` fires. Every message applies a full
    /// replacement of both sides to `books` and enqueues `pair`'s name
    /// onto `changed`.
    async fn stream_book_depth(
        &self,
        pair: &str,
        books: &market::OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>;

    /// As `stream_book_depth`, but applies incremental level diffs
    /// instead of full snapshots.
    async fn stream_book_diff(
        &self,
        pair: &str,
        books: &market::OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>;
}
