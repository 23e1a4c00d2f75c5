use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{Balance, Pair, Side};
use market::{BalanceStore, OrderBookStore};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::client::{ExchangeClient, TradeFill};

/// In-memory test double for `ExchangeClient`. Grounded on the
/// teacher's `MockExecutor` (`backend/src/execution/executor.rs`
/// tests): a call counter plus an optional "fail on call N" knob,
/// rather than a general-purpose mock framework.
pub struct MockExchange {
    pairs: Vec<Pair>,
    tickers: HashMap<String, f64>,
    balances: Mutex<HashMap<String, Balance>>,

    send_market_calls: AtomicUsize,
    fail_send_market_on_call: Option<usize>,
    send_market_result: f64,

    last_trade: TradeFill,

    update_balance_calls: AtomicUsize,
    fail_update_balance_on_call: Option<usize>,

    /// When set, `stream_book_depth`/`stream_book_diff` return an error
    /// on their first `n` invocations before succeeding (blocking until
    /// `shutdown` fires).
    stream_failures: Option<(Arc<AtomicUsize>, usize)>,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            tickers: HashMap::new(),
            balances: Mutex::new(HashMap::new()),
            send_market_calls: AtomicUsize::new(0),
            fail_send_market_on_call: None,
            send_market_result: 1.0,
            last_trade: TradeFill {
                price: 1.0,
                base_qty: 1.0,
                quote_qty: 1.0,
                fee: 0.0,
            },
            update_balance_calls: AtomicUsize::new(0),
            fail_update_balance_on_call: None,
            stream_failures: None,
        }
    }
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairs(mut self, pairs: Vec<Pair>) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn with_tickers(mut self, tickers: HashMap<String, f64>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn with_balance(self, asset: &str, balance: Balance) -> Self {
        self.balances.lock().insert(asset.to_string(), balance);
        self
    }

    pub fn with_send_market_result(mut self, qty: f64) -> Self {
        self.send_market_result = qty;
        self
    }

    pub fn with_send_market_failure_on_call(mut self, call: usize) -> Self {
        self.fail_send_market_on_call = Some(call);
        self
    }

    pub fn with_last_trade(mut self, fill: TradeFill) -> Self {
        self.last_trade = fill;
        self
    }

    pub fn with_update_balance_failure_on_call(mut self, call: usize) -> Self {
        self.fail_update_balance_on_call = Some(call);
        self
    }

    pub fn with_stream_failures(mut self, counter: Arc<AtomicUsize>, max_failures: usize) -> Self {
        self.stream_failures = Some((counter, max_failures));
        self
    }

    pub fn send_market_call_count(&self) -> usize {
        self.send_market_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn all_pairs(&self) -> anyhow::Result<Vec<Pair>> {
        Ok(self.pairs.clone())
    }

    async fn pair(&self, name: &str) -> anyhow::Result<Pair> {
        self.pairs
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("pair not found: {name}"))
    }

    async fn all_tickers(&self) -> anyhow::Result<HashMap<String, f64>> {
        Ok(self.tickers.clone())
    }

    async fn update_balance(&self, balances: &BalanceStore) -> anyhow::Result<()> {
        let n = self.update_balance_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_update_balance_on_call == Some(n) {
            anyhow::bail!("dial tcp: connection refused");
        }
        let snapshot = self.balances.lock().clone();
        balances.replace_all(snapshot).await;
        Ok(())
    }

    async fn send_market(
        &self,
        _pair: &str,
        _side: Side,
        _base_qty: f64,
        _quote_qty: f64,
    ) -> anyhow::Result<f64> {
        let n = self.send_market_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_send_market_on_call == Some(n) {
            anyhow::bail!("insufficient balance for order");
        }
        Ok(self.send_market_result)
    }

    async fn last_trade(&self, _pair: &str, _n: u32) -> anyhow::Result<TradeFill> {
        Ok(self.last_trade)
    }

    async fn stream_book_depth(
        &self,
        _pair: &str,
        _books: &OrderBookStore,
        _changed: mpsc::UnboundedSender<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        if let Some((counter, max)) = &self.stream_failures {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= *max {
                anyhow::bail!("dial tcp: connection reset");
            }
        }
        let _ = shutdown.changed().await;
        Ok(())
    }

    async fn stream_book_diff(
        &self,
        pair: &str,
        books: &OrderBookStore,
        changed: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        self.stream_book_depth(pair, books, changed, shutdown).await
    }
}
