use std::collections::HashSet;
use std::sync::Arc;

use adapters::ExchangeClient;
use common::{annotate_span, child_span, TraceId};
use corelib::OrderPlan;
use engine::{sweep, EvaluatorConfig, RouteIndex};
use executor::ExecutionOrchestrator;
use market::{BalanceStore, OrderBookStore};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::ticker::TickerStore;

/// Dispatcher-level knobs sourced from the command-line surface: the
/// configured starting-asset exclusion list and the minimum USD-
/// equivalent balance a starting asset must clear before its cycles are
/// even evaluated.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub excluded_assets: HashSet<String>,
    pub min_usd_balance: f64,
    /// Nominal per-cycle trade size, in USD. Converted to the cycle's
    /// starting-asset units via the ticker store (falling back to the
    /// raw value when no ticker is known, i.e. the starting asset is
    /// itself USD-pegged).
    pub trade_size_usd: f64,
    pub evaluator: EvaluatorConfig,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The single consumer of the "pair changed" channel, draining it and
/// running evaluations serially. Owns no book/balance state itself —
/// everything it reads is a shared handle into `market`'s stores, so
/// the per-pair subscriptions (the writers) and this dispatcher (the
/// reader) never contend beyond the store's own internal locking.
pub struct Dispatcher<C: ExchangeClient> {
    routes: RouteIndex,
    books: OrderBookStore,
    balances: BalanceStore,
    tickers: TickerStore,
    orchestrator: Arc<ExecutionOrchestrator<C>>,
    config: DispatcherConfig,
}

impl<C: ExchangeClient + 'static> Dispatcher<C> {
    pub fn new(
        routes: RouteIndex,
        books: OrderBookStore,
        balances: BalanceStore,
        tickers: TickerStore,
        orchestrator: Arc<ExecutionOrchestrator<C>>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            routes,
            books,
            balances,
            tickers,
            orchestrator,
            config,
        }
    }

    /// Drains `changed` until the channel closes (all subscriptions
    /// dropped their sender, e.g. on shutdown).
    pub async fn run(&self, mut changed: mpsc::UnboundedReceiver<String>) {
        while let Some(pair) = changed.recv().await {
            self.on_pair_changed(&pair).await;
        }
    }

    /// One dispatcher tick: look up every cycle containing `pair`,
    /// evaluate the eligible ones, and hand any plan clearing the
    /// target to the orchestrator.
    async fn on_pair_changed(&self, pair: &str) {
        let trace_id = TraceId::new();
        let span = child_span("dispatcher_tick");

        async {
            annotate_span(Some(pair), None);

            for cycle in self.routes.cycles_for_pair(pair) {
                if self.config.excluded_assets.contains(&cycle.start_asset) {
                    continue;
                }
                if !self.orchestrator.guard_allows(now_ms()) {
                    // Cooldown armed: skip evaluation entirely rather
                    // than compute a plan that would just be discarded
                    // at commit time.
                    continue;
                }

                let Some(amt0) = self.trial_size(&cycle.start_asset).await else {
                    continue;
                };
                if !self.balance_gate_passes(&cycle.start_asset).await {
                    continue;
                }

                let Some(plan) = sweep(cycle, &self.books, amt0, self.config.evaluator) else {
                    continue;
                };

                tracing::info!(
                    trace_id = %trace_id.as_str(),
                    start_asset = %cycle.start_asset,
                    percent = plan.percent,
                    profit = plan.profit,
                    "opportunity found"
                );
                self.spawn_execution(plan);
            }
        }
        .instrument(span)
        .await;
    }

    /// Converts `config.trade_size_usd` into `asset` units via the
    /// ticker store; `None` only if the evaluator would reject a
    /// non-positive size anyway (kept as an explicit branch so a bad
    /// ticker price can't silently become a negative or zero trial).
    async fn trial_size(&self, asset: &str) -> Option<f64> {
        match self.tickers.price(asset).await {
            Some(price) if price > 0.0 => Some(self.config.trade_size_usd / price),
            Some(_) => None,
            None => Some(self.config.trade_size_usd),
        }
    }

    async fn balance_gate_passes(&self, asset: &str) -> bool {
        let Some(balance) = self.balances.get(asset).await else {
            return false;
        };
        let tickers = self.tickers.snapshot().await;
        match balance.usd_equivalent(asset, &tickers) {
            Some(usd) => usd >= self.config.min_usd_balance,
            // No known ticker for this asset: treat it as USD-pegged,
            // matching `trial_size`'s fallback above.
            None => balance.free >= self.config.min_usd_balance,
        }
    }

    /// Hands `plan` to the orchestrator on its own task so a slow
    /// execution (three sequential REST round-trips, possibly with
    /// retries) never blocks the dispatcher from draining the next
    /// "pair changed" message. Safe to run concurrently with the next
    /// tick: the orchestrator's atomic cooldown is the sole
    /// serialization point.
    fn spawn_execution(&self, plan: OrderPlan) {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            if let Err(err) = orchestrator.execute_cycle(&plan).await {
                tracing::warn!(error = %err, "cycle execution did not complete");
            }
        });
    }
}
