use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use adapters::ExchangeClient;
use corelib::{OrderPlan, Side};
use market::BalanceStore;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::ExecError;
use crate::retry;

/// Tuning knobs for `ExecutionOrchestrator`, sourced from `cli::Cli` at
/// startup so fee calibration and retry counts live in config rather than
/// as compiled-in constants.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub fee: f64,
    /// Base process-wide cooldown after any completed or aborted cycle.
    pub cooldown_window_ms: i64,
    /// Extra cooldown stacked on top of the base window when the first
    /// leg of a cycle fails transiently, so a flaky book doesn't get
    /// hammered with retries.
    pub leg0_penalty_ms: i64,
    pub max_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fee: 0.001,
            cooldown_window_ms: 30_000,
            leg0_penalty_ms: 5 * 60_000,
            max_retries: 5,
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Drives one cycle's three legs to completion, serializing execution
/// process-wide via a single atomic cooldown timestamp. Owns no retry
/// state across cycles — each `execute_cycle` call starts clean.
pub struct ExecutionOrchestrator<C: ExchangeClient> {
    client: Arc<C>,
    balances: BalanceStore,
    config: OrchestratorConfig,
    cooldown_until_ms: AtomicI64,
    /// Surfaces `Fatal` failures to the process's single shutdown
    /// channel, carrying a short reason string along with the signal.
    fatal_tx: mpsc::UnboundedSender<String>,
}

impl<C: ExchangeClient> ExecutionOrchestrator<C> {
    pub fn new(
        client: Arc<C>,
        balances: BalanceStore,
        config: OrchestratorConfig,
        fatal_tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            client,
            balances,
            config,
            cooldown_until_ms: AtomicI64::new(0),
            fatal_tx,
        }
    }

    /// Advisory check for dispatchers deciding whether to even evaluate
    /// a cycle. Not authoritative — `execute_cycle` re-checks at commit.
    pub fn guard_allows(&self, now: i64) -> bool {
        now >= self.cooldown_until_ms.load(Ordering::SeqCst)
    }

    /// Atomically claims the cooldown slot if it isn't already held.
    /// Closes the race between the dispatcher's advisory `guard_allows`
    /// check and the actual commit by re-checking the guard at the
    /// moment of commit.
    fn try_arm(&self, now: i64) -> bool {
        let current = self.cooldown_until_ms.load(Ordering::SeqCst);
        if now < current {
            return false;
        }
        self.cooldown_until_ms
            .compare_exchange(
                current,
                now + self.config.cooldown_window_ms,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn extend_cooldown_penalty(&self, now: i64) {
        self.cooldown_until_ms
            .fetch_max(now + self.config.leg0_penalty_ms, Ordering::SeqCst);
    }

    async fn report_fatal(&self, message: &str) {
        warn!(message, "execution orchestrator entering Fatal state");
        let _ = self.fatal_tx.send(message.to_string());
    }

    /// Runs `plan`'s three legs in order. Re-arms the cooldown at commit
    /// time; if another cycle already holds it, aborts without
    /// submitting any order.
    pub async fn execute_cycle(&self, plan: &OrderPlan) -> Result<(), ExecError> {
        let now = now_ms();
        if !self.try_arm(now) {
            return Err(ExecError::Aborted("cooldown already armed".into()));
        }

        let mut amount = plan.amount;
        // `plan.amount[0]` is the evaluator's leg-0 quantity, which for a
        // Buy leg is the *base* bought (its output), not the quote
        // notional the order must be submitted with (spec.md §4.E: "For
        // Buy, size is interpreted in quote notional"). `plan.initial` is
        // that quote notional in the starting asset. Legs 1-2 never need
        // this correction: their submit-amount is overwritten below by
        // the previous leg's actual fill, already in the right unit.
        if plan.cycle.legs[0].side == Side::Buy {
            amount[0] = plan.initial;
        }

        for i in 0..3 {
            let leg = &plan.cycle.legs[i];
            let rounded = leg.pair.round_to_step(amount[i]);

            match self.execute_leg(i, &plan.cycle.legs[i].clone(), rounded).await {
                Ok(filled) => {
                    if i < 2 {
                        // The fill is in the receiving asset, which by
                        // the cycle's continuity invariant is exactly
                        // the next leg's input amount.
                        amount[i + 1] = filled;
                    }
                    info!(leg = i, filled, "leg executed");
                }
                Err(ExecError::Aborted(reason)) => {
                    return Err(ExecError::Aborted(reason));
                }
                Err(fatal @ ExecError::Fatal(_)) => {
                    self.report_fatal(&fatal.to_string()).await;
                    return Err(fatal);
                }
            }
        }

        self.refresh_balances_with_retry().await
    }

    /// Submits leg `leg_idx`, retrying transient failures and shrinking
    /// the order size on size-related rejections. Returns the executed
    /// quantity in the receiving asset on success.
    async fn execute_leg(
        &self,
        leg_idx: usize,
        leg: &corelib::Leg,
        amount: f64,
    ) -> Result<f64, ExecError> {
        let original = amount;
        let mut current = amount;
        let mut transient_attempts = 0u32;

        loop {
            let (base_qty, quote_qty) = match leg.side {
                Side::Buy => (0.0, current),
                Side::Sell => (current, 0.0),
            };

            match self
                .client
                .send_market(&leg.pair.name, leg.side, base_qty, quote_qty)
                .await
            {
                Ok(filled) if filled > 0.0 => return Ok(filled),
                Ok(_) => return Ok(self.fallback_fill_qty(leg).await.unwrap_or(0.0)),
                Err(err) => {
                    if retry::is_transient(&err) {
                        if leg_idx == 0 {
                            self.extend_cooldown_penalty(now_ms());
                            return Err(ExecError::Aborted(format!(
                                "leg 0 transient failure: {err}"
                            )));
                        }
                        transient_attempts += 1;
                        if transient_attempts > self.config.max_retries {
                            return Err(ExecError::Fatal(format!(
                                "leg {leg_idx} transient retries exhausted: {err}"
                            )));
                        }
                        tokio::time::sleep(Duration::from_millis(100 * transient_attempts as u64))
                            .await;
                        continue;
                    }

                    match retry::shrink(current, original, self.config.fee) {
                        Some(shrunk) => {
                            current = shrunk;
                            continue;
                        }
                        None if leg_idx == 0 => {
                            return Err(ExecError::Aborted(format!(
                                "leg 0 hit size floor: {err}"
                            )));
                        }
                        None => {
                            return Err(ExecError::Fatal(format!(
                                "leg {leg_idx} hit size floor: {err}"
                            )));
                        }
                    }
                }
            }
        }
    }

    /// Re-derives a leg's fill quantity from the venue's last-trade
    /// endpoint when `send_market`'s own response didn't carry one
    /// (spec.md §6: "used as a fallback to re-derive leg amount if
    /// needed"). Returns `None` if the fallback call itself fails; the
    /// caller treats that the same as a zero fill rather than failing
    /// the leg outright, since the order has already gone through.
    async fn fallback_fill_qty(&self, leg: &corelib::Leg) -> Option<f64> {
        let fill = self.client.last_trade(&leg.pair.name, 1).await.ok()?;
        Some(match leg.side {
            Side::Buy => fill.base_qty,
            Side::Sell => fill.quote_qty,
        })
    }

    /// Balance refresh with bounded retries: 5 attempts, geometric
    /// backoff starting at 100µs, factor 3. Exhaustion is fatal.
    async fn refresh_balances_with_retry(&self) -> Result<(), ExecError> {
        let mut delay = Duration::from_micros(100);

        for attempt in 1..=5u32 {
            match self.client.update_balance(&self.balances).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt == 5 {
                        let message = format!("balance refresh exhausted retries: {err}");
                        self.report_fatal(&message).await;
                        return Err(ExecError::Fatal(message));
                    }
                    tokio::time::sleep(delay).await;
                    delay *= 3;
                }
            }
        }
        unreachable!("loop always returns by attempt 5")
    }
}
