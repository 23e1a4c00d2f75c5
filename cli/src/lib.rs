//! CLI surface: the orchestrator's inputs, as a `clap`-derived struct —
//! a flat `Parser` struct plus small conversion helpers into the
//! engine's own config types, rather than the engine reaching into
//! `clap` itself.

use adapters::StreamMode;
use clap::{Parser, ValueEnum};
use engine::EvaluatorConfig;

/// `clap`'s mirror of `adapters::StreamMode` — kept distinct so the
/// wire-facing enum doesn't need to derive `ValueEnum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamModeArg {
    Snapshot,
    Diff,
}

impl From<StreamModeArg> for StreamMode {
    fn from(v: StreamModeArg) -> Self {
        match v {
            StreamModeArg::Snapshot => StreamMode::Snapshot,
            StreamModeArg::Diff => StreamMode::Diff,
        }
    }
}

fn default_cpu_cap() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// The orchestrator's inputs, all given on the command line. No
/// defaults here are load-bearing business logic — they're convenient
/// starting points a deployment overrides.
#[derive(Debug, Clone, Parser)]
#[command(name = "kaskade", version, about = "Triangular arbitrage detector and executor")]
pub struct Cli {
    /// Starting assets to build cycles for. Empty means "every asset
    /// with a nonzero balance", resolved after the exchange snapshot
    /// loads.
    #[arg(long, value_delimiter = ',')]
    pub start_assets: Vec<String>,

    /// Assets to exclude from the starting-asset set even if they
    /// otherwise qualify.
    #[arg(long, value_delimiter = ',')]
    pub exclude_assets: Vec<String>,

    /// Minimum net return, as a percent, a plan must clear to be
    /// executed.
    #[arg(long, default_value_t = 0.1)]
    pub target_percent: f64,

    /// Number of equally spaced trial sizes the evaluator sweeps.
    #[arg(long, default_value_t = 10)]
    pub steps: u32,

    /// Per-trade fee rate applied against the running amount after
    /// each leg.
    #[arg(long, default_value_t = 0.001)]
    pub fee: f64,

    /// Nominal per-cycle trade size, in USD.
    #[arg(long, default_value_t = 300.0)]
    pub trade_size_usd: f64,

    /// Minimum USD-equivalent balance a starting asset must hold before
    /// its cycles are evaluated at all.
    #[arg(long, default_value_t = 10.0)]
    pub min_usd_balance: f64,

    /// Upper bound on simultaneous order-book subscriptions.
    #[arg(long, default_value_t = 200)]
    pub orderbook_connection_limit: usize,

    /// Snapshot (full book every message) or diff (incremental level
    /// updates) streaming mode.
    #[arg(long, value_enum, default_value_t = StreamModeArg::Diff)]
    pub stream_mode: StreamModeArg,

    /// Truncates the exchange's pair snapshot to at most this many
    /// entries.
    #[arg(long, default_value_t = 1000)]
    pub pair_cap: usize,

    /// Soft cap on worker threads the process may use.
    #[arg(long, default_value_t = default_cpu_cap())]
    pub cpu_cap: usize,

    /// WebSocket endpoint for the venue's depth streams. Wired to
    /// `adapters::WsExchangeClient`; the REST half of the venue
    /// integration (pairs metadata, balances, signed order submission)
    /// is out of this crate's scope and must be supplied by a concrete
    /// `ExchangeClient` before this binary can run against a real
    /// venue.
    #[arg(long, default_value = "wss://stream.example-exchange.invalid/ws")]
    pub ws_url: String,
}

impl Cli {
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            fee: self.fee,
            steps: self.steps,
            target_percent: self.target_percent,
        }
    }

    pub fn stream_mode(&self) -> StreamMode {
        self.stream_mode.into()
    }
}
