use thiserror::Error;

/// Startup/invariant failures (§7: "Config/invariant failure — fatal at
/// startup"). Everything past startup either resolves to a logged
/// "no opportunity" (evaluator) or an `executor::ExecError` surfaced on
/// the fatal-shutdown channel (§4.E, §7).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("market error: {0}")]
    Market(#[from] market::MarketError),

    #[error("no starting assets resolved (none configured and none hold a qualifying balance)")]
    NoStartAssets,

    #[error("{0}")]
    Fatal(String),
}
