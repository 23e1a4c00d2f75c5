use thiserror::Error;

/// Config/invariant failures — fatal at startup.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("no pairs loaded from exchange snapshot")]
    NoPairs,

    #[error("pair not found: {0}")]
    PairNotFound(String),

    #[error("pair not found for composition ({0}, {1})")]
    CompositionNotFound(String, String),
}
