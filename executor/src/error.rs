use thiserror::Error;

/// Execution-time failures. `Aborted` is the safe, no-position-taken
/// outcome (leg 0 only); `Fatal` is a residual-position failure that
/// the orchestrator cannot recover from and that must stop the
/// process.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("cycle aborted safely: {0}")]
    Aborted(String),

    #[error("fatal execution failure: {0}")]
    Fatal(String),
}
