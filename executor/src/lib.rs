//! Execution orchestrator: serializes a cycle's three market orders,
//! retries with re-derived amounts, enforces the process-wide cooldown,
//! and triggers balance refresh after a completed cycle.

pub mod error;
pub mod orchestrator;
pub mod retry;

pub use error::ExecError;
pub use orchestrator::{ExecutionOrchestrator, OrchestratorConfig};
