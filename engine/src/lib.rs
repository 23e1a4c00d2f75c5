//! Route enumeration (§4.B) and opportunity evaluation (§4.D).

pub mod evaluator;
pub mod route;

pub use evaluator::{evaluate_cycle, sweep, EvaluatorConfig};
pub use route::RouteIndex;
