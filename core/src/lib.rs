//! Shared domain types for the Kaskade triangular-arbitrage engine.
//!
//! This crate is deliberately dependency-light: it defines the data
//! model (`Pair`, `Side`, `Cycle`, `OrderPlan`, `Balance`, ...) that every
//! other crate in the workspace builds on, without pulling in async
//! runtimes or concurrency primitives.

pub mod balance;
pub mod cycle;
pub mod pair;
pub mod plan;

pub use balance::Balance;
pub use cycle::{Cycle, Leg, Topology};
pub use pair::{Pair, Side};
pub use plan::OrderPlan;
