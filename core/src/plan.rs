use serde::{Deserialize, Serialize};

use crate::cycle::Cycle;

/// Scored output of the opportunity evaluator: a single proposal for
/// executing `cycle` at `initial` size in the starting asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlan {
    /// Size in the starting asset the sweep selected.
    pub initial: f64,
    /// Per-leg executed depth price.
    pub price: [f64; 3],
    /// Per-leg size to submit (quantity of base bought/sold).
    pub amount: [f64; 3],
    /// Absolute profit in the starting asset.
    pub profit: f64,
    /// `profit / initial * 100`.
    pub percent: f64,
    pub cycle: Cycle,
}

impl OrderPlan {
    /// `(initial + profit) / initial - 1) * 100` — expressed this way,
    /// rather than `profit / initial * 100`, to keep the return
    /// centered on the final balance a cycle actually leaves behind.
    pub fn compute_percent(initial: f64, profit: f64) -> f64 {
        if initial <= 0.0 {
            return 0.0;
        }
        ((initial + profit) / initial - 1.0) * 100.0
    }
}
