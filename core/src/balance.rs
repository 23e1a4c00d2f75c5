use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-asset balance snapshot. The core reads `free`; the execution
/// orchestrator triggers a refresh after a completed cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Balance {
    pub free: f64,
    pub locked: f64,
    pub last_updated: u64,
}

impl Balance {
    /// Converts `free` into a USD-equivalent using `tickers` (asset ->
    /// USD price). Returns `None` if the asset has no known ticker,
    /// which the dispatcher's minimum-balance gate treats as "not
    /// eligible" rather than a fault.
    pub fn usd_equivalent(&self, asset: &str, tickers: &HashMap<String, f64>) -> Option<f64> {
        tickers.get(asset).map(|px| self.free * px)
    }
}
