use std::collections::HashMap;

use corelib::Pair;

use crate::error::MarketError;

/// Immutable catalog of tradable pairs, loaded once from the exchange
/// snapshot at startup. Lookup is by exact name and by `(base, quote)`
/// composition; both return `MarketError::*NotFound` when absent.
///
/// No mutation after construction — reads are lock-free (a plain
/// `HashMap` behind a shared, never-written-to `PairIndex` value).
#[derive(Debug, Clone)]
pub struct PairIndex {
    by_name: HashMap<String, Pair>,
    by_composition: HashMap<(String, String), String>,
}

impl PairIndex {
    /// Builds the index from the exchange's pair snapshot.
    ///
    /// `cap` mirrors a simple `pairs[:cap]` truncation on the exchange's
    /// raw listing — a configurable limit with no further semantics
    /// attached.
    pub fn build(mut pairs: Vec<Pair>, cap: usize) -> Result<Self, MarketError> {
        if pairs.is_empty() {
            return Err(MarketError::NoPairs);
        }
        if pairs.len() > cap {
            pairs.truncate(cap);
        }

        let mut by_name = HashMap::with_capacity(pairs.len());
        let mut by_composition = HashMap::with_capacity(pairs.len());

        for p in pairs {
            by_composition.insert((p.base.clone(), p.quote.clone()), p.name.clone());
            by_name.insert(p.name.clone(), p);
        }

        tracing::info!(pair_count = by_name.len(), "pair index built");

        Ok(Self {
            by_name,
            by_composition,
        })
    }

    pub fn by_name(&self, name: &str) -> Result<&Pair, MarketError> {
        self.by_name
            .get(name)
            .ok_or_else(|| MarketError::PairNotFound(name.to_string()))
    }

    pub fn by_composition(&self, base: &str, quote: &str) -> Result<&Pair, MarketError> {
        let name = self
            .by_composition
            .get(&(base.to_string(), quote.to_string()))
            .ok_or_else(|| MarketError::CompositionNotFound(base.to_string(), quote.to_string()))?;
        self.by_name(name)
    }

    /// Enabled pairs only — the set route enumeration is built from.
    pub fn enabled_pairs(&self) -> impl Iterator<Item = &Pair> {
        self.by_name.values().filter(|p| p.enabled)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
