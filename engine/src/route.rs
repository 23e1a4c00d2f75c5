//! Route enumeration (§4.B).
//!
//! A single generic routine drives all four topologies (BBS/BSS/SBB/SSB)
//! instead of four near-duplicate generators, per the "route-strategy
//! variants" redesign note in spec.md §9. Each topology is just a side
//! pattern (`Topology::sides`); the routine below walks leg 1, then leg
//! 2, both by scanning the enabled-pair catalog for a matching side, and
//! resolves leg 3 by an exact `(base, quote)` lookup — dropping the
//! candidate silently if that composition doesn't exist, per spec.md.

use std::collections::HashMap;

use corelib::{Cycle, Leg, Pair, Side, Topology};
use market::PairIndex;

/// The enumerated cycle set plus the `pair -> cycle indices` wakeup
/// index the stream dispatcher (§4.F) uses for O(1) routing, and a
/// `start_asset -> cycle indices` index for the configured starting-
/// asset filter (§6).
#[derive(Debug, Default)]
pub struct RouteIndex {
    cycles: Vec<Cycle>,
    by_pair: HashMap<String, Vec<usize>>,
    by_start_asset: HashMap<String, Vec<usize>>,
}

impl RouteIndex {
    /// Enumerates every valid cycle, across all four topologies, for
    /// each asset in `start_assets`.
    pub fn build(pair_index: &PairIndex, start_assets: &[String]) -> Self {
        let mut cycles = Vec::new();

        for start in start_assets {
            for topology in Topology::ALL {
                enumerate_topology(pair_index, start, topology, &mut cycles);
            }
        }

        let mut by_pair: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_start_asset: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, cycle) in cycles.iter().enumerate() {
            for name in cycle.pair_names() {
                by_pair.entry(name.to_string()).or_default().push(i);
            }
            by_start_asset
                .entry(cycle.start_asset.clone())
                .or_default()
                .push(i);
        }

        tracing::info!(
            cycle_count = cycles.len(),
            start_asset_count = start_assets.len(),
            "route enumeration complete"
        );

        Self {
            cycles,
            by_pair,
            by_start_asset,
        }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn cycles_for_pair(&self, pair_name: &str) -> impl Iterator<Item = &Cycle> {
        self.by_pair
            .get(pair_name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.cycles[i])
    }

    pub fn cycles_for_start_asset(&self, asset: &str) -> impl Iterator<Item = &Cycle> {
        self.by_start_asset
            .get(asset)
            .into_iter()
            .flatten()
            .map(move |&i| &self.cycles[i])
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Input asset a leg of side `side` consumes, for pair `p`.
fn leg_input_asset(p: &Pair, side: Side) -> &str {
    match side {
        Side::Buy => p.quote.as_str(),
        Side::Sell => p.base.as_str(),
    }
}

/// Output asset a leg of side `side` produces, for pair `p`.
fn leg_output_asset(p: &Pair, side: Side) -> &str {
    match side {
        Side::Buy => p.base.as_str(),
        Side::Sell => p.quote.as_str(),
    }
}

fn enumerate_topology(
    pair_index: &PairIndex,
    start: &str,
    topology: Topology,
    out: &mut Vec<Cycle>,
) {
    let [s1, s2, s3] = topology.sides();

    for p1 in pair_index.enabled_pairs() {
        if leg_input_asset(p1, s1) != start {
            continue;
        }
        let after_leg1 = leg_output_asset(p1, s1).to_string();

        for p2 in pair_index.enabled_pairs() {
            if p2.name == p1.name {
                continue;
            }
            if leg_input_asset(p2, s2) != after_leg1 {
                continue;
            }
            let after_leg2 = leg_output_asset(p2, s2);
            // Excludes leg2 candidates that loop straight back to the
            // start asset, matching the "base/quote != a.quote/a.base"
            // constraints in spec.md §4.B's topology table.
            if after_leg2 == start {
                continue;
            }

            // Leg 3 is resolved by an exact composition lookup; a miss
            // drops the candidate silently (spec.md §4.B).
            let leg3_pair = match s3 {
                Side::Buy => pair_index.by_composition(start, after_leg2),
                Side::Sell => pair_index.by_composition(after_leg2, start),
            };
            let Ok(p3) = leg3_pair else {
                continue;
            };
            if p3.name == p1.name || p3.name == p2.name {
                continue;
            }

            let cycle = Cycle {
                start_asset: start.to_string(),
                topology,
                legs: [
                    Leg {
                        pair: p1.clone(),
                        side: s1,
                    },
                    Leg {
                        pair: p2.clone(),
                        side: s2,
                    },
                    Leg {
                        pair: p3.clone(),
                        side: s3,
                    },
                ],
            };

            if cycle.is_valid() {
                out.push(cycle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx() -> PairIndex {
        PairIndex::build(
            vec![
                Pair::new("AUSDT", "A", "USDT"),
                Pair::new("ABTC", "A", "BTC"),
                Pair::new("BTCUSDT", "BTC", "USDT"),
            ],
            1000,
        )
        .unwrap()
    }

    #[test]
    fn enumerates_classic_bss_cycle() {
        let pi = idx();
        let route = RouteIndex::build(&pi, &["USDT".to_string()]);

        let bss: Vec<_> = route
            .cycles()
            .iter()
            .filter(|c| c.topology == Topology::Bss)
            .collect();

        assert_eq!(bss.len(), 1);
        let c = bss[0];
        assert_eq!(c.pair_names(), ["AUSDT", "ABTC", "BTCUSDT"]);
        assert_eq!(c.legs[0].side, Side::Buy);
        assert_eq!(c.legs[1].side, Side::Sell);
        assert_eq!(c.legs[2].side, Side::Sell);
    }

    #[test]
    fn every_enumerated_cycle_is_valid_and_distinct() {
        let pi = idx();
        let route = RouteIndex::build(&pi, &["USDT".to_string(), "BTC".to_string(), "A".to_string()]);

        for cycle in route.cycles() {
            assert!(cycle.is_valid());
            let names = cycle.pair_names();
            assert_ne!(names[0], names[1]);
            assert_ne!(names[1], names[2]);
            assert_ne!(names[0], names[2]);
        }
    }

    #[test]
    fn pair_index_routes_to_containing_cycles() {
        let pi = idx();
        let route = RouteIndex::build(&pi, &["USDT".to_string()]);

        let via_ausdt: Vec<_> = route.cycles_for_pair("AUSDT").collect();
        assert_eq!(via_ausdt.len(), 1);

        let via_unrelated: Vec<_> = route.cycles_for_pair("NOPE").collect();
        assert!(via_unrelated.is_empty());
    }

    #[test]
    fn enumeration_is_deterministic_set_across_runs() {
        let pi = idx();
        let start = vec!["USDT".to_string()];

        let r1 = RouteIndex::build(&pi, &start);
        let r2 = RouteIndex::build(&pi, &start);

        let mut names1: Vec<_> = r1.cycles().iter().map(|c| c.pair_names()).collect();
        let mut names2: Vec<_> = r2.cycles().iter().map(|c| c.pair_names()).collect();
        names1.sort();
        names2.sort();
        assert_eq!(names1, names2);
    }

    #[test]
    fn disabled_pair_excluded_from_enumeration() {
        let mut pairs = vec![
            Pair::new("AUSDT", "A", "USDT"),
            Pair::new("ABTC", "A", "BTC"),
            Pair::new("BTCUSDT", "BTC", "USDT"),
        ];
        pairs[2].enabled = false;
        let pi = PairIndex::build(pairs, 1000).unwrap();

        let route = RouteIndex::build(&pi, &["USDT".to_string()]);
        assert!(route.cycles().is_empty());
    }
}
