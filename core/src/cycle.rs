use serde::{Deserialize, Serialize};

use crate::pair::{Asset, Pair, Side};

/// The four side sequences that can return to a starting asset in
/// exactly three hops on a bipartite base/quote graph. See
/// `engine::route` for the generic enumeration routine parameterized
/// by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    Bbs,
    Bss,
    Sbb,
    Ssb,
}

impl Topology {
    pub const ALL: [Topology; 4] = [
        Topology::Bbs,
        Topology::Bss,
        Topology::Sbb,
        Topology::Ssb,
    ];

    /// The side pattern for this topology. `Ssb` resolves to
    /// `{Sell, Sell, Buy}` — the only pattern of the two candidates
    /// that actually returns to the start asset.
    pub fn sides(self) -> [Side; 3] {
        match self {
            Topology::Bbs => [Side::Buy, Side::Buy, Side::Sell],
            Topology::Bss => [Side::Buy, Side::Sell, Side::Sell],
            Topology::Sbb => [Side::Sell, Side::Buy, Side::Buy],
            Topology::Ssb => [Side::Sell, Side::Sell, Side::Buy],
        }
    }
}

/// One leg of a cycle: trade `pair` on `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub pair: Pair,
    pub side: Side,
}

impl Leg {
    /// The asset this leg consumes.
    pub fn input_asset(&self) -> &Asset {
        match self.side {
            Side::Buy => &self.pair.quote,
            Side::Sell => &self.pair.base,
        }
    }

    /// The asset this leg produces.
    pub fn output_asset(&self) -> &Asset {
        match self.side {
            Side::Buy => &self.pair.base,
            Side::Sell => &self.pair.quote,
        }
    }
}

/// A starting asset together with an ordered triple of legs that
/// returns a position back into that asset.
///
/// Invariants (enforced at construction time by `engine::route`, not
/// re-checked here):
/// 1. asset flow is continuous: `legs[i].output_asset() == legs[i+1].input_asset()`
/// 2. `legs[2].output_asset() == start_asset`
/// 3. all three pairs are distinct
/// 4. all three pairs are enabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub start_asset: Asset,
    pub topology: Topology,
    pub legs: [Leg; 3],
}

impl Cycle {
    /// All pair names touched by this cycle, in leg order.
    pub fn pair_names(&self) -> [&str; 3] {
        [
            self.legs[0].pair.name.as_str(),
            self.legs[1].pair.name.as_str(),
            self.legs[2].pair.name.as_str(),
        ]
    }

    /// True if every invariant in the doc comment above holds. Used by
    /// tests and by `engine::route` as a final sanity check before a
    /// candidate is admitted into the route index.
    pub fn is_valid(&self) -> bool {
        let flow_ok = self.legs[0].output_asset() == self.legs[1].input_asset()
            && self.legs[1].output_asset() == self.legs[2].input_asset()
            && self.legs[2].output_asset() == &self.start_asset
            && self.legs[0].input_asset() == &self.start_asset;

        let names = self.pair_names();
        let distinct = names[0] != names[1] && names[1] != names[2] && names[0] != names[2];

        let enabled = self.legs.iter().all(|l| l.pair.enabled);

        flow_ok && distinct && enabled
    }
}
