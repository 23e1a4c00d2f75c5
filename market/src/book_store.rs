use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use corelib::Side;
use dashmap::DashMap;
use parking_lot::Mutex;

/// A price key ordered by `f64::total_cmp`, so it can live as a
/// `BTreeMap` key. Prices in a streamed order book are always finite
/// and non-negative; `total_cmp` gives a correct total order for that
/// domain without pulling in an external newtype crate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PriceKey(f64);

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One price level materialized for a consumer, with the running
/// cumulative size from the top of book through this level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelView {
    pub price: f64,
    pub size: f64,
    pub cumulative_size: f64,
}

/// Result of a depth-consuming price lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthLookup {
    Price(f64),
    InsufficientDepth,
}

/// Per-pair book: two price-keyed size maps plus a last-update stamp.
/// Size zero removes the key (applied in `apply_update`).
#[derive(Debug, Default)]
struct Book {
    asks: BTreeMap<PriceKey, f64>,
    bids: BTreeMap<PriceKey, f64>,
    last_updated: u64,
}

impl Book {
    fn side_map(&mut self, side: Side) -> &mut BTreeMap<PriceKey, f64> {
        match side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        }
    }

    fn side_map_ref(&self, side: Side) -> &BTreeMap<PriceKey, f64> {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }
}

/// Concurrent per-pair order-book store.
///
/// Concurrency model: one `parking_lot::Mutex<Book>` per pair, sharded
/// across pairs via `dashmap` (the same crate
/// `examples/joaquinbejar-OrderBook-rs` uses for its concurrent book).
/// The mutex is held only across a mutation or a sorted-view
/// materialization, never across an `.await` — so a reader always sees
/// a consistent snapshot (no partially-applied update is observable)
/// and the evaluator's lock-hold time is bounded by however many levels
/// it asks for.
///
/// `books` is `Arc`-wrapped so `OrderBookStore::clone` shares the one
/// underlying map — every subscription task (writer) and the dispatcher
/// (reader) must see the same store, not an independent copy.
#[derive(Clone, Default)]
pub struct OrderBookStore {
    books: Arc<DashMap<String, Mutex<Book>>>,
}

impl OrderBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a batch of `(price, size)` level updates to one side of
    /// `pair`'s book. `size == 0.0` removes the level; applying an
    /// update to an absent level with `size == 0.0` is a no-op.
    pub fn apply_update(&self, pair: &str, side: Side, levels: &[(f64, f64)], ts_ms: u64) {
        let entry = self.books.entry(pair.to_string()).or_default();
        let mut book = entry.lock();

        let map = book.side_map(side);
        for &(price, size) in levels {
            let key = PriceKey(price);
            if size <= 0.0 {
                map.remove(&key);
            } else {
                map.insert(key, size);
            }
        }
        book.last_updated = ts_ms;
    }

    /// Clears both sides of `pair`'s book, keeping the entry (and its
    /// lock) around. Used on reconnect so pre- and post-reconnect state
    /// are never mixed.
    pub fn reset(&self, pair: &str) {
        if let Some(entry) = self.books.get(pair) {
            let mut book = entry.lock();
            book.asks.clear();
            book.bids.clear();
        }
        tracing::debug!(pair, "order book reset");
    }

    /// Removes `pair` entirely.
    pub fn delete(&self, pair: &str) {
        self.books.remove(pair);
        tracing::debug!(pair, "order book deleted");
    }

    pub fn last_updated(&self, pair: &str) -> Option<u64> {
        self.books.get(pair).map(|e| e.lock().last_updated)
    }

    /// Materializes the sorted view for one side: asks ascending by
    /// price, bids descending, each level annotated with the running
    /// cumulative size from the top of book.
    pub fn sorted_view(&self, pair: &str, side: Side) -> Option<Vec<LevelView>> {
        let entry = self.books.get(pair)?;
        let book = entry.lock();
        let map = book.side_map_ref(side);

        let mut cumulative = 0.0;
        let levels: Vec<LevelView> = match side {
            Side::Buy => map
                .iter()
                .map(|(k, &size)| {
                    cumulative += size;
                    LevelView {
                        price: k.0,
                        size,
                        cumulative_size: cumulative,
                    }
                })
                .collect(),
            Side::Sell => map
                .iter()
                .rev()
                .map(|(k, &size)| {
                    cumulative += size;
                    LevelView {
                        price: k.0,
                        size,
                        cumulative_size: cumulative,
                    }
                })
                .collect(),
        };

        Some(levels)
    }

    /// Returns the price of the first level whose cumulative size is
    /// >= `need`, i.e. the single execution price at which `need` is
    /// fully covered by displayed depth at or better than that price.
    /// `DepthLookup::InsufficientDepth` if no level satisfies it, or if
    /// the book for `pair` does not exist yet.
    pub fn depth_price(&self, pair: &str, side: Side, need: f64) -> DepthLookup {
        let Some(levels) = self.sorted_view(pair, side) else {
            return DepthLookup::InsufficientDepth;
        };
        if levels.is_empty() || need <= 0.0 {
            return DepthLookup::InsufficientDepth;
        }
        for level in &levels {
            if level.cumulative_size >= need {
                return DepthLookup::Price(level.price);
            }
        }
        DepthLookup::InsufficientDepth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_zero_removes_level_and_is_noop_when_absent() {
        let store = OrderBookStore::new();
        store.apply_update("BTCUSDT", Side::Buy, &[(100.0, 1.0)], 1);
        store.apply_update("BTCUSDT", Side::Buy, &[(100.0, 0.0)], 2);

        let view = store.sorted_view("BTCUSDT", Side::Buy).unwrap();
        assert!(view.is_empty());

        // Removing an already-absent level is a no-op, not an error.
        store.apply_update("BTCUSDT", Side::Buy, &[(999.0, 0.0)], 3);
        assert!(store.sorted_view("BTCUSDT", Side::Buy).unwrap().is_empty());
    }

    #[test]
    fn asks_ascending_bids_descending_with_cumulative_totals() {
        let store = OrderBookStore::new();
        store.apply_update(
            "BTCUSDT",
            Side::Buy,
            &[(101.0, 1.0), (100.0, 2.0), (102.0, 3.0)],
            1,
        );
        store.apply_update(
            "BTCUSDT",
            Side::Sell,
            &[(99.0, 1.0), (98.0, 2.0), (97.0, 3.0)],
            1,
        );

        let asks = store.sorted_view("BTCUSDT", Side::Buy).unwrap();
        let prices: Vec<f64> = asks.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 101.0, 102.0]);
        assert_eq!(asks[0].cumulative_size, 2.0);
        assert_eq!(asks[1].cumulative_size, 3.0);
        assert_eq!(asks[2].cumulative_size, 6.0);

        let bids = store.sorted_view("BTCUSDT", Side::Sell).unwrap();
        let prices: Vec<f64> = bids.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![99.0, 98.0, 97.0]);
        assert_eq!(bids[0].cumulative_size, 1.0);
        assert_eq!(bids[2].cumulative_size, 6.0);
    }

    #[test]
    fn depth_price_returns_insufficient_when_no_level_covers_need() {
        let store = OrderBookStore::new();
        store.apply_update("BTCUSDT", Side::Buy, &[(100.0, 1.0)], 1);

        assert_eq!(
            store.depth_price("BTCUSDT", Side::Buy, 2.0),
            DepthLookup::InsufficientDepth
        );
        assert_eq!(
            store.depth_price("BTCUSDT", Side::Buy, 0.5),
            DepthLookup::Price(100.0)
        );
    }

    #[test]
    fn missing_book_is_insufficient_depth() {
        let store = OrderBookStore::new();
        assert_eq!(
            store.depth_price("UNKNOWN", Side::Buy, 1.0),
            DepthLookup::InsufficientDepth
        );
    }

    #[test]
    fn reset_clears_both_sides_delete_removes_pair() {
        let store = OrderBookStore::new();
        store.apply_update("BTCUSDT", Side::Buy, &[(100.0, 1.0)], 1);
        store.apply_update("BTCUSDT", Side::Sell, &[(99.0, 1.0)], 1);

        store.reset("BTCUSDT");
        assert!(store.sorted_view("BTCUSDT", Side::Buy).unwrap().is_empty());
        assert!(store.sorted_view("BTCUSDT", Side::Sell).unwrap().is_empty());

        store.delete("BTCUSDT");
        assert!(store.sorted_view("BTCUSDT", Side::Buy).is_none());
    }

    #[test]
    fn reconnect_only_contains_post_reconnect_messages() {
        let store = OrderBookStore::new();
        store.apply_update("BTCUSDT", Side::Buy, &[(100.0, 1.0)], 1);

        store.delete("BTCUSDT");
        store.apply_update("BTCUSDT", Side::Buy, &[(105.0, 2.0)], 2);

        let view = store.sorted_view("BTCUSDT", Side::Buy).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].price, 105.0);
    }
}
