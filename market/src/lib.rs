//! Market subsystem: the immutable pair catalog, the concurrent
//! order-book store, and the balance snapshot cache shared by the
//! dispatcher and execution orchestrator.

pub mod balance_store;
pub mod book_store;
pub mod error;
pub mod pair_index;

pub use balance_store::BalanceStore;
pub use book_store::{DepthLookup, LevelView, OrderBookStore};
pub use error::MarketError;
pub use pair_index::PairIndex;
