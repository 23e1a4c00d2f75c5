//! Stream dispatcher: fan-in from many per-pair subscriptions to a
//! single evaluator, plus the periodic ticker/balance refresh task that
//! feeds the dispatcher's minimum-USD-equivalent gate.

pub mod dispatcher;
pub mod ticker;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use ticker::TickerStore;
