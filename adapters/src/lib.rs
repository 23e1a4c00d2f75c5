//! Exchange adapter capability set and the stream subscription
//! reconnect policy.

pub mod client;
pub mod mock;
pub mod subscription;
pub mod ws_client;

pub use client::{ExchangeClient, StreamMode, TradeFill};
pub use mock::MockExchange;
pub use subscription::run_pair_subscription;
pub use ws_client::WsExchangeClient;
