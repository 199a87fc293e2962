pub mod tradelocker;

pub use tradelocker::TradeLockerClient;
