pub mod backtesting;
pub mod config;
pub mod live_trading;
pub mod report;
mod shared;
