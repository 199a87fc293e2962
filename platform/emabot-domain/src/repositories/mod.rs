pub mod artifacts;
pub mod bar_source;
pub mod brokerage;
pub mod market_data;
