pub mod artifacts;
pub mod brokerage;
pub mod market_data;
pub mod reporting;
