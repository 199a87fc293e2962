pub mod audit;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod ohlcv;
pub mod strategy;
