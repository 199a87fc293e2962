pub mod broker;
pub mod runner;

pub use broker::{BrokerEvents, SimBroker};
pub use runner::{EngineConfig, EngineResults, NoopControl, RunControl, StepOutcome, TradingEngine};
