pub mod action;
pub mod action_type;
pub mod bar;
pub mod equity_point;
pub mod order;
pub mod side;
pub mod timeframe;
pub mod trade;
