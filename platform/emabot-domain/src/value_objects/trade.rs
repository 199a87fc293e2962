use crate::value_objects::side::Side;

/// One executed fill, as recorded by metrics and written to `trades.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: i64,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub strategy_id: String,
    pub order_id: u64,
}

/// A round trip from the opening buy to the closing sell.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub opened_at: i64,
    pub closed_at: i64,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub pnl_net: f64,
}
