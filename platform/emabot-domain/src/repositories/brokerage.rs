use crate::value_objects::bar::Bar;
use crate::value_objects::side::Side;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerageError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("not connected")]
    NotConnected,
    #[error("order rejected: {0}")]
    OrderRejected(String),
    #[error("request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub balance: f64,
    pub positions: Vec<BrokerPosition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerPosition {
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataRequest {
    pub symbol: String,
    pub timeframe: String,
    pub bars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub order_type: String,
    pub price: Option<f64>,
}

/// Session with an external brokerage.
pub trait BrokerageApi: Send {
    fn connect(&mut self) -> Result<(), BrokerageError>;
    fn is_connected(&self) -> bool;
    fn get_market_data(
        &mut self,
        request: &MarketDataRequest,
    ) -> Result<Vec<Bar>, BrokerageError>;
    /// Returns the brokerage's order id.
    fn place_order(&mut self, ticket: &OrderTicket) -> Result<String, BrokerageError>;
    fn get_account_info(&mut self) -> Result<AccountInfo, BrokerageError>;
    fn disconnect(&mut self);
}
