use emabot_domain::repositories::brokerage::{
    AccountInfo, BrokerageApi, BrokerageError, MarketDataRequest, OrderTicket,
};
use emabot_domain::value_objects::bar::Bar;
use tracing::info;

const PLACEHOLDER_ORDER_ID: &str = "12345";
const PLACEHOLDER_BALANCE: f64 = 100_000.0;

/// Placeholder TradeLocker session. It never touches the network: every call logs what
/// it would do and answers with canned data.
#[derive(Debug, Clone)]
pub struct TradeLockerClient {
    api_key: String,
    connected: bool,
    balance: f64,
}

impl TradeLockerClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            connected: false,
            balance: PLACEHOLDER_BALANCE,
        }
    }

    fn ensure_connected(&self) -> Result<(), BrokerageError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerageError::NotConnected)
        }
    }
}

impl BrokerageApi for TradeLockerClient {
    fn connect(&mut self) -> Result<(), BrokerageError> {
        info!("connecting to TradeLocker API");
        if self.api_key.trim().is_empty() {
            return Err(BrokerageError::Connection("api key is empty".to_string()));
        }
        self.connected = true;
        info!("connected to TradeLocker");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn get_market_data(&mut self, request: &MarketDataRequest) -> Result<Vec<Bar>, BrokerageError> {
        self.ensure_connected()?;
        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            bars = request.bars,
            "fetching market data"
        );
        Ok(Vec::new())
    }

    fn place_order(&mut self, ticket: &OrderTicket) -> Result<String, BrokerageError> {
        self.ensure_connected()?;
        info!(
            side = %ticket.side,
            qty = ticket.quantity,
            symbol = %ticket.symbol,
            order_type = %ticket.order_type,
            price = ?ticket.price,
            "placing order"
        );
        Ok(PLACEHOLDER_ORDER_ID.to_string())
    }

    fn get_account_info(&mut self) -> Result<AccountInfo, BrokerageError> {
        self.ensure_connected()?;
        info!("fetching account information");
        Ok(AccountInfo {
            balance: self.balance,
            positions: Vec::new(),
        })
    }

    fn disconnect(&mut self) {
        if self.connected {
            info!("disconnecting from TradeLocker API");
        }
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emabot_domain::value_objects::side::Side;

    fn ticket() -> OrderTicket {
        OrderTicket {
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            quantity: 10.0,
            order_type: "market".to_string(),
            price: None,
        }
    }

    #[test]
    fn canned_responses_after_connect() {
        let mut client = TradeLockerClient::new("key");
        assert_eq!(client.place_order(&ticket()), Err(BrokerageError::NotConnected));

        client.connect().unwrap();
        assert!(client.is_connected());
        assert_eq!(client.place_order(&ticket()).unwrap(), "12345");
        let account = client.get_account_info().unwrap();
        assert_eq!(account.balance, 100_000.0);
        assert!(account.positions.is_empty());

        client.disconnect();
        assert!(!client.is_connected());
    }

    #[test]
    fn empty_key_fails_to_connect() {
        let mut client = TradeLockerClient::new(" ");
        assert!(matches!(client.connect(), Err(BrokerageError::Connection(_))));
        assert!(!client.is_connected());
    }
}
