use crate::value_objects::side::Side;
use std::collections::{BTreeMap, HashMap};

/// Long-only holding in one symbol, at its volume-weighted cost.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Holding {
    quantity: f64,
    avg_price: f64,
}

impl Holding {
    fn mark(&self, marks: &HashMap<String, f64>, symbol: &str) -> f64 {
        marks.get(symbol).copied().unwrap_or(self.avg_price)
    }
}

/// Cash and long positions shared by every symbol of a run.
#[derive(Debug, Default)]
pub struct Portfolio {
    holdings: BTreeMap<String, Holding>,
    cash: f64,
    realized_pnl: f64,
}

impl Portfolio {
    pub fn new_with_cash(initial_cash: f64) -> Self {
        Self {
            holdings: BTreeMap::new(),
            cash: initial_cash,
            realized_pnl: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Realized profit net of the exit fee; entry fees are already out of cash.
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn position_qty(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).map_or(0.0, |h| h.quantity)
    }

    pub fn avg_price(&self, symbol: &str) -> Option<f64> {
        self.holdings
            .get(symbol)
            .filter(|h| h.quantity > 0.0)
            .map(|h| h.avg_price)
    }

    /// Books a fill. Sells are capped at the held quantity and ignored when flat.
    pub fn apply_fill(&mut self, symbol: &str, side: Side, quantity: f64, price: f64, fee: f64) {
        if quantity <= 0.0 {
            return;
        }

        match side {
            Side::Buy => {
                self.cash -= quantity * price + fee;
                if self.cash < 0.0 && self.cash > -1e-9 {
                    self.cash = 0.0;
                }
                let holding = self.holdings.entry(symbol.to_string()).or_default();
                let total = holding.quantity + quantity;
                holding.avg_price = (holding.avg_price * holding.quantity + price * quantity) / total;
                holding.quantity = total;
            }
            Side::Sell => {
                let Some(holding) = self.holdings.get_mut(symbol) else {
                    return;
                };
                let sold = quantity.min(holding.quantity);
                if sold <= 0.0 {
                    return;
                }
                self.cash += sold * price - fee;
                self.realized_pnl += (price - holding.avg_price) * sold - fee;
                holding.quantity -= sold;
                if holding.quantity <= 0.0 {
                    self.holdings.remove(symbol);
                }
            }
        }
    }

    /// Cash plus every holding marked at the last known price for its symbol. Holdings
    /// with no known price are marked at their average cost.
    pub fn equity(&self, marks: &HashMap<String, f64>) -> f64 {
        self.cash
            + self
                .holdings
                .iter()
                .map(|(symbol, h)| h.quantity * h.mark(marks, symbol))
                .sum::<f64>()
    }

    pub fn unrealized_pnl(&self, marks: &HashMap<String, f64>) -> f64 {
        self.holdings
            .iter()
            .map(|(symbol, h)| (h.mark(marks, symbol) - h.avg_price) * h.quantity)
            .sum()
    }

    pub fn total_position_qty(&self) -> f64 {
        self.holdings.values().map(|h| h.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::Portfolio;
    use crate::value_objects::side::Side;
    use std::collections::HashMap;

    #[test]
    fn round_trip_moves_cash_and_books_profit() {
        let mut portfolio = Portfolio::new_with_cash(1000.0);
        portfolio.apply_fill("AAPL", Side::Buy, 1.0, 100.0, 1.0);
        assert_eq!(portfolio.position_qty("AAPL"), 1.0);
        assert_eq!(portfolio.avg_price("AAPL"), Some(100.0));
        assert!((portfolio.cash() - 899.0).abs() < 1e-9);

        portfolio.apply_fill("AAPL", Side::Sell, 1.0, 110.0, 1.0);
        assert_eq!(portfolio.position_qty("AAPL"), 0.0);
        assert_eq!(portfolio.avg_price("AAPL"), None);
        assert!((portfolio.cash() - 1008.0).abs() < 1e-9);
        assert!((portfolio.realized_pnl() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn selling_while_flat_changes_nothing() {
        let mut portfolio = Portfolio::new_with_cash(500.0);
        portfolio.apply_fill("AAPL", Side::Sell, 3.0, 100.0, 1.0);
        assert_eq!(portfolio.cash(), 500.0);
        assert_eq!(portfolio.total_position_qty(), 0.0);
    }

    #[test]
    fn averaging_up_weights_by_quantity() {
        let mut portfolio = Portfolio::new_with_cash(10_000.0);
        portfolio.apply_fill("AAPL", Side::Buy, 1.0, 100.0, 0.0);
        portfolio.apply_fill("AAPL", Side::Buy, 3.0, 120.0, 0.0);
        assert_eq!(portfolio.avg_price("AAPL"), Some(115.0));
    }

    #[test]
    fn equity_marks_each_symbol_at_its_own_price() {
        let mut portfolio = Portfolio::new_with_cash(1000.0);
        portfolio.apply_fill("AAPL", Side::Buy, 2.0, 100.0, 0.0);
        portfolio.apply_fill("MSFT", Side::Buy, 1.0, 300.0, 0.0);

        let mut marks = HashMap::new();
        marks.insert("AAPL".to_string(), 110.0);

        // MSFT has no mark yet and is carried at cost.
        assert!((portfolio.equity(&marks) - (500.0 + 220.0 + 300.0)).abs() < 1e-9);
        assert!((portfolio.unrealized_pnl(&marks) - 20.0).abs() < 1e-9);
    }
}
