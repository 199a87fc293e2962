use crate::services::indicators::{CrossOver, Ema};
use crate::value_objects::action::Action;
use crate::value_objects::bar::Bar;
use crate::value_objects::order::{OrderStatus, OrderUpdate};
use crate::value_objects::side::Side;
use crate::value_objects::trade::ClosedTrade;
use tracing::info;

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called once per new bar with the current position size in `bar.symbol`.
    fn on_bar(&mut self, _bar: &Bar, _position_qty: f64) -> Action {
        Action::hold()
    }

    fn notify_order(&mut self, _update: &OrderUpdate) {}

    fn notify_trade(&mut self, _trade: &ClosedTrade) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaCrossParams {
    pub fast: usize,
    pub slow: usize,
    pub stake: f64,
}

impl Default for EmaCrossParams {
    fn default() -> Self {
        Self {
            fast: 50,
            slow: 200,
            stake: 10.0,
        }
    }
}

/// Long-only EMA crossover: buy `stake` on a golden cross when flat, close the whole
/// position on a death cross. No new order goes out while one is in flight.
#[derive(Debug, Clone)]
pub struct EmaCross {
    params: EmaCrossParams,
    fast: Ema,
    slow: Ema,
    crossover: CrossOver,
    order_pending: bool,
    current_date: String,
}

impl EmaCross {
    pub fn new(params: EmaCrossParams) -> Self {
        Self {
            fast: Ema::new(params.fast),
            slow: Ema::new(params.slow),
            crossover: CrossOver::new(),
            order_pending: false,
            current_date: String::new(),
            params,
        }
    }

    pub fn params(&self) -> EmaCrossParams {
        self.params
    }

    pub fn has_pending_order(&self) -> bool {
        self.order_pending
    }

    pub fn fast_value(&self) -> Option<f64> {
        self.fast.value()
    }

    pub fn slow_value(&self) -> Option<f64> {
        self.slow.value()
    }
}

impl Strategy for EmaCross {
    fn name(&self) -> &str {
        "ema_cross"
    }

    fn on_bar(&mut self, bar: &Bar, position_qty: f64) -> Action {
        self.current_date = bar.date_label();
        let fast = self.fast.update(bar.close);
        let slow = self.slow.update(bar.close);
        let signal = match (fast, slow) {
            (Some(fast), Some(slow)) => self.crossover.update(fast, slow),
            _ => 0,
        };

        info!(
            date = %self.current_date,
            symbol = %bar.symbol,
            close = format_args!("{:.2}", bar.close),
            fast_ema = ?fast,
            slow_ema = ?slow,
            "bar"
        );

        if self.order_pending {
            return Action::hold();
        }

        if position_qty <= 0.0 {
            if signal > 0 {
                info!(date = %self.current_date, symbol = %bar.symbol, price = format_args!("{:.2}", bar.close), "BUY CREATE");
                self.order_pending = true;
                return Action::buy(self.params.stake);
            }
        } else if signal < 0 {
            info!(date = %self.current_date, symbol = %bar.symbol, price = format_args!("{:.2}", bar.close), "SELL CREATE");
            self.order_pending = true;
            return Action::sell(position_qty);
        }

        Action::hold()
    }

    fn notify_order(&mut self, update: &OrderUpdate) {
        match update.status {
            OrderStatus::Submitted | OrderStatus::Accepted => {}
            OrderStatus::Completed => {
                let price = update.executed_price.unwrap_or_default();
                let label = match update.side {
                    Side::Buy => "BUY EXECUTED",
                    Side::Sell => "SELL EXECUTED",
                };
                info!(
                    date = %self.current_date,
                    symbol = %update.symbol,
                    price = format_args!("{:.2}", price),
                    cost = format_args!("{:.2}", price * update.quantity),
                    commission = format_args!("{:.2}", update.commission),
                    "{label}"
                );
            }
            OrderStatus::Canceled | OrderStatus::Margin | OrderStatus::Rejected => {
                info!(
                    date = %self.current_date,
                    symbol = %update.symbol,
                    status = %update.status,
                    reason = update.reason.as_deref().unwrap_or(""),
                    "order canceled/margin/rejected"
                );
            }
        }
        if update.status.is_final() {
            self.order_pending = false;
        }
    }

    fn notify_trade(&mut self, trade: &ClosedTrade) {
        info!(
            date = %self.current_date,
            symbol = %trade.symbol,
            gross = format_args!("{:.2}", trade.pnl),
            net = format_args!("{:.2}", trade.pnl_net),
            "OPERATION PROFIT"
        );
    }
}
