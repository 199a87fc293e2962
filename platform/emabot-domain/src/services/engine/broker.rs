use crate::entities::portfolio::Portfolio;
use crate::value_objects::bar::Bar;
use crate::value_objects::equity_point::EquityPoint;
use crate::value_objects::order::{Order, OrderStatus, OrderUpdate};
use crate::value_objects::side::Side;
use crate::value_objects::trade::{ClosedTrade, Trade};
use std::collections::HashMap;

/// Everything that happened to the book while a bar was processed.
#[derive(Debug, Default, Clone)]
pub struct BrokerEvents {
    pub updates: Vec<OrderUpdate>,
    pub fills: Vec<Trade>,
    pub closed: Vec<ClosedTrade>,
}

#[derive(Debug, Clone)]
struct OpenLot {
    opened_at: i64,
    quantity: f64,
    entry_price: f64,
    commission: f64,
}

/// Market orders filled at the open of the next bar of their symbol, with commission
/// charged as a fraction of traded value. A buy whose cost plus commission exceeds
/// available cash is refused with [`OrderStatus::Margin`].
#[derive(Debug)]
pub struct SimBroker {
    portfolio: Portfolio,
    commission: f64,
    pending: Vec<Order>,
    next_order_id: u64,
    lots: HashMap<String, OpenLot>,
    marks: HashMap<String, f64>,
}

impl SimBroker {
    pub fn new(cash: f64, commission: f64) -> Self {
        Self {
            portfolio: Portfolio::new_with_cash(cash),
            commission: commission.max(0.0),
            pending: Vec::new(),
            next_order_id: 1,
            lots: HashMap::new(),
            marks: HashMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn position_qty(&self, symbol: &str) -> f64 {
        self.portfolio.position_qty(symbol)
    }

    pub fn pending_orders(&self) -> &[Order] {
        &self.pending
    }

    pub fn value(&self) -> f64 {
        self.portfolio.equity(&self.marks)
    }

    pub fn equity_point(&self, timestamp: i64) -> EquityPoint {
        EquityPoint {
            timestamp,
            equity: self.value(),
            cash: self.portfolio.cash(),
            position_qty: self.portfolio.total_position_qty(),
            unrealized_pnl: self.portfolio.unrealized_pnl(&self.marks),
            realized_pnl: self.portfolio.realized_pnl(),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// Queues a market order. Returns the notifications for the strategy, ending in
    /// `Accepted` or `Rejected`.
    pub fn submit(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: f64,
        timestamp: i64,
        broker_ref: Option<String>,
    ) -> Vec<OrderUpdate> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return vec![self.reject(symbol, side, quantity, timestamp, "non_positive_size")];
        }
        if side == Side::Sell && self.position_qty(symbol) <= 0.0 {
            return vec![self.reject(symbol, side, quantity, timestamp, "no_position")];
        }

        let mut order = Order {
            id: self.allocate_id(),
            symbol: symbol.to_string(),
            side,
            quantity,
            timestamp,
            status: OrderStatus::Submitted,
            broker_ref,
        };
        let submitted = OrderUpdate::from_order(&order, timestamp);
        order.status = OrderStatus::Accepted;
        let accepted = OrderUpdate::from_order(&order, timestamp);
        self.pending.push(order);
        vec![submitted, accepted]
    }

    /// Records an order that never reached the book.
    pub fn reject(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: f64,
        timestamp: i64,
        reason: &str,
    ) -> OrderUpdate {
        let order = Order {
            id: self.allocate_id(),
            symbol: symbol.to_string(),
            side,
            quantity,
            timestamp,
            status: OrderStatus::Rejected,
            broker_ref: None,
        };
        OrderUpdate::from_order(&order, timestamp).with_reason(reason)
    }

    /// Fills pending orders for `bar.symbol` created before this bar, then marks the
    /// symbol at the bar's close.
    pub fn process_bar(&mut self, bar: &Bar) -> BrokerEvents {
        let mut events = BrokerEvents::default();
        let (due, keep): (Vec<Order>, Vec<Order>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|order| order.symbol == bar.symbol && order.timestamp < bar.timestamp);
        self.pending = keep;

        for order in due {
            self.execute(order, bar, &mut events);
        }

        self.marks.insert(bar.symbol.clone(), bar.close);
        events
    }

    fn execute(&mut self, mut order: Order, bar: &Bar, events: &mut BrokerEvents) {
        let price = bar.open;
        match order.side {
            Side::Buy => {
                let value = order.quantity * price;
                let commission = value * self.commission;
                if value + commission > self.portfolio.cash() {
                    order.status = OrderStatus::Margin;
                    events.updates.push(
                        OrderUpdate::from_order(&order, bar.timestamp).with_reason("insufficient_cash"),
                    );
                    return;
                }
                self.portfolio
                    .apply_fill(&order.symbol, Side::Buy, order.quantity, price, commission);
                let lot = self.lots.entry(order.symbol.clone()).or_insert(OpenLot {
                    opened_at: bar.timestamp,
                    quantity: 0.0,
                    entry_price: 0.0,
                    commission: 0.0,
                });
                let total = lot.quantity + order.quantity;
                lot.entry_price = (lot.entry_price * lot.quantity + price * order.quantity) / total;
                lot.quantity = total;
                lot.commission += commission;
                self.complete(order, bar, price, commission, events);
            }
            Side::Sell => {
                let held = self.portfolio.position_qty(&order.symbol);
                if held <= 0.0 {
                    order.status = OrderStatus::Canceled;
                    events.updates.push(
                        OrderUpdate::from_order(&order, bar.timestamp).with_reason("no_position"),
                    );
                    return;
                }
                order.quantity = order.quantity.min(held);
                let commission = order.quantity * price * self.commission;
                self.portfolio
                    .apply_fill(&order.symbol, Side::Sell, order.quantity, price, commission);

                if let Some(lot) = self.lots.get_mut(&order.symbol) {
                    let share = (order.quantity / lot.quantity).min(1.0);
                    let entry_commission = lot.commission * share;
                    let pnl = (price - lot.entry_price) * order.quantity;
                    lot.quantity -= order.quantity;
                    lot.commission -= entry_commission;
                    if lot.quantity <= 0.0 {
                        events.closed.push(ClosedTrade {
                            symbol: order.symbol.clone(),
                            opened_at: lot.opened_at,
                            closed_at: bar.timestamp,
                            quantity: order.quantity,
                            entry_price: lot.entry_price,
                            exit_price: price,
                            pnl,
                            pnl_net: pnl - entry_commission - commission,
                        });
                        self.lots.remove(&order.symbol);
                    }
                }
                self.complete(order, bar, price, commission, events);
            }
        }
    }

    fn complete(
        &mut self,
        mut order: Order,
        bar: &Bar,
        price: f64,
        commission: f64,
        events: &mut BrokerEvents,
    ) {
        order.status = OrderStatus::Completed;
        events.fills.push(Trade {
            timestamp: bar.timestamp,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            fee: commission,
            strategy_id: String::new(),
            order_id: order.id,
        });
        let mut update = OrderUpdate::from_order(&order, bar.timestamp);
        update.executed_price = Some(price);
        update.commission = commission;
        events.updates.push(update);
    }

    /// Cancels every order still waiting for a bar.
    pub fn cancel_all(&mut self, timestamp: i64) -> Vec<OrderUpdate> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|mut order| {
                order.status = OrderStatus::Canceled;
                OrderUpdate::from_order(&order, timestamp).with_reason("run_finished")
            })
            .collect()
    }
}
