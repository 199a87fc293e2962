use super::broker::{BrokerEvents, SimBroker};
use crate::entities::metrics::{MetricsConfig, MetricsState, MetricsSummary};
use crate::repositories::brokerage::{BrokerageApi, OrderTicket};
use crate::services::audit::AuditEvent;
use crate::services::feed::{Advance, DataFeed, FeedError};
use crate::services::strategy::Strategy;
use crate::value_objects::action::Action;
use crate::value_objects::action_type::ActionType;
use crate::value_objects::bar::Bar;
use crate::value_objects::equity_point::EquityPoint;
use crate::value_objects::order::{OrderStatus, OrderUpdate};
use crate::value_objects::side::Side;
use crate::value_objects::trade::{ClosedTrade, Trade};
use serde_json::json;
use tracing::{debug, info, warn};

pub trait RunControl {
    fn should_cancel(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopControl;

impl RunControl for NoopControl {
    fn should_cancel(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub run_id: String,
    pub starting_cash: f64,
    pub commission: f64,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// At least one feed produced a bar; the count is how many did.
    NewBars(usize),
    /// No feed had data this tick, but some may later.
    Idle,
    /// Every feed has ended.
    Finished,
}

pub struct EngineResults {
    pub summary: MetricsSummary,
    pub fills: Vec<Trade>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity: Vec<EquityPoint>,
    pub audit_events: Vec<AuditEvent>,
}

struct Lane<S> {
    feed: Box<dyn DataFeed>,
    strategy: S,
    ended: bool,
}

/// Drives one strategy instance per feed against a shared simulated broker.
///
/// Each bar is handled in the same order: due orders fill at the bar's open, order and
/// trade notifications reach the strategy, the strategy sees the bar, and equity is
/// marked at the close. When a brokerage router is attached, orders raised on live bars
/// are sent to it before they enter the simulated book. Orders raised while a feed is
/// still replaying history only reach the simulated book.
pub struct TradingEngine<'a, S: Strategy> {
    config: EngineConfig,
    lanes: Vec<Lane<S>>,
    broker: SimBroker,
    router: Option<&'a mut dyn BrokerageApi>,
    metrics: MetricsState,
    audit_events: Vec<AuditEvent>,
    last_timestamp: i64,
}

impl<'a, S: Strategy> TradingEngine<'a, S> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            broker: SimBroker::new(config.starting_cash, config.commission),
            metrics: MetricsState::new(config.starting_cash, config.metrics),
            config,
            lanes: Vec::new(),
            router: None,
            audit_events: Vec::new(),
            last_timestamp: 0,
        }
    }

    pub fn add_feed(&mut self, feed: Box<dyn DataFeed>, strategy: S) {
        self.lanes.push(Lane {
            feed,
            strategy,
            ended: false,
        });
    }

    pub fn with_router(mut self, router: &'a mut dyn BrokerageApi) -> Self {
        self.router = Some(router);
        self
    }

    pub fn broker(&self) -> &SimBroker {
        &self.broker
    }

    pub fn value(&self) -> f64 {
        self.broker.value()
    }

    pub fn any_live(&self) -> bool {
        self.lanes.iter().any(|lane| lane.feed.is_live())
    }

    pub fn bars_processed(&self) -> usize {
        self.metrics.equity_curve().len()
    }

    pub fn start(&mut self) -> Result<(), FeedError> {
        for lane in &mut self.lanes {
            lane.feed.start()?;
        }
        self.audit_events.push(
            AuditEvent::new(&self.config.run_id, 0, "engine", "start").details(json!({
                "feeds": self.lanes.iter().map(|lane| lane.feed.symbol().to_string()).collect::<Vec<_>>(),
                "strategy": self.lanes.first().map(|lane| lane.strategy.name().to_string()),
                "starting_cash": self.config.starting_cash,
                "commission": self.config.commission,
            })),
        );
        Ok(())
    }

    /// Pulls each feed once.
    pub fn step(&mut self) -> StepOutcome {
        let mut produced = 0usize;
        for idx in 0..self.lanes.len() {
            if self.lanes[idx].ended {
                continue;
            }
            match self.lanes[idx].feed.poll() {
                Advance::NewBar => {
                    if let Some(bar) = self.lanes[idx].feed.current_bar().cloned() {
                        self.on_bar(idx, &bar);
                        produced += 1;
                    }
                }
                Advance::NoData => {}
                Advance::Ended => {
                    debug!(symbol = %self.lanes[idx].feed.symbol(), "feed ended");
                    self.lanes[idx].ended = true;
                }
            }
        }

        if produced > 0 {
            StepOutcome::NewBars(produced)
        } else if self.lanes.iter().all(|lane| lane.ended) {
            StepOutcome::Finished
        } else {
            StepOutcome::Idle
        }
    }

    /// Steps until every feed has ended or `control` asks to stop. Returns the number
    /// of steps that produced bars.
    pub fn run_to_end(&mut self, control: &dyn RunControl) -> usize {
        let mut steps = 0usize;
        loop {
            if control.should_cancel() {
                info!(run_id = %self.config.run_id, "run canceled");
                break;
            }
            match self.step() {
                StepOutcome::NewBars(_) => steps += 1,
                StepOutcome::Idle => {}
                StepOutcome::Finished => break,
            }
        }
        steps
    }

    fn on_bar(&mut self, idx: usize, bar: &Bar) {
        self.last_timestamp = bar.timestamp;
        let events = self.broker.process_bar(bar);
        self.dispatch(events);

        let position_qty = self.broker.position_qty(&bar.symbol);
        let action = self.lanes[idx].strategy.on_bar(bar, position_qty);
        self.schedule(idx, bar, action);

        self.metrics
            .record_equity(self.broker.equity_point(bar.timestamp));
    }

    fn dispatch(&mut self, events: BrokerEvents) {
        for update in &events.updates {
            self.record_order_update(update);
            self.notify_order(update);
        }
        for mut fill in events.fills {
            if let Some(lane) = self.lane_for(&fill.symbol) {
                fill.strategy_id = self.lanes[lane].strategy.name().to_string();
            }
            self.audit_events.push(
                AuditEvent::new(&self.config.run_id, fill.timestamp, "trade", fill.side.to_string())
                    .symbol(&fill.symbol)
                    .details(json!({
                        "qty": fill.quantity,
                        "price": fill.price,
                        "fee": fill.fee,
                        "order_id": fill.order_id,
                        "strategy_id": fill.strategy_id,
                    })),
            );
            self.metrics.record_fill(fill);
        }
        for trade in events.closed {
            if let Some(lane) = self.lane_for(&trade.symbol) {
                self.lanes[lane].strategy.notify_trade(&trade);
            }
            self.metrics.record_closed_trade(trade);
        }
    }

    fn schedule(&mut self, idx: usize, bar: &Bar, action: Action) {
        let side = match action.action_type {
            ActionType::Hold => return,
            ActionType::Buy => Side::Buy,
            ActionType::Sell => Side::Sell,
        };

        let mut broker_ref = None;
        let routable = self.lanes[idx].feed.is_live();
        if let Some(router) = self.router.as_deref_mut().filter(|_| routable) {
            let ticket = OrderTicket {
                symbol: bar.symbol.clone(),
                side,
                quantity: action.size,
                order_type: "market".to_string(),
                price: None,
            };
            match router.place_order(&ticket) {
                Ok(reference) => broker_ref = Some(reference),
                Err(err) => {
                    warn!(symbol = %bar.symbol, error = %err, "brokerage refused order");
                    let update = self
                        .broker
                        .reject(&bar.symbol, side, action.size, bar.timestamp, &err.to_string());
                    self.record_order_update(&update);
                    self.lanes[idx].strategy.notify_order(&update);
                    return;
                }
            }
        }

        let updates = self
            .broker
            .submit(&bar.symbol, side, action.size, bar.timestamp, broker_ref);
        for update in &updates {
            self.record_order_update(update);
            self.lanes[idx].strategy.notify_order(update);
        }
    }

    fn record_order_update(&mut self, update: &OrderUpdate) {
        let counter = match update.status {
            OrderStatus::Submitted => "emabot.orders.submitted",
            OrderStatus::Accepted => return,
            OrderStatus::Completed => "emabot.orders.completed",
            OrderStatus::Canceled => "emabot.orders.canceled",
            OrderStatus::Margin => "emabot.orders.margin",
            OrderStatus::Rejected => "emabot.orders.rejected",
        };
        metrics::counter!(counter).increment(1);

        let mut event = AuditEvent::new(
            &self.config.run_id,
            update.timestamp,
            "order",
            update.status.to_string(),
        )
        .symbol(&update.symbol)
        .details(json!({
            "order_id": update.order_id,
            "side": update.side,
            "qty": update.quantity,
            "price": update.executed_price,
            "commission": update.commission,
        }));
        if let Some(reason) = &update.reason {
            event = event.error(reason.clone());
        }
        self.audit_events.push(event);
    }

    fn notify_order(&mut self, update: &OrderUpdate) {
        if let Some(lane) = self.lane_for(&update.symbol) {
            self.lanes[lane].strategy.notify_order(update);
        }
    }

    fn lane_for(&self, symbol: &str) -> Option<usize> {
        self.lanes
            .iter()
            .position(|lane| lane.feed.symbol() == symbol)
    }

    /// Stops every feed, cancels orders still waiting for a bar and returns the run's
    /// metrics and audit trail.
    pub fn finish(mut self) -> EngineResults {
        for lane in &mut self.lanes {
            lane.feed.stop();
        }
        let canceled = self.broker.cancel_all(self.last_timestamp);
        for update in &canceled {
            self.record_order_update(update);
            self.notify_order(update);
        }

        let (equity, fills, closed_trades, summary) = self.metrics.into_parts();
        let mut audit_events = self.audit_events;
        audit_events.push(
            AuditEvent::new(&self.config.run_id, self.last_timestamp, "engine", "complete").details(
                json!({
                    "bars_processed": summary.bars_processed,
                    "fills": summary.fills,
                    "closed_trades": summary.closed_trades,
                    "final_value": summary.final_value,
                    "sharpe": summary.sharpe,
                    "max_drawdown": summary.max_drawdown,
                }),
            ),
        );

        EngineResults {
            summary,
            fills,
            closed_trades,
            equity,
            audit_events,
        }
    }
}
