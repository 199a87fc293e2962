use crate::value_objects::equity_point::EquityPoint;
use crate::value_objects::trade::{ClosedTrade, Trade};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub bars_processed: usize,
    pub fills: usize,
    pub closed_trades: usize,
    pub win_rate: f64,
    pub starting_value: f64,
    pub final_value: f64,
    pub net_profit: f64,
    pub sharpe: f64,
    /// Largest peak-to-trough equity decline, as a fraction of the peak.
    pub max_drawdown: f64,
    /// Natural log of final over starting value.
    pub total_return: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub annualization_factor: Option<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricsState {
    starting_value: f64,
    equity_curve: Vec<EquityPoint>,
    fills: Vec<Trade>,
    closed: Vec<ClosedTrade>,
    peak_equity: f64,
    max_drawdown: f64,
    config: MetricsConfig,
}

impl MetricsState {
    pub fn new(starting_value: f64, config: MetricsConfig) -> Self {
        Self {
            starting_value,
            equity_curve: Vec::new(),
            fills: Vec::new(),
            closed: Vec::new(),
            peak_equity: starting_value.max(0.0),
            max_drawdown: 0.0,
            config,
        }
    }

    pub fn record_equity(&mut self, point: EquityPoint) {
        if self.peak_equity == 0.0 || point.equity > self.peak_equity {
            self.peak_equity = point.equity;
        } else if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - point.equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
        self.equity_curve.push(point);
    }

    pub fn record_fill(&mut self, trade: Trade) {
        self.fills.push(trade);
    }

    pub fn record_closed_trade(&mut self, trade: ClosedTrade) {
        self.closed.push(trade);
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn fills(&self) -> &[Trade] {
        &self.fills
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    pub fn final_value(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|point| point.equity)
            .unwrap_or(self.starting_value)
    }

    pub fn summary(&self) -> MetricsSummary {
        let final_value = self.final_value();
        MetricsSummary {
            bars_processed: self.equity_curve.len(),
            fills: self.fills.len(),
            closed_trades: self.closed.len(),
            win_rate: self.win_rate(),
            starting_value: self.starting_value,
            final_value,
            net_profit: final_value - self.starting_value,
            sharpe: self.sharpe_ratio(),
            max_drawdown: self.max_drawdown,
            total_return: log_return(self.starting_value, final_value),
        }
    }

    pub fn into_parts(self) -> (Vec<EquityPoint>, Vec<Trade>, Vec<ClosedTrade>, MetricsSummary) {
        let summary = self.summary();
        (self.equity_curve, self.fills, self.closed, summary)
    }

    fn sharpe_ratio(&self) -> f64 {
        if self.equity_curve.len() < 2 {
            return 0.0;
        }

        let returns: Vec<f64> = self
            .equity_curve
            .windows(2)
            .filter(|pair| pair[0].equity > 0.0)
            .map(|pair| pair[1].equity / pair[0].equity - 1.0 - self.config.risk_free_rate)
            .collect();

        if returns.len() < 2 {
            return 0.0;
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let var = returns
            .iter()
            .map(|ret| {
                let diff = ret - mean;
                diff * diff
            })
            .sum::<f64>()
            / (returns.len() as f64 - 1.0);

        let std = var.sqrt();
        if std == 0.0 {
            0.0
        } else {
            let scale = self
                .config
                .annualization_factor
                .unwrap_or(returns.len() as f64);
            mean / std * scale.sqrt()
        }
    }

    fn win_rate(&self) -> f64 {
        if self.closed.is_empty() {
            return 0.0;
        }
        let wins = self.closed.iter().filter(|trade| trade.pnl_net > 0.0).count();
        wins as f64 / self.closed.len() as f64
    }
}

fn log_return(start: f64, end: f64) -> f64 {
    if start > 0.0 && end > 0.0 {
        (end / start).ln()
    } else {
        0.0
    }
}
