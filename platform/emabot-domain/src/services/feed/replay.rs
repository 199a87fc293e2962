use super::{Advance, DataFeed, FeedError, FeedPhase};
use crate::value_objects::bar::Bar;
use tracing::{info, warn};

/// Replays a preloaded, time-ordered table and then ends. Used for backtests over a
/// price file.
#[derive(Debug, Clone)]
pub struct HistoricalFeed {
    symbol: String,
    bars: Vec<Bar>,
    next: usize,
    started: bool,
    stopped: bool,
    current: Option<Bar>,
}

impl HistoricalFeed {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
            next: 0,
            started: false,
            stopped: false,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl DataFeed for HistoricalFeed {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn start(&mut self) -> Result<(), FeedError> {
        if self.symbol.trim().is_empty() {
            return Err(FeedError::MissingSymbol);
        }
        if !self.started {
            let before = self.bars.len();
            let mut last: Option<i64> = None;
            self.bars.retain(|bar| {
                let keep = last.map_or(true, |ts| bar.timestamp > ts);
                if keep {
                    last = Some(bar.timestamp);
                }
                keep
            });
            if self.bars.len() < before {
                warn!(
                    symbol = %self.symbol,
                    dropped = before - self.bars.len(),
                    "dropped bars that were not strictly increasing"
                );
            }
            info!(symbol = %self.symbol, bars = self.bars.len(), "historical feed started");
            self.started = true;
        }
        Ok(())
    }

    fn poll(&mut self) -> Advance {
        if !self.started {
            return Advance::NoData;
        }
        if self.stopped {
            return Advance::Ended;
        }
        match self.bars.get(self.next) {
            Some(bar) => {
                self.current = Some(bar.clone());
                self.next += 1;
                metrics::counter!("emabot.feed.bars_emitted").increment(1);
                Advance::NewBar
            }
            None => Advance::Ended,
        }
    }

    fn current_bar(&self) -> Option<&Bar> {
        self.current.as_ref()
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn phase(&self) -> FeedPhase {
        FeedPhase::Historical
    }
}
