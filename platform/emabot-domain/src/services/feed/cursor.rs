use super::clock::{Clock, SystemClock};
use super::historical::{resolve_range, HistoricalLoader, DEFAULT_LOOKBACK_DAYS};
use super::live::LivePoller;
use super::session::SessionWindow;
use super::{Advance, DataFeed, FeedError, FeedPhase};
use crate::repositories::bar_source::BarSource;
use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::Timeframe;
use chrono::NaiveDateTime;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct StreamingParams {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub lookback_days: i64,
    /// Keep polling for live bars once the historical table is exhausted.
    pub live: bool,
    /// Live gate. `None` polls at any time of day on business days.
    pub session: Option<SessionWindow>,
}

impl StreamingParams {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            from: None,
            to: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            live: false,
            session: None,
        }
    }
}

pub struct StreamingFeedBuilder {
    params: StreamingParams,
    source: Option<Box<dyn BarSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl StreamingFeedBuilder {
    pub fn source(mut self, source: Box<dyn BarSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<StreamingFeed, FeedError> {
        let symbol = self.params.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(FeedError::MissingSymbol);
        }
        let source = self.source.ok_or(FeedError::MissingSource)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let poller = LivePoller::new(self.params.timeframe.clone(), self.params.session);

        Ok(StreamingFeed {
            symbol,
            params: self.params,
            source,
            clock,
            poller,
            table: Vec::new(),
            buffer: VecDeque::new(),
            cursor: Cursor::Pending,
            current: None,
            last_emitted: None,
            went_live: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Pending,
    Historical { next: usize },
    Transitioning,
    Live,
    Ended,
}

/// Replays a historical table, then polls for live bars.
///
/// Once the feed has switched to live it never goes back, and every emitted bar is
/// strictly newer than the one before it.
pub struct StreamingFeed {
    symbol: String,
    params: StreamingParams,
    source: Box<dyn BarSource>,
    clock: Arc<dyn Clock>,
    poller: LivePoller,
    table: Vec<Bar>,
    buffer: VecDeque<Bar>,
    cursor: Cursor,
    current: Option<Bar>,
    last_emitted: Option<i64>,
    went_live: bool,
}

impl StreamingFeed {
    pub fn builder(params: StreamingParams) -> StreamingFeedBuilder {
        StreamingFeedBuilder {
            params,
            source: None,
            clock: None,
        }
    }

    pub fn historical_len(&self) -> usize {
        self.table.len()
    }

    fn emit(&mut self, bar: Bar) -> Advance {
        self.last_emitted = Some(bar.timestamp);
        self.current = Some(bar);
        metrics::counter!("emabot.feed.bars_emitted").increment(1);
        Advance::NewBar
    }

    fn poll_live(&mut self) -> Advance {
        if let Some(bar) = self
            .poller
            .poll(self.source.as_mut(), &self.symbol, self.clock.as_ref())
        {
            self.buffer.push_back(bar);
        }

        while let Some(bar) = self.buffer.pop_front() {
            if self.last_emitted.is_some_and(|last| bar.timestamp <= last) {
                debug!(symbol = %self.symbol, timestamp = bar.timestamp, "discarding stale live bar");
                continue;
            }
            return self.emit(bar);
        }
        Advance::NoData
    }
}

impl DataFeed for StreamingFeed {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn start(&mut self) -> Result<(), FeedError> {
        if self.cursor != Cursor::Pending {
            return Ok(());
        }

        let (from, to) = resolve_range(
            self.params.from,
            self.params.to,
            self.clock.now(),
            self.params.lookback_days,
        );
        let loader = HistoricalLoader::new(from, to);
        self.table = loader.load(self.source.as_mut(), &self.symbol, &self.params.timeframe)?;
        if let Some(last) = self.table.last() {
            self.poller.seed(last);
        }

        if self.table.is_empty() && self.params.live {
            self.cursor = Cursor::Live;
            self.went_live = true;
        } else {
            self.cursor = Cursor::Historical { next: 0 };
        }

        info!(
            symbol = %self.symbol,
            timeframe = %self.params.timeframe.label,
            bars = self.table.len(),
            live = self.params.live,
            %from,
            %to,
            "feed started"
        );
        Ok(())
    }

    fn poll(&mut self) -> Advance {
        loop {
            match self.cursor {
                Cursor::Pending => return Advance::NoData,
                Cursor::Ended => return Advance::Ended,
                Cursor::Historical { next } => {
                    if let Some(bar) = self.table.get(next).cloned() {
                        self.cursor = Cursor::Historical { next: next + 1 };
                        return self.emit(bar);
                    }
                    self.cursor = if self.params.live {
                        Cursor::Transitioning
                    } else {
                        Cursor::Ended
                    };
                }
                Cursor::Transitioning => {
                    info!(
                        symbol = %self.symbol,
                        replayed = self.table.len(),
                        "historical data exhausted, switching to live"
                    );
                    self.cursor = Cursor::Live;
                    self.went_live = true;
                }
                Cursor::Live => return self.poll_live(),
            }
        }
    }

    fn current_bar(&self) -> Option<&Bar> {
        self.current.as_ref()
    }

    fn stop(&mut self) {
        if self.cursor != Cursor::Ended {
            debug!(symbol = %self.symbol, "feed stopped");
        }
        self.cursor = Cursor::Ended;
        self.buffer.clear();
    }

    fn phase(&self) -> FeedPhase {
        if self.went_live {
            FeedPhase::Live
        } else {
            FeedPhase::Historical
        }
    }
}
