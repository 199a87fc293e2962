use super::session::{is_trading_day, SessionWindow};
use super::clock::Clock;
use crate::repositories::bar_source::BarSource;
use crate::value_objects::bar::{naive_to_timestamp, Bar};
use crate::value_objects::timeframe::Timeframe;
use tracing::{debug, warn};

/// Produces at most one bar per call, gated by session hours, weekday and the last
/// timestamp it has seen.
#[derive(Debug, Clone)]
pub struct LivePoller {
    timeframe: Timeframe,
    session: Option<SessionWindow>,
    last_known: Option<i64>,
    last_close: Option<f64>,
}

impl LivePoller {
    pub fn new(timeframe: Timeframe, session: Option<SessionWindow>) -> Self {
        Self {
            timeframe,
            session,
            last_known: None,
            last_close: None,
        }
    }

    /// Continues from the final historical bar.
    pub fn seed(&mut self, last: &Bar) {
        self.last_known = Some(last.timestamp);
        self.last_close = Some(last.close);
    }

    pub fn last_known(&self) -> Option<i64> {
        self.last_known
    }

    pub fn poll(
        &mut self,
        source: &mut dyn BarSource,
        symbol: &str,
        clock: &dyn Clock,
    ) -> Option<Bar> {
        metrics::counter!("emabot.feed.live_polls").increment(1);
        let now = clock.now();

        if let Some(session) = &self.session {
            if !session.contains_time(now.time()) {
                return None;
            }
        }
        if !is_trading_day(now.date()) {
            return None;
        }

        let bar_time = self.timeframe.floor(now);
        let candidate = naive_to_timestamp(bar_time);
        if self.last_known.is_some_and(|last| candidate <= last) {
            return None;
        }

        let bar = source.fetch_live(symbol, &self.timeframe, bar_time, self.last_close)?;
        if bar.timestamp != candidate || !bar.is_consistent() {
            warn!(
                symbol,
                expected = candidate,
                got = bar.timestamp,
                "live source returned an unusable bar"
            );
            return None;
        }

        debug!(symbol, timestamp = bar.timestamp, close = bar.close, "live bar");
        self.last_known = Some(bar.timestamp);
        self.last_close = Some(bar.close);
        Some(bar)
    }
}
