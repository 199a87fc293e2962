use super::session::{is_trading_day, SessionWindow};
use super::FeedError;
use crate::repositories::bar_source::BarSource;
use crate::value_objects::bar::{naive_to_timestamp, Bar};
use crate::value_objects::timeframe::{Granularity, Timeframe};
use chrono::{Days, Duration, NaiveDateTime, NaiveTime};
use tracing::warn;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Resolves an optional range: `to` defaults to `now`, `from` to `lookback_days` before `to`.
pub fn resolve_range(
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
    now: NaiveDateTime,
    lookback_days: i64,
) -> (NaiveDateTime, NaiveDateTime) {
    let to = to.unwrap_or(now);
    let from = from.unwrap_or(to - Duration::days(lookback_days));
    (from, to)
}

/// Open times of every bar inside `[from, to]`: one midnight per business day for
/// daily-or-coarser timeframes, the session's intraday grid otherwise.
pub fn trading_timestamps(
    timeframe: &Timeframe,
    session: &SessionWindow,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    if from > to {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut day = Some(from.date());
    while let Some(date) = day {
        if date > to.date() {
            break;
        }
        if is_trading_day(date) {
            match timeframe.granularity {
                Granularity::Daily => out.push(date.and_time(NaiveTime::MIN)),
                Granularity::Intraday { minutes } => out.extend(
                    session
                        .bar_times(date, minutes)
                        .into_iter()
                        .filter(|ts| *ts >= from && *ts <= to),
                ),
            }
        }
        day = date.checked_add_days(Days::new(1));
    }
    out
}

/// Materializes the historical table for one feed.
#[derive(Debug, Clone)]
pub struct HistoricalLoader {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl HistoricalLoader {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// Loads and sanitizes bars from `source`. The result is strictly increasing in time
    /// and every bar is OHLC-consistent; offending rows are dropped with a warning.
    pub fn load(
        &self,
        source: &mut dyn BarSource,
        symbol: &str,
        timeframe: &Timeframe,
    ) -> Result<Vec<Bar>, FeedError> {
        if self.from > self.to {
            return Ok(Vec::new());
        }

        let raw = source
            .fetch_historical(symbol, timeframe, self.from, self.to)
            .map_err(|reason| FeedError::Historical {
                symbol: symbol.to_string(),
                reason,
            })?;

        let lower = naive_to_timestamp(self.from.date().and_time(NaiveTime::MIN));
        let upper = naive_to_timestamp(self.to);
        let mut table: Vec<Bar> = Vec::with_capacity(raw.len());
        let mut dropped = 0usize;
        for bar in raw {
            let in_range = bar.timestamp >= lower && bar.timestamp <= upper;
            let increasing = table
                .last()
                .map_or(true, |prev| bar.timestamp > prev.timestamp);
            if in_range && increasing && bar.is_consistent() {
                table.push(bar);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(symbol, dropped, "dropped historical bars out of range, order or OHLC bounds");
        }
        Ok(table)
    }
}
