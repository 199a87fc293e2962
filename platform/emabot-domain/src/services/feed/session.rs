use super::FeedError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Trading hours on business days. Both ends are inclusive for the live gate; the bar
/// calendar only opens bars strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self::regular()
    }
}

impl SessionWindow {
    /// 09:30 to 16:00.
    pub fn regular() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, FeedError> {
        if start >= end {
            return Err(FeedError::InvalidSession(format!(
                "start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `HH:MM` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, FeedError> {
        let parse = |value: &str| {
            NaiveTime::parse_from_str(value.trim(), "%H:%M")
                .map_err(|err| FeedError::InvalidSession(format!("{value}: {err}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains_time(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn allows(&self, now: NaiveDateTime) -> bool {
        is_trading_day(now.date()) && self.contains_time(now.time())
    }

    /// Open times of the intraday bars on `date`: `start`, `start + step`, ... strictly before `end`.
    pub fn bar_times(&self, date: NaiveDate, step_minutes: u32) -> Vec<NaiveDateTime> {
        let step = Duration::minutes(i64::from(step_minutes.max(1)));
        let end = date.and_time(self.end);
        let mut times = Vec::new();
        let mut current = date.and_time(self.start);
        while current < end {
            times.push(current);
            current += step;
        }
        times
    }
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
