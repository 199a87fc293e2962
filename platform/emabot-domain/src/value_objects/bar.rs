use chrono::{DateTime, NaiveDateTime, Utc};

/// One OHLCV sample. `timestamp` is the bar open time in epoch seconds; the feed's
/// wall clock is naive exchange-local time, stored as if it were UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// `None` when the source carries no open-interest column.
    pub open_interest: Option<f64>,
}

impl Bar {
    pub fn datetime(&self) -> NaiveDateTime {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }

    /// `YYYY-MM-DD` of the bar, used as the prefix of strategy log lines.
    pub fn date_label(&self) -> String {
        self.datetime().date().format("%Y-%m-%d").to_string()
    }

    pub fn is_consistent(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

pub fn naive_to_timestamp(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp()
}
