use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the exchange-local wall clock used by the live gates.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            seconds: AtomicI64::new(now.and_utc().timestamp()),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.seconds.store(now.and_utc().timestamp(), Ordering::SeqCst);
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        DateTime::<Utc>::from_timestamp(self.seconds.load(Ordering::SeqCst), 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn manual_clock_moves_only_on_request() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance_seconds(60);
        assert_eq!(clock.now(), start + chrono::Duration::minutes(1));
    }
}
