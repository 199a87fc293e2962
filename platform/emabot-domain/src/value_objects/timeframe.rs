use chrono::{NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeframeError {
    #[error("empty timeframe")]
    Empty,
    #[error("invalid timeframe: {0}")]
    Invalid(String),
    #[error("unsupported timeframe unit: {0}")]
    UnsupportedUnit(String),
}

/// How bars of a timeframe are laid out on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Several bars per session, `minutes` apart.
    Intraday { minutes: u32 },
    /// One bar per business day. Weekly and monthly timeframes fall here too.
    Daily,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    pub label: String,
    pub step_seconds: i64,
    pub granularity: Granularity,
}

impl Timeframe {
    /// Parses `1m`, `5m`, `1h`, `1d`, `1w`, `1mo` style labels. The trailing unit decides
    /// the granularity: `d`, `w` and `mo` are daily-or-coarser, `m` and `h` are intraday,
    /// and a bare number is read as minutes.
    pub fn parse(value: &str) -> Result<Self, TimeframeError> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(TimeframeError::Empty);
        }

        if let Ok(minutes) = normalized.parse::<u32>() {
            return Self::intraday(&normalized, minutes);
        }

        let (number_part, unit) = if let Some(stripped) = normalized.strip_suffix("mo") {
            (stripped, "mo")
        } else {
            let unit_start = normalized
                .char_indices()
                .last()
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            normalized.split_at(unit_start)
        };
        let count: u32 = number_part
            .parse()
            .map_err(|_| TimeframeError::Invalid(value.to_string()))?;
        if count == 0 {
            return Err(TimeframeError::Invalid(value.to_string()));
        }

        match unit {
            "m" => Self::intraday(&normalized, count),
            "h" => Self::intraday(&normalized, count * 60),
            "d" => Ok(Self::daily(&normalized, i64::from(count) * 86_400)),
            "w" => Ok(Self::daily(&normalized, i64::from(count) * 604_800)),
            "mo" => Ok(Self::daily(&normalized, i64::from(count) * 2_592_000)),
            other => Err(TimeframeError::UnsupportedUnit(other.to_string())),
        }
    }

    fn intraday(label: &str, minutes: u32) -> Result<Self, TimeframeError> {
        if minutes == 0 || minutes >= 24 * 60 {
            return Err(TimeframeError::Invalid(label.to_string()));
        }
        Ok(Self {
            label: label.to_string(),
            step_seconds: i64::from(minutes) * 60,
            granularity: Granularity::Intraday { minutes },
        })
    }

    fn daily(label: &str, step_seconds: i64) -> Self {
        Self {
            label: label.to_string(),
            step_seconds,
            granularity: Granularity::Daily,
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self.granularity, Granularity::Intraday { .. })
    }

    /// Floors a wall-clock instant to the start of the bar containing it.
    pub fn floor(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.granularity {
            Granularity::Intraday { minutes } => {
                let total = now.hour() * 60 + now.minute();
                let bucket = (total / minutes) * minutes;
                let time = NaiveTime::from_hms_opt(bucket / 60, bucket % 60, 0)
                    .unwrap_or(NaiveTime::MIN);
                now.date().and_time(time)
            }
            Granularity::Daily => now.date().and_time(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn parses_intraday_and_daily_labels() {
        assert_eq!(
            Timeframe::parse("5m").unwrap().granularity,
            Granularity::Intraday { minutes: 5 }
        );
        assert_eq!(
            Timeframe::parse("1h").unwrap().granularity,
            Granularity::Intraday { minutes: 60 }
        );
        assert_eq!(Timeframe::parse("1d").unwrap().granularity, Granularity::Daily);
        assert_eq!(Timeframe::parse("1w").unwrap().step_seconds, 604_800);
        assert_eq!(Timeframe::parse("1mo").unwrap().granularity, Granularity::Daily);
        assert_eq!(
            Timeframe::parse("15").unwrap().granularity,
            Granularity::Intraday { minutes: 15 }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Timeframe::parse(" "), Err(TimeframeError::Empty));
        assert!(Timeframe::parse("xm").is_err());
        assert!(Timeframe::parse("0m").is_err());
        assert!(matches!(
            Timeframe::parse("3y"),
            Err(TimeframeError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn floors_to_bar_boundary() {
        let tf = Timeframe::parse("15m").unwrap();
        assert_eq!(tf.floor(at(10, 44, 59)), at(10, 30, 0));
        let daily = Timeframe::parse("1d").unwrap();
        assert_eq!(daily.floor(at(10, 44, 59)), at(0, 0, 0));
    }
}
