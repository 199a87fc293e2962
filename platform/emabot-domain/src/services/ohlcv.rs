use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::{Granularity, Timeframe};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub gaps: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_gap: Option<i64>,
    pub first_duplicate: Option<i64>,
    pub first_out_of_order: Option<i64>,
    pub max_gap_seconds: Option<i64>,
}

/// Scans bars in arrival order. For daily timeframes a gap is a missing business day,
/// so weekends never count; intraday gaps are any spacing wider than the step.
pub fn data_quality_from_bars(bars: &[Bar], timeframe: &Timeframe) -> DataQualityReport {
    let mut report = DataQualityReport {
        rows: bars.len(),
        ..DataQualityReport::default()
    };
    let Some(first) = bars.first() else {
        return report;
    };
    report.first_timestamp = Some(first.timestamp);

    let step = timeframe.step_seconds.max(1);
    let mut last: Option<&Bar> = None;
    let mut max_gap: Option<i64> = None;

    for bar in bars {
        let ts = bar.timestamp;
        if let Some(prev) = last {
            if ts == prev.timestamp {
                report.duplicates += 1;
                report.first_duplicate.get_or_insert(ts);
            } else if ts < prev.timestamp {
                report.out_of_order += 1;
                report.first_out_of_order.get_or_insert(ts);
            } else {
                let diff = ts - prev.timestamp;
                let is_gap = match timeframe.granularity {
                    Granularity::Daily => {
                        weekdays_between(prev.datetime().date(), bar.datetime().date()) > 0
                    }
                    Granularity::Intraday { .. } => {
                        prev.datetime().date() == bar.datetime().date() && diff > step
                    }
                };
                if is_gap {
                    report.gaps += 1;
                    report.first_gap.get_or_insert(ts);
                    max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
                }
            }
        }
        last = Some(bar);
        report.last_timestamp = Some(ts);
    }

    report.max_gap_seconds = max_gap;
    report
}

/// Weekdays strictly between two dates.
fn weekdays_between(from: NaiveDate, to: NaiveDate) -> usize {
    let mut count = 0;
    let mut day = from.checked_add_days(Days::new(1));
    while let Some(current) = day {
        if current >= to {
            break;
        }
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day = current.checked_add_days(Days::new(1));
    }
    count
}
