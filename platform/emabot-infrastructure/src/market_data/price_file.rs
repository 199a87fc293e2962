use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use emabot_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use emabot_domain::services::ohlcv::{data_quality_from_bars, DataQualityReport};
use emabot_domain::value_objects::bar::{naive_to_timestamp, Bar};
use emabot_domain::value_objects::timeframe::Timeframe;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Reads a headered price file whose first six columns are, in order: date, open, high,
/// low, close, volume. Header names are ignored. There is no open-interest column.
pub fn load_csv(
    path: &Path,
    symbol: &str,
    timeframe: &Timeframe,
) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open price file {}: {}", path.display(), err))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut bars_by_ts: BTreeMap<i64, Bar> = BTreeMap::new();
    let mut rows = 0usize;
    let mut duplicates = 0usize;
    let mut out_of_order = 0usize;
    let mut first_duplicate = None;
    let mut first_out_of_order = None;
    let mut invalid_close = 0usize;
    let mut last_seen_ts: Option<i64> = None;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|err| format!("failed to read CSV row {line}: {err}"))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 6 {
            return Err(format!(
                "row {line}: expected 6 columns (date,open,high,low,close,volume), got {}",
                record.len()
            ));
        }
        rows += 1;

        let timestamp = parse_date(&record[0]).map_err(|err| format!("row {line}: {err}"))?;
        let field = |col: usize, name: &str| -> Result<f64, String> {
            record[col]
                .parse::<f64>()
                .map_err(|err| format!("row {line}: invalid {name} '{}': {err}", &record[col]))
        };
        let close = field(4, "close")?;
        if !close.is_finite() || close <= 0.0 {
            invalid_close += 1;
            continue;
        }
        let bar = Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: field(1, "open")?,
            high: field(2, "high")?,
            low: field(3, "low")?,
            close,
            volume: field(5, "volume")?,
            open_interest: None,
        };

        if last_seen_ts.is_some_and(|prev| timestamp < prev) {
            out_of_order += 1;
            first_out_of_order.get_or_insert(timestamp);
        }
        last_seen_ts = Some(timestamp);

        if bars_by_ts.insert(timestamp, bar).is_some() {
            duplicates += 1;
            first_duplicate.get_or_insert(timestamp);
        }
    }

    let bars: Vec<Bar> = bars_by_ts.into_values().collect();
    let mut report = data_quality_from_bars(&bars, timeframe);
    report.rows = rows;
    report.duplicates = duplicates;
    report.first_duplicate = first_duplicate;
    report.out_of_order = out_of_order;
    report.first_out_of_order = first_out_of_order;
    report.invalid_close = invalid_close;

    if invalid_close > 0 || duplicates > 0 || out_of_order > 0 {
        warn!(
            path = %path.display(),
            invalid_close,
            duplicates,
            out_of_order,
            "price file needed cleanup"
        );
    }
    metrics::counter!("emabot.data.rows_read").increment(rows as u64);
    metrics::counter!("emabot.data.rows_skipped").increment((invalid_close + duplicates) as u64);
    info!(path = %path.display(), symbol, bars = bars.len(), gaps = report.gaps, "loaded price file");
    Ok((bars, report))
}

fn parse_date(value: &str) -> Result<i64, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(naive_to_timestamp(date.and_time(NaiveTime::MIN)));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive_to_timestamp(dt));
        }
    }
    Err(format!("unsupported date format: {value}"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvMarketDataRepository;

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        load_csv(&query.path, &query.symbol, &query.timeframe)
    }
}
