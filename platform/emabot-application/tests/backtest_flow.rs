use emabot_application::backtesting::run_backtest;
use emabot_application::config::Config;
use emabot_application::report::RunMode;
use emabot_domain::entities::metrics::MetricsSummary;
use emabot_domain::repositories::artifacts::ArtifactWriter;
use emabot_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use emabot_domain::services::audit::AuditEvent;
use emabot_domain::services::engine::{NoopControl, RunControl};
use emabot_domain::services::ohlcv::DataQualityReport;
use emabot_domain::value_objects::bar::Bar;
use emabot_domain::value_objects::equity_point::EquityPoint;
use emabot_domain::value_objects::trade::{ClosedTrade, Trade};
use emabot_infrastructure::artifacts::FilesystemArtifactWriter;
use emabot_infrastructure::market_data::CsvMarketDataRepository;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const DAY: i64 = 86_400;
// 2024-01-01 00:00:00 UTC
const START: i64 = 1_704_067_200;

fn v_shaped_bars() -> Vec<Bar> {
    let closes = (0..20)
        .map(|i| 130.0 - i as f64)
        .chain((0..20).map(|i| 112.0 + 2.0 * i as f64));
    closes
        .enumerate()
        .map(|(i, close)| Bar {
            symbol: "AAPL".to_string(),
            timestamp: START + i as i64 * DAY,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
            open_interest: None,
        })
        .collect()
}

struct FakeMarketData {
    bars: Vec<Bar>,
    queries: Mutex<Vec<OhlcvQuery>>,
}

impl FakeMarketData {
    fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl MarketDataRepository for FakeMarketData {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        self.queries.lock().unwrap().push(query.clone());
        let report = DataQualityReport {
            rows: self.bars.len(),
            ..DataQualityReport::default()
        };
        Ok((self.bars.clone(), report))
    }
}

#[derive(Default)]
struct RecordingArtifacts {
    files: Mutex<Vec<PathBuf>>,
    audit: Mutex<Vec<AuditEvent>>,
    snapshot: Mutex<Option<String>>,
}

impl RecordingArtifacts {
    fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect()
    }

    fn record(&self, path: &Path) {
        self.files.lock().unwrap().push(path.to_path_buf());
    }
}

impl ArtifactWriter for RecordingArtifacts {
    fn ensure_dir(&self, _path: &Path) -> Result<(), String> {
        Ok(())
    }
    fn write_trades_csv(&self, path: &Path, _trades: &[Trade]) -> Result<(), String> {
        self.record(path);
        Ok(())
    }
    fn write_closed_trades_csv(&self, path: &Path, _trades: &[ClosedTrade]) -> Result<(), String> {
        self.record(path);
        Ok(())
    }
    fn write_equity_csv(&self, path: &Path, _points: &[EquityPoint]) -> Result<(), String> {
        self.record(path);
        Ok(())
    }
    fn write_summary_json(
        &self,
        path: &Path,
        _summary: &MetricsSummary,
        _meta: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        self.record(path);
        Ok(())
    }
    fn write_audit_jsonl(&self, path: &Path, events: &[AuditEvent]) -> Result<(), String> {
        self.record(path);
        self.audit.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String> {
        self.record(path);
        *self.snapshot.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }
}

struct CancelImmediately;

impl RunControl for CancelImmediately {
    fn should_cancel(&self) -> bool {
        true
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.strategy.fast = 3;
    config.strategy.slow = 8;
    config.strategy.stake = 10.0;
    config.broker.commission = 0.0;
    config
}

fn unique_tmp_path(name: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("emabot_app_{name}_{}_{}", std::process::id(), now))
}

#[test]
fn backtest_buys_on_golden_cross_and_reports_values() {
    let market = FakeMarketData::new(v_shaped_bars());
    let artifacts = RecordingArtifacts::default();
    let config = fast_config();

    let report = run_backtest(&config, None, &market, &artifacts, &NoopControl).unwrap();

    assert_eq!(report.mode, RunMode::Backtest);
    assert_eq!(report.symbols, vec!["AAPL".to_string()]);
    assert_eq!(report.summary.bars_processed, 40);
    assert_eq!(report.summary.fills, 1);
    assert_eq!(report.starting_value(), 100_000.0);
    // Rising prices after the buy leave the portfolio ahead.
    assert!(report.final_value() > report.starting_value());
    assert!(report.run_dir.is_none());
    assert!(!report.canceled);
    assert!(artifacts.file_names().is_empty());

    let queries = market.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].path, PathBuf::from("data.csv"));
    assert_eq!(queries[0].symbol, "AAPL");
}

#[test]
fn backtest_writes_every_artifact_under_the_run_dir() {
    let market = FakeMarketData::new(v_shaped_bars());
    let artifacts = RecordingArtifacts::default();
    let mut config = fast_config();
    config.live.api_key = Some("secret-key".to_string());

    let report = run_backtest(
        &config,
        Some(PathBuf::from("out")),
        &market,
        &artifacts,
        &NoopControl,
    )
    .unwrap();

    assert_eq!(report.run_dir, Some(PathBuf::from("out").join("ema_cross")));
    assert_eq!(
        artifacts.file_names(),
        vec![
            "trades.csv",
            "closed_trades.csv",
            "equity.csv",
            "summary.json",
            "logs.jsonl",
            "config_snapshot.toml",
        ]
    );

    let audit = artifacts.audit.lock().unwrap();
    assert!(audit.iter().any(|event| event.stage == "order" && event.action == "submitted"));
    assert!(audit.iter().any(|event| event.stage == "timing" && event.action == "load_ohlcv"));
    assert!(audit.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));

    let snapshot = artifacts.snapshot.lock().unwrap().clone().unwrap();
    assert!(snapshot.contains("fast = 3"));
    assert!(!snapshot.contains("secret-key"));
}

#[test]
fn backtest_rejects_bad_configuration_before_loading() {
    let market = FakeMarketData::new(v_shaped_bars());
    let artifacts = RecordingArtifacts::default();

    let mut config = fast_config();
    config.strategy.fast = 8;
    assert!(run_backtest(&config, None, &market, &artifacts, &NoopControl).is_err());

    let mut config = fast_config();
    config.run.symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
    let err = run_backtest(&config, None, &market, &artifacts, &NoopControl).unwrap_err();
    assert!(err.contains("exactly one symbol"), "{err}");

    let mut config = fast_config();
    config.broker.cash = -1.0;
    assert!(run_backtest(&config, None, &market, &artifacts, &NoopControl).is_err());

    assert!(market.queries.lock().unwrap().is_empty());
}

#[test]
fn canceled_backtest_processes_nothing() {
    let market = FakeMarketData::new(v_shaped_bars());
    let artifacts = RecordingArtifacts::default();
    let report =
        run_backtest(&fast_config(), None, &market, &artifacts, &CancelImmediately).unwrap();
    assert!(report.canceled);
    assert_eq!(report.summary.bars_processed, 0);
    assert_eq!(report.final_value(), 100_000.0);
}

#[test]
fn backtest_reads_a_price_file_and_writes_to_disk() {
    let dir = unique_tmp_path("backtest");
    std::fs::create_dir_all(&dir).unwrap();
    let data = dir.join("data.csv");
    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    for (i, bar) in v_shaped_bars().iter().enumerate() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.checked_add_days(chrono::Days::new(i as u64)))
            .unwrap();
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    std::fs::write(&data, csv).unwrap();

    let mut config = fast_config();
    config.paths.data = data.to_string_lossy().to_string();
    let out = dir.join("runs");

    let report = run_backtest(
        &config,
        Some(out.clone()),
        &CsvMarketDataRepository,
        &FilesystemArtifactWriter::new(),
        &NoopControl,
    )
    .unwrap();

    assert_eq!(report.summary.bars_processed, 40);
    assert_eq!(report.data_quality.as_ref().map(|q| q.rows), Some(40));
    let run_dir = out.join("ema_cross");
    for name in ["trades.csv", "equity.csv", "summary.json", "logs.jsonl", "config_snapshot.toml"] {
        assert!(run_dir.join(name).exists(), "missing {name}");
    }
    let equity = std::fs::read_to_string(run_dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), 41);

    std::fs::remove_dir_all(&dir).ok();
}
