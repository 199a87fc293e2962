use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Run configuration. Every section is optional; missing values take the same defaults
/// as the command line.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub run: RunConfig,
    pub strategy: StrategyConfig,
    pub broker: BrokerConfig,
    pub live: LiveConfig,
    pub paths: PathsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RunConfig {
    pub run_id: String,
    pub symbols: Vec<String>,
    pub timeframe: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: "ema_cross".to_string(),
            symbols: vec!["AAPL".to_string()],
            timeframe: "1d".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct StrategyConfig {
    pub fast: usize,
    pub slow: usize,
    pub stake: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast: 50,
            slow: 200,
            stake: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct BrokerConfig {
    pub cash: f64,
    /// Fraction of traded value, e.g. `0.001` for 0.1%.
    pub commission: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cash: 100_000.0,
            commission: 0.001,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LiveConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub session_start: String,
    pub session_end: String,
    pub lookback_days: i64,
    pub poll_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
    /// Seed for the synthetic bar source; entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            session_start: "09:30".to_string(),
            session_end: "16:00".to_string(),
            lookback_days: 365,
            poll_interval_ms: 1_000,
            max_ticks: None,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PathsConfig {
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data: "data.csv".to_string(),
            out_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ReportConfig {
    pub risk_free_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualization_factor: Option<f64>,
    pub plot: bool,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))
}

/// The effective configuration as TOML, with the API key masked.
pub fn snapshot_toml(config: &Config) -> Result<String, String> {
    let mut redacted = config.clone();
    if redacted.live.api_key.is_some() {
        redacted.live.api_key = Some("***".to_string());
    }
    to_toml_pretty(&redacted)
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
