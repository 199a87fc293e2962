use crate::config::{snapshot_toml, Config};
use crate::report::RunMode;
use emabot_domain::entities::metrics::MetricsConfig;
use emabot_domain::repositories::artifacts::ArtifactWriter;
use emabot_domain::services::audit::AuditEvent;
use emabot_domain::services::engine::{EngineConfig, EngineResults};
use emabot_domain::services::feed::session::SessionWindow;
use emabot_domain::services::strategy::EmaCrossParams;
use emabot_domain::value_objects::timeframe::Timeframe;
use std::path::PathBuf;

pub fn resolve_timeframe(config: &Config) -> Result<Timeframe, String> {
    Timeframe::parse(&config.run.timeframe).map_err(|err| format!("run.timeframe: {err}"))
}

pub fn resolve_symbols(config: &Config) -> Result<Vec<String>, String> {
    let mut symbols: Vec<String> = Vec::new();
    for raw in &config.run.symbols {
        for symbol in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !symbols.iter().any(|known| known == symbol) {
                symbols.push(symbol.to_string());
            }
        }
    }
    if symbols.is_empty() {
        return Err("run.symbols must name at least one symbol".to_string());
    }
    Ok(symbols)
}

pub fn resolve_strategy_params(config: &Config) -> Result<EmaCrossParams, String> {
    let strategy = &config.strategy;
    if strategy.fast == 0 {
        return Err("strategy.fast must be > 0".to_string());
    }
    if strategy.fast >= strategy.slow {
        return Err(format!(
            "strategy.fast ({}) must be smaller than strategy.slow ({})",
            strategy.fast, strategy.slow
        ));
    }
    if !strategy.stake.is_finite() || strategy.stake <= 0.0 {
        return Err("strategy.stake must be > 0".to_string());
    }
    Ok(EmaCrossParams {
        fast: strategy.fast,
        slow: strategy.slow,
        stake: strategy.stake,
    })
}

pub fn validate_broker(config: &Config) -> Result<(), String> {
    if !config.broker.cash.is_finite() || config.broker.cash <= 0.0 {
        return Err("broker.cash must be > 0".to_string());
    }
    if !config.broker.commission.is_finite() || config.broker.commission < 0.0 {
        return Err("broker.commission must be >= 0".to_string());
    }
    Ok(())
}

pub fn resolve_session(config: &Config) -> Result<SessionWindow, String> {
    SessionWindow::parse(&config.live.session_start, &config.live.session_end)
        .map_err(|err| format!("live session: {err}"))
}

pub fn build_metrics_config(config: &Config) -> MetricsConfig {
    MetricsConfig {
        risk_free_rate: config.report.risk_free_rate,
        annualization_factor: config.report.annualization_factor,
    }
}

pub fn engine_config(config: &Config, starting_cash: f64) -> EngineConfig {
    EngineConfig {
        run_id: config.run.run_id.clone(),
        starting_cash,
        commission: config.broker.commission,
        metrics: build_metrics_config(config),
    }
}

pub fn timing_event(
    run_id: &str,
    action: &str,
    duration_ms: u64,
    details: serde_json::Value,
) -> AuditEvent {
    AuditEvent::new(run_id, 0, "timing", action).details(serde_json::json!({
        "duration_ms": duration_ms,
        "details": details,
    }))
}

pub fn summary_meta_json(
    config: &Config,
    mode: RunMode,
    symbols: &[String],
    results: &EngineResults,
) -> serde_json::Value {
    serde_json::json!({
        "run_id": config.run.run_id,
        "mode": mode.as_str(),
        "symbols": symbols,
        "timeframe": config.run.timeframe,
        "fast": config.strategy.fast,
        "slow": config.strategy.slow,
        "stake": config.strategy.stake,
        "commission": config.broker.commission,
        "start": results.equity.first().map(|point| point.timestamp),
        "end": results.equity.last().map(|point| point.timestamp),
    })
}

/// Writes the run's artifacts under `base_dir/<run_id>` and returns that directory.
pub fn write_outputs(
    config: &Config,
    base_dir: PathBuf,
    meta: &serde_json::Value,
    results: &EngineResults,
    mut audit_extras: Vec<AuditEvent>,
    artifacts: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    let run_dir = base_dir.join(&config.run.run_id);
    artifacts.ensure_dir(&run_dir)?;

    artifacts.write_trades_csv(run_dir.join("trades.csv").as_path(), &results.fills)?;
    artifacts.write_closed_trades_csv(
        run_dir.join("closed_trades.csv").as_path(),
        &results.closed_trades,
    )?;
    artifacts.write_equity_csv(run_dir.join("equity.csv").as_path(), &results.equity)?;
    artifacts.write_summary_json(
        run_dir.join("summary.json").as_path(),
        &results.summary,
        Some(meta),
    )?;

    let mut audit_events = results.audit_events.clone();
    audit_events.append(&mut audit_extras);
    audit_events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.stage.cmp(&b.stage))
    });
    artifacts.write_audit_jsonl(run_dir.join("logs.jsonl").as_path(), &audit_events)?;

    let snapshot = snapshot_toml(config)?;
    artifacts.write_config_snapshot_toml(run_dir.join("config_snapshot.toml").as_path(), &snapshot)?;

    Ok(run_dir)
}

pub fn resolve_out_dir(config: &Config, out: Option<PathBuf>) -> Option<PathBuf> {
    out.or_else(|| config.paths.out_dir.as_ref().map(PathBuf::from))
}
