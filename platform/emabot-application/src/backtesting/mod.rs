use crate::config::Config;
use crate::report::{RunMode, RunReport};
use crate::shared::{
    engine_config, resolve_out_dir, resolve_strategy_params, resolve_symbols, resolve_timeframe,
    summary_meta_json, timing_event, validate_broker, write_outputs,
};
use emabot_domain::repositories::artifacts::ArtifactWriter;
use emabot_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use emabot_domain::services::audit::AuditEvent;
use emabot_domain::services::engine::{RunControl, TradingEngine};
use emabot_domain::services::feed::HistoricalFeed;
use emabot_domain::services::strategy::EmaCross;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};

/// Replays the configured price file through the EMA crossover strategy.
///
/// The price file holds a single instrument, so exactly one symbol must be configured.
/// Artifacts are written only when an output directory is given, either through `out`
/// or `paths.out_dir`.
pub fn run_backtest(
    config: &Config,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
    control: &dyn RunControl,
) -> Result<RunReport, String> {
    let _span = info_span!(
        "run_backtest",
        run_id = %config.run.run_id,
        timeframe = %config.run.timeframe,
        data = %config.paths.data
    )
    .entered();

    let timeframe = resolve_timeframe(config)?;
    let params = resolve_strategy_params(config)?;
    validate_broker(config)?;
    let symbols = resolve_symbols(config)?;
    let [symbol] = symbols.as_slice() else {
        return Err(format!(
            "backtest reads one price file and needs exactly one symbol, got {}",
            symbols.join(",")
        ));
    };

    let mut audit_extras: Vec<AuditEvent> = Vec::new();

    let stage_start = Instant::now();
    let (bars, data_report) = market_data.load_ohlcv(&OhlcvQuery {
        path: PathBuf::from(&config.paths.data),
        symbol: symbol.clone(),
        timeframe: timeframe.clone(),
    })?;
    metrics::histogram!("emabot.backtest.load_ohlcv_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    audit_extras.push(
        timing_event(
            &config.run.run_id,
            "load_ohlcv",
            stage_start.elapsed().as_millis() as u64,
            serde_json::json!({
                "rows": bars.len(),
                "duplicates": data_report.duplicates,
                "gaps": data_report.gaps,
                "out_of_order": data_report.out_of_order,
                "invalid_close": data_report.invalid_close,
            }),
        )
        .symbol(symbol),
    );
    let mut engine = TradingEngine::new(engine_config(config, config.broker.cash));
    engine.add_feed(
        Box::new(HistoricalFeed::new(symbol.clone(), bars)),
        EmaCross::new(params),
    );
    engine.start().map_err(|err| err.to_string())?;

    let stage_start = Instant::now();
    engine.run_to_end(control);
    let canceled = control.should_cancel();
    let results = engine.finish();
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("emabot.backtest.engine_ms").record(engine_ms);
    metrics::gauge!("emabot.backtest.bars_processed").set(results.summary.bars_processed as f64);
    metrics::gauge!("emabot.backtest.trades").set(results.summary.closed_trades as f64);
    audit_extras.push(timing_event(
        &config.run.run_id,
        "run_engine",
        engine_ms as u64,
        serde_json::json!({ "canceled": canceled }),
    ));

    info!(
        bars = results.summary.bars_processed,
        fills = results.summary.fills,
        final_value = results.summary.final_value,
        canceled,
        "backtest finished"
    );

    let run_dir = match resolve_out_dir(config, out) {
        Some(base_dir) => {
            let meta = summary_meta_json(config, RunMode::Backtest, &symbols, &results);
            Some(write_outputs(
                config,
                base_dir,
                &meta,
                &results,
                audit_extras,
                artifacts,
            )?)
        }
        None => None,
    };

    Ok(RunReport {
        run_id: config.run.run_id.clone(),
        mode: RunMode::Backtest,
        symbols,
        summary: results.summary,
        data_quality: Some(data_report),
        run_dir,
        canceled,
    })
}
