use crate::config::Config;
use crate::report::{RunMode, RunReport};
use crate::shared::{
    engine_config, resolve_out_dir, resolve_session, resolve_strategy_params, resolve_symbols,
    resolve_timeframe, summary_meta_json, timing_event, validate_broker, write_outputs,
};
use emabot_domain::repositories::artifacts::ArtifactWriter;
use emabot_domain::repositories::bar_source::BarSource;
use emabot_domain::repositories::brokerage::BrokerageApi;
use emabot_domain::services::engine::{RunControl, StepOutcome, TradingEngine};
use emabot_domain::services::feed::clock::Clock;
use emabot_domain::services::feed::{StreamingFeed, StreamingParams};
use emabot_domain::services::strategy::EmaCross;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span};

/// Trades the configured symbols on streaming feeds that replay recent history and then
/// poll for live bars during the session.
///
/// The brokerage session is opened before the loop and always closed afterwards, also
/// when the run fails. Orders raised on live bars are routed to the brokerage and
/// mirrored in the simulated book, which is what the reported metrics describe. Orders
/// raised during the history replay stay in the simulated book.
pub fn run_live(
    config: &Config,
    out: Option<PathBuf>,
    brokerage: &mut dyn BrokerageApi,
    make_source: &mut dyn FnMut(&str) -> Box<dyn BarSource>,
    clock: Arc<dyn Clock>,
    artifacts: &dyn ArtifactWriter,
    control: &dyn RunControl,
) -> Result<RunReport, String> {
    let _span = info_span!(
        "run_live",
        run_id = %config.run.run_id,
        timeframe = %config.run.timeframe
    )
    .entered();

    if config
        .live
        .api_key
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        return Err("live mode requires an API key (--api-key or live.api_key)".to_string());
    }
    resolve_timeframe(config)?;
    resolve_strategy_params(config)?;
    resolve_session(config)?;
    validate_broker(config)?;
    resolve_symbols(config)?;

    brokerage
        .connect()
        .map_err(|err| format!("brokerage connection failed: {err}"))?;

    let result = trade_connected(config, out, brokerage, make_source, clock, artifacts, control);
    if let Err(err) = &result {
        error!(error = %err, "live run failed");
    }
    brokerage.disconnect();
    info!("brokerage disconnected");
    result
}

fn trade_connected(
    config: &Config,
    out: Option<PathBuf>,
    brokerage: &mut dyn BrokerageApi,
    make_source: &mut dyn FnMut(&str) -> Box<dyn BarSource>,
    clock: Arc<dyn Clock>,
    artifacts: &dyn ArtifactWriter,
    control: &dyn RunControl,
) -> Result<RunReport, String> {
    let timeframe = resolve_timeframe(config)?;
    let params = resolve_strategy_params(config)?;
    let session = resolve_session(config)?;
    let symbols = resolve_symbols(config)?;

    let account = brokerage
        .get_account_info()
        .map_err(|err| format!("failed to read account info: {err}"))?;
    if !account.balance.is_finite() || account.balance <= 0.0 {
        return Err(format!("brokerage reported unusable balance {}", account.balance));
    }
    info!(
        balance = account.balance,
        positions = account.positions.len(),
        "account loaded"
    );

    let mut engine = TradingEngine::new(engine_config(config, account.balance)).with_router(brokerage);
    for symbol in &symbols {
        let mut params_for_feed = StreamingParams::new(symbol.clone(), timeframe.clone());
        params_for_feed.lookback_days = config.live.lookback_days;
        params_for_feed.live = true;
        params_for_feed.session = Some(session);
        let feed = StreamingFeed::builder(params_for_feed)
            .source(make_source(symbol))
            .clock(Arc::clone(&clock))
            .build()
            .map_err(|err| err.to_string())?;
        engine.add_feed(Box::new(feed), EmaCross::new(params));
    }

    let stage_start = Instant::now();
    engine.start().map_err(|err| err.to_string())?;
    metrics::histogram!("emabot.live.start_ms").record(stage_start.elapsed().as_millis() as f64);

    let poll_interval = Duration::from_millis(config.live.poll_interval_ms);
    let mut ticks: u64 = 0;
    let mut canceled = false;
    let mut announced_live = false;
    loop {
        if control.should_cancel() {
            info!("live run canceled");
            canceled = true;
            break;
        }
        if config.live.max_ticks.is_some_and(|max| ticks >= max) {
            info!(ticks, "tick limit reached");
            break;
        }

        let outcome = engine.step();
        // The tick limit only covers polling; the history replay is not counted.
        if engine.any_live() {
            ticks += 1;
        }
        match outcome {
            StepOutcome::NewBars(_) => {}
            StepOutcome::Idle => {
                if !poll_interval.is_zero() {
                    thread::sleep(poll_interval);
                }
            }
            StepOutcome::Finished => break,
        }
        if !announced_live && engine.any_live() {
            announced_live = true;
            info!(
                bars = engine.bars_processed(),
                value = engine.value(),
                "history replayed, trading live"
            );
        }
    }

    let results = engine.finish();
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("emabot.live.engine_ms").record(engine_ms);
    metrics::gauge!("emabot.live.bars_processed").set(results.summary.bars_processed as f64);
    metrics::gauge!("emabot.live.trades").set(results.summary.closed_trades as f64);

    let run_dir = match resolve_out_dir(config, out) {
        Some(base_dir) => {
            let meta = summary_meta_json(config, RunMode::Live, &symbols, &results);
            let extras = vec![timing_event(
                &config.run.run_id,
                "run_engine",
                engine_ms as u64,
                serde_json::json!({ "ticks": ticks, "canceled": canceled }),
            )];
            Some(write_outputs(config, base_dir, &meta, &results, extras, artifacts)?)
        }
        None => None,
    };

    Ok(RunReport {
        run_id: config.run.run_id.clone(),
        mode: RunMode::Live,
        symbols,
        summary: results.summary,
        data_quality: None,
        run_dir,
        canceled,
    })
}

