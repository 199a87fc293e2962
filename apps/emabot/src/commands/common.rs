use crate::Cli;
use emabot_application::config::{load_config, Config};
use tracing::info;

/// Loads the config file, if any, and lays the command-line flags over it.
pub(super) fn resolve_config(cli: &Cli) -> Result<Config, String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(data) = &cli.data {
        config.paths.data = data.to_string_lossy().to_string();
    }
    if let Some(fast) = cli.fast {
        config.strategy.fast = fast;
    }
    if let Some(slow) = cli.slow {
        config.strategy.slow = slow;
    }
    if let Some(stake) = cli.stake {
        config.strategy.stake = stake;
    }
    if let Some(cash) = cli.cash {
        config.broker.cash = cash;
    }
    if let Some(commission) = cli.commission {
        config.broker.commission = commission;
    }
    if let Some(symbols) = &cli.symbols {
        config.run.symbols = symbols
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(timeframe) = &cli.timeframe {
        config.run.timeframe = timeframe.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.live.api_key = Some(api_key.clone());
    }
    if let Some(poll_ms) = cli.poll_ms {
        config.live.poll_interval_ms = poll_ms;
    }
    if let Some(max_ticks) = cli.max_ticks {
        config.live.max_ticks = Some(max_ticks);
    }
    config.live.enabled |= cli.live;
    config.report.plot |= cli.plot;

    Ok(config)
}

pub(super) fn log_config_summary(config: &Config) {
    info!(
        run_id = %config.run.run_id,
        mode = if config.live.enabled { "live" } else { "backtest" },
        symbols = %config.run.symbols.join(","),
        timeframe = %config.run.timeframe,
        fast = config.strategy.fast,
        slow = config.strategy.slow,
        stake = config.strategy.stake,
        cash = config.broker.cash,
        commission = config.broker.commission,
        "starting run"
    );
}
