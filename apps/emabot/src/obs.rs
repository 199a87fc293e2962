use clap::ValueEnum;
use std::net::SocketAddr;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Fmt,
    /// One JSON object per event.
    Json,
}

/// `EMABOT_LOG` wins over `--log-level` when set.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<(), String> {
    let filter = std::env::var("EMABOT_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .map_err(|err| format!("invalid log filter '{filter}': {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Fmt => builder.with_target(false).init(),
    }
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!("emabot.feed.bars_emitted", "Bars emitted by streaming feeds");
    metrics::describe_counter!("emabot.feed.live_polls", "Live poll attempts");
    metrics::describe_counter!("emabot.orders.submitted", "Orders submitted by strategies");
    metrics::describe_counter!("emabot.orders.completed", "Orders filled");
    metrics::describe_counter!("emabot.orders.canceled", "Orders canceled");
    metrics::describe_counter!("emabot.orders.margin", "Orders refused for insufficient cash");
    metrics::describe_counter!("emabot.orders.rejected", "Orders rejected");
    metrics::describe_histogram!("emabot.backtest.engine_ms", metrics::Unit::Milliseconds, "Backtest engine time");
    metrics::describe_histogram!("emabot.live.engine_ms", metrics::Unit::Milliseconds, "Live loop time");
}

#[cfg(feature = "prometheus")]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = metrics_addr.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid --metrics-addr '{raw}' (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;
    describe_metrics();

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    if metrics_addr.is_some() {
        return Err("--metrics-addr needs emabot built with feature `prometheus`".to_string());
    }
    describe_metrics();
    Ok(None)
}
