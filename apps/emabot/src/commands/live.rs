use emabot_application::config::Config;
use emabot_application::live_trading::run_live;
use emabot_application::report::RunReport;
use emabot_domain::repositories::bar_source::BarSource;
use emabot_domain::services::engine::RunControl;
use emabot_domain::services::feed::clock::SystemClock;
use emabot_domain::services::feed::session::SessionWindow;
use emabot_infrastructure::artifacts::FilesystemArtifactWriter;
use emabot_infrastructure::brokerage::TradeLockerClient;
use emabot_infrastructure::market_data::SyntheticBarSource;
use std::path::PathBuf;
use std::sync::Arc;

pub(super) fn run(
    config: &Config,
    out: Option<PathBuf>,
    control: &dyn RunControl,
) -> Result<RunReport, String> {
    let Some(api_key) = config
        .live
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
    else {
        return Err("live mode requires an API key (--api-key or EMABOT_API_KEY)".to_string());
    };
    let session = SessionWindow::parse(&config.live.session_start, &config.live.session_end)
        .map_err(|err| err.to_string())?;

    let mut brokerage = TradeLockerClient::new(api_key);
    let seed = config.live.seed;
    let mut feeds_built = 0u64;
    let mut make_source = move |_symbol: &str| -> Box<dyn BarSource> {
        let source = match seed {
            // One stream per symbol, reproducible across runs.
            Some(seed) => SyntheticBarSource::seeded(seed.wrapping_add(feeds_built)),
            None => SyntheticBarSource::new(),
        };
        feeds_built += 1;
        Box::new(source.with_session(session))
    };

    run_live(
        config,
        out,
        &mut brokerage,
        &mut make_source,
        Arc::new(SystemClock),
        &FilesystemArtifactWriter::new(),
        control,
    )
}
