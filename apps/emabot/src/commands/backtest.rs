use emabot_application::backtesting::run_backtest;
use emabot_application::config::Config;
use emabot_application::report::RunReport;
use emabot_domain::services::engine::RunControl;
use emabot_infrastructure::artifacts::FilesystemArtifactWriter;
use emabot_infrastructure::market_data::CsvMarketDataRepository;
use std::path::PathBuf;

pub(super) fn run(
    config: &Config,
    out: Option<PathBuf>,
    control: &dyn RunControl,
) -> Result<RunReport, String> {
    run_backtest(
        config,
        out,
        &CsvMarketDataRepository,
        &FilesystemArtifactWriter::new(),
        control,
    )
}
