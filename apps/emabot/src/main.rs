mod commands;
mod obs;
mod output;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "emabot")]
#[command(about = "EMA crossover trading bot (backtest and live)", version)]
#[command(
    after_help = "Examples:\n  emabot --data data.csv --fast 50 --slow 200\n  emabot --config configs/sample.toml --out runs/\n  emabot --live --api-key $KEY --symbols AAPL,MSFT --timeframe 5m\n"
)]
pub struct Cli {
    /// Historical price CSV for backtests [default: data.csv]
    #[arg(short = 'd', long)]
    pub data: Option<PathBuf>,

    /// Fast EMA period [default: 50]
    #[arg(short = 'f', long)]
    pub fast: Option<usize>,

    /// Slow EMA period [default: 200]
    #[arg(short = 's', long)]
    pub slow: Option<usize>,

    /// Starting cash [default: 100000.0]
    #[arg(short = 'c', long)]
    pub cash: Option<f64>,

    /// Commission as a fraction of traded value [default: 0.001]
    #[arg(long)]
    pub commission: Option<f64>,

    /// Units bought on each entry [default: 10]
    #[arg(long)]
    pub stake: Option<f64>,

    /// Plot the run (not supported, accepted for compatibility)
    #[arg(short = 'p', long)]
    pub plot: bool,

    /// Trade live against the brokerage instead of backtesting
    #[arg(short = 'l', long)]
    pub live: bool,

    /// Brokerage API key, required with --live
    #[arg(long, env = "EMABOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Comma separated symbols [default: AAPL]
    #[arg(long)]
    pub symbols: Option<String>,

    /// Bar timeframe such as 1m, 5m, 1h or 1d [default: 1d]
    #[arg(long)]
    pub timeframe: Option<String>,

    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for run artifacts
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Live loop sleep between idle ticks, in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Stop a live run after this many polling ticks (history replay not counted)
    #[arg(long)]
    pub max_ticks: Option<u64>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = obs::LogFormat::Fmt)]
    pub log_format: obs::LogFormat,

    /// Serve Prometheus metrics on host:port
    #[arg(long)]
    pub metrics_addr: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    match commands::run(cli) {
        Ok(report) => output::print_report(&report),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
