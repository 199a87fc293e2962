mod backtest;
mod common;
mod live;

use crate::Cli;
use emabot_application::report::RunReport;
use emabot_domain::services::engine::RunControl;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Cancel flag raised by the Ctrl-C watcher and polled by the run loop.
#[derive(Clone, Default)]
struct CancelFlag(Arc<AtomicBool>);

impl RunControl for CancelFlag {
    fn should_cancel(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub fn run(cli: Cli) -> Result<RunReport, String> {
    let config = common::resolve_config(&cli)?;
    if config.report.plot {
        warn!("plotting is not supported; --plot is ignored");
    }
    common::log_config_summary(&config);

    let out = cli.out;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to init tokio runtime: {err}"))?;

    runtime.block_on(async move {
        let control = CancelFlag::default();
        let flag = control.0.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current tick");
                flag.store(true, Ordering::Relaxed);
            }
        });

        let task = tokio::task::spawn_blocking(move || {
            if config.live.enabled {
                live::run(&config, out, &control)
            } else {
                backtest::run(&config, out, &control)
            }
        });
        let result = match task.await {
            Ok(result) => result,
            Err(err) => Err(format!("run task failed: {err}")),
        };
        watcher.abort();
        result
    })
}
