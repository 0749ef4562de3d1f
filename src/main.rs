use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use foldsync::config::Config;
use foldsync::logging::{self, LogSink, TracingSink};
use foldsync::service;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(err) => {
            // Usage errors exit with 1; --help and --version with 0.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = logging::init(&config.log_file) {
        eprintln!("{}: {:#}", "error".red().bold(), err);
        return ExitCode::FAILURE;
    }

    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            TracingSink.info("Shutdown requested, stopping...".to_string());
            ctrl_c.cancel();
        }
    });

    match service::run(&config, sink.clone(), cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            sink.error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
