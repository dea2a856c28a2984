use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

mod cli;
mod pipeline;

use cli::Cli;
use pipeline::PipelineConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let config = PipelineConfig::from(&cli);
    let stop = Arc::new(AtomicBool::new(false));

    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, shutting down");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    // The pipeline is synchronous; run it off the async runtime and let
    // the stop flag carry the shutdown request across.
    let result = tokio::task::spawn_blocking(move || pipeline::run_pipeline(config, &stop)).await;

    let exit_code = match result {
        Ok(Ok(())) => 0,
        Ok(Err(err)) => {
            log::error!("{err}");
            1
        }
        Err(join_err) => {
            log::error!("pipeline task failed: {join_err}");
            1
        }
    };
    std::process::exit(exit_code);
}
