use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use rebound::cancel::{CancelHandle, CancelSignal, cancellation};
use rebound::cli::{AppConfig, CliArgs};
use rebound::command::{exit_code_for, run_attempt};
use rebound::retry::retry;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = args.into_config()?;
    let (handle, signal) = cancellation();
    watch_ctrl_c(handle);

    match run_with_retry(&config, signal).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let code = exit_code_for(&err);
            error!(code, "{err:#}");
            std::process::exit(code);
        }
    }
}

async fn run_with_retry(config: &AppConfig, signal: CancelSignal) -> Result<()> {
    let spec = config.command_spec();
    let mut backoff = config.backoff();

    retry(&signal, &mut backoff, |cancel| {
        let spec = &spec;
        async move { run_attempt(spec, cancel).await }
    })
    .await?;

    info!(program = %spec.program, "command succeeded");
    Ok(())
}

fn watch_ctrl_c(handle: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, cancelling");
            handle.cancel();
        }
    });
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("info,rebound=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
