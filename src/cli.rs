use std::time::Duration;

use clap::Parser;

use crate::backoff::{Backoff, BackoffExt, Constant};
use crate::command::{CommandSpec, RetryOn};
use crate::error::ConfigError;

const MAX_BACKOFF_MS: u64 = 3_600_000;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "rebound",
    version,
    about = "Run a command, retrying transient failures with backoff"
)]
pub struct CliArgs {
    #[arg(long, default_value_t = 5)]
    pub retries: u32,

    #[arg(long, default_value_t = 1000)]
    pub backoff_ms: u64,

    #[arg(long)]
    pub max_backoff_ms: Option<u64>,

    #[arg(long)]
    pub max_duration_ms: Option<u64>,

    /// Exit codes worth retrying. Any non-zero exit retries when omitted.
    #[arg(long, value_delimiter = ',')]
    pub retry_on_exit: Vec<i32>,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: Option<u64>,
    pub max_duration_ms: Option<u64>,
    pub retry_on: RetryOn,
    pub program: String,
    pub args: Vec<String>,
    pub verbose: bool,
}

impl CliArgs {
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        validate_range("retries", self.retries as u64, 0, 10_000)?;
        validate_range("backoff-ms", self.backoff_ms, 0, MAX_BACKOFF_MS)?;
        if let Some(cap) = self.max_backoff_ms {
            validate_range("max-backoff-ms", cap, 1, MAX_BACKOFF_MS)?;
        }
        if let Some(limit) = self.max_duration_ms {
            validate_range("max-duration-ms", limit, 1, u64::MAX)?;
        }

        if let Some(code) = self
            .retry_on_exit
            .iter()
            .copied()
            .find(|code| !(1..=255).contains(code))
        {
            return Err(ConfigError::InvalidExitCode(code));
        }
        let retry_on = if self.retry_on_exit.is_empty() {
            RetryOn::AnyFailure
        } else {
            RetryOn::ExitCodes(self.retry_on_exit)
        };

        let mut command = self.command.into_iter();
        let program = match command.next() {
            Some(program) if !program.trim().is_empty() => program,
            _ => return Err(ConfigError::EmptyCommand),
        };

        Ok(AppConfig {
            retries: self.retries,
            backoff_ms: self.backoff_ms,
            max_backoff_ms: self.max_backoff_ms,
            max_duration_ms: self.max_duration_ms,
            retry_on,
            program,
            args: command.collect(),
            verbose: self.verbose,
        })
    }
}

impl AppConfig {
    /// Fresh policy for one retry session.
    pub fn backoff(&self) -> Box<dyn Backoff + Send> {
        let base =
            Constant::new(Duration::from_millis(self.backoff_ms)).with_max_retries(self.retries);

        match (self.max_backoff_ms, self.max_duration_ms) {
            (None, None) => Box::new(base),
            (Some(cap), None) => {
                Box::new(base.with_capped_duration(Duration::from_millis(cap)))
            }
            (None, Some(limit)) => {
                Box::new(base.with_max_duration(Duration::from_millis(limit)))
            }
            (Some(cap), Some(limit)) => Box::new(
                base.with_capped_duration(Duration::from_millis(cap))
                    .with_max_duration(Duration::from_millis(limit)),
            ),
        }
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: self.args.clone(),
            retry_on: self.retry_on.clone(),
        }
    }
}

fn validate_range(field: &'static str, actual: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if actual < min || actual > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}
