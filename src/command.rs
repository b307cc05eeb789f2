use std::process::Stdio;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::error::{RetryError, is_cancelled, retryable};

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("`{program}` exited with status {code}")]
    Exit { program: String, code: i32 },
    #[error("`{program}` was terminated by a signal")]
    Signalled { program: String },
}

/// Which failed exits count as transient.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOn {
    AnyFailure,
    ExitCodes(Vec<i32>),
}

impl RetryOn {
    pub fn matches(&self, code: i32) -> bool {
        match self {
            RetryOn::AnyFailure => code != 0,
            RetryOn::ExitCodes(codes) => codes.contains(&code),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub retry_on: RetryOn,
}

/// Runs the command once, killing it if `cancel` fires first.
pub async fn run_attempt(spec: &CommandSpec, cancel: CancelSignal) -> Result<()> {
    info!(program = %spec.program, "starting command");

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn `{}`", spec.program))?;

    let finished = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        status = child.wait() => Some(status),
    };

    let Some(status) = finished else {
        if let Err(err) = child.kill().await {
            warn!("failed to kill `{}`: {err}", spec.program);
        }
        return Err(RetryError::Cancelled.into());
    };
    let status = status.with_context(|| format!("failed waiting for `{}`", spec.program))?;

    if status.success() {
        return Ok(());
    }

    let Some(code) = status.code() else {
        return Err(CommandError::Signalled {
            program: spec.program.clone(),
        }
        .into());
    };

    let err = CommandError::Exit {
        program: spec.program.clone(),
        code,
    };
    if spec.retry_on.matches(code) {
        debug!(code, "exit code is retryable");
        Err(retryable(err))
    } else {
        Err(err.into())
    }
}

/// Process exit code reported for a finished retry session.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if is_cancelled(err) {
        return 130;
    }

    match err.downcast_ref::<CommandError>() {
        Some(CommandError::Exit { code, .. }) => *code,
        _ => 1,
    }
}
