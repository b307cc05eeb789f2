use std::future::Future;

use anyhow::Result;
use tracing::debug;

use crate::backoff::Backoff;
use crate::cancel::CancelSignal;
use crate::error::{RetryError, is_retryable, unwrap_retryable};

/// Runs `operation` until it succeeds, fails with an error that is not marked
/// retryable, `backoff` stops, or `cancel` fires.
///
/// When the policy stops, the cause inside the retryable marker is returned
/// rather than the marker itself. Cancellation is checked before every attempt
/// and before every wait, and raced against the wait itself.
pub async fn retry_with_data<T, B, F, Fut>(
    cancel: &CancelSignal,
    backoff: &mut B,
    mut operation: F,
) -> Result<T>
where
    B: Backoff + ?Sized,
    F: FnMut(CancelSignal) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0_u32;

    loop {
        if cancel.is_cancelled() {
            debug!(attempt, "cancelled before attempt");
            return Err(RetryError::Cancelled.into());
        }

        attempt = attempt.saturating_add(1);
        let err = match operation(cancel.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(err);
        }
        let cause = unwrap_retryable(err);

        let Some(delay) = backoff.next_delay() else {
            debug!(attempt, "backoff exhausted");
            return Err(cause);
        };

        // Checked alone first so a pending cancellation never starts a timer.
        if cancel.is_cancelled() {
            debug!(attempt, "cancelled before backoff");
            return Err(RetryError::Cancelled.into());
        }

        debug!(
            attempt,
            delay_ms = delay.as_millis(),
            "attempt failed; backing off"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(attempt, "cancelled during backoff");
                return Err(RetryError::Cancelled.into());
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// [`retry_with_data`] for operations with nothing to return.
pub async fn retry<B, F, Fut>(cancel: &CancelSignal, backoff: &mut B, operation: F) -> Result<()>
where
    B: Backoff + ?Sized,
    F: FnMut(CancelSignal) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    retry_with_data(cancel, backoff, operation).await
}
