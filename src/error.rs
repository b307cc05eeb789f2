use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Marks the wrapped error as eligible for another attempt.
///
/// Only errors carrying this marker somewhere in their chain are retried.
pub struct RetryableError {
    inner: Arc<anyhow::Error>,
}

impl RetryableError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: Arc::new(err.into()),
        }
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn into_inner(self) -> anyhow::Error {
        Arc::try_unwrap(self.inner)
            .unwrap_or_else(|shared| SharedCause { inner: shared }.into())
    }

    /// The cause, recovered through a borrow of the marker.
    pub fn shared_cause(&self) -> SharedCause {
        SharedCause {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for RetryableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetryableError").field(&self.inner).finish()
    }
}

impl fmt::Display for RetryableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("retryable")
    }
}

impl std::error::Error for RetryableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = (*self.inner).as_ref();
        Some(cause)
    }
}

/// Cause of a retryable error that was nested behind another error type.
///
/// Displays as the cause and continues its `source()` chain.
pub struct SharedCause {
    inner: Arc<anyhow::Error>,
}

impl SharedCause {
    pub fn get(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl fmt::Debug for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl std::error::Error for SharedCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Strips the retryable marker, returning the cause it wraps.
///
/// The cause is moved out when the marker is the error itself or sits under
/// `anyhow` context; behind any other wrapper it is shared from the chain.
/// Errors without a marker come back unchanged.
pub fn unwrap_retryable(err: anyhow::Error) -> anyhow::Error {
    let err = match err.downcast::<RetryableError>() {
        Ok(retryable) => return retryable.into_inner(),
        Err(err) => err,
    };

    let shared = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<RetryableError>())
        .map(RetryableError::shared_cause);
    match shared {
        Some(cause) => cause.into(),
        None => err,
    }
}

pub fn retryable(err: impl Into<anyhow::Error>) -> anyhow::Error {
    RetryableError::new(err).into()
}

/// Like [`retryable`], but passes `None` through untouched.
pub fn retryable_opt<E>(err: Option<E>) -> Option<anyhow::Error>
where
    E: Into<anyhow::Error>,
{
    err.map(retryable)
}

/// True if any error in the chain carries the retryable marker.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<RetryableError>())
}

pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RetryError>()
        .is_some_and(|retry| matches!(retry, RetryError::Cancelled))
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryError {
    #[error("retry cancelled")]
    Cancelled,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` out of range: got {actual}, expected {min}..={max}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        actual: u64,
    },
    #[error("retry exit code must be in 1..=255, got {0}")]
    InvalidExitCode(i32),
    #[error("command to run cannot be empty")]
    EmptyCommand,
}
