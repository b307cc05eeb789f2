use std::io;

use anyhow::{Context, anyhow};
use assert_matches::assert_matches;
use thiserror::Error;

use rebound::error::{
    RetryError, RetryableError, SharedCause, is_cancelled, is_retryable, retryable,
    retryable_opt, unwrap_retryable,
};

#[derive(Debug, Error)]
#[error("sync failed")]
struct SyncFailed {
    #[source]
    source: RetryableError,
}

#[test]
fn unwrapping_yields_the_original_error() {
    let marked = RetryableError::new(io::Error::new(io::ErrorKind::TimedOut, "slow peer"));

    let cause = marked.into_inner();
    let io_err = cause
        .downcast::<io::Error>()
        .expect("cause should be the io error");
    assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    assert_eq!(io_err.to_string(), "slow peer");
}

#[test]
fn wrapping_none_yields_none() {
    assert!(retryable_opt::<io::Error>(None).is_none());

    let marked = retryable_opt(Some(anyhow!("boom"))).expect("some in, some out");
    assert!(is_retryable(&marked));
}

#[test]
fn display_leaves_the_cause_to_source() {
    let marked = retryable(anyhow!("connection reset"));

    assert_eq!(marked.to_string(), "retryable");
    assert_eq!(format!("{marked:#}"), "retryable: connection reset");
    assert_eq!(marked.chain().count(), 2);
}

#[test]
fn unwrap_strips_marker_behind_foreign_source() {
    let err = anyhow::Error::new(SyncFailed {
        source: RetryableError::new(io::Error::other("throttled")),
    });

    let cause = unwrap_retryable(err);
    assert!(!is_retryable(&cause));
    assert_eq!(format!("{cause:#}"), "throttled");
    let shared = cause
        .downcast_ref::<SharedCause>()
        .expect("nested cause is shared out of the chain");
    assert!(shared.get().downcast_ref::<io::Error>().is_some());
}

#[test]
fn unwrap_leaves_unmarked_errors_alone() {
    let err = unwrap_retryable(anyhow!("bad request"));

    assert_eq!(err.to_string(), "bad request");
}

#[test]
fn plain_errors_are_not_retryable() {
    assert!(!is_retryable(&anyhow!("bad request")));
    assert!(!is_retryable(&io::Error::other("denied").into()));
}

#[test]
fn detects_marker_under_context_layers() {
    let err = Err::<(), _>(retryable(anyhow!("throttled")))
        .context("listing objects")
        .context("mirroring bucket")
        .expect_err("should carry an error");

    assert!(is_retryable(&err));
    assert_eq!(err.to_string(), "mirroring bucket");
}

#[test]
fn detects_marker_behind_foreign_source() {
    let err = anyhow::Error::new(SyncFailed {
        source: RetryableError::new(anyhow!("throttled")),
    });

    assert!(is_retryable(&err));
}

#[test]
fn source_exposes_the_cause() {
    let marked = RetryableError::new(io::Error::other("eof"));

    let source = std::error::Error::source(&marked).expect("marker has a source");
    assert_eq!(source.to_string(), "eof");
    assert_eq!(marked.inner().to_string(), "eof");
}

#[test]
fn cancellation_is_recognised_through_context() {
    let err = anyhow::Error::new(RetryError::Cancelled);
    assert!(is_cancelled(&err));
    assert_eq!(err.to_string(), "retry cancelled");

    let wrapped = err.context("uploading");
    assert!(is_cancelled(&wrapped));
    assert_matches!(wrapped.downcast_ref::<RetryError>(), Some(RetryError::Cancelled));

    assert!(!is_cancelled(&anyhow!("retry cancelled")));
}
