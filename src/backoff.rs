use std::time::Duration;

use tokio::time::Instant;

/// Produces the wait between two attempts of a retry session.
///
/// `None` means the policy is exhausted and no further attempt should be made.
/// Implementations keep their own state and are not meant to be shared between
/// concurrent sessions; create a fresh one per session.
pub trait Backoff {
    fn next_delay(&mut self) -> Option<Duration>;
}

impl<B: Backoff + ?Sized> Backoff for &mut B {
    fn next_delay(&mut self) -> Option<Duration> {
        (**self).next_delay()
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn next_delay(&mut self) -> Option<Duration> {
        (**self).next_delay()
    }
}

/// Waits the same interval forever.
#[derive(Debug, Clone)]
pub struct Constant {
    interval: Duration,
}

impl Constant {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Backoff for Constant {
    fn next_delay(&mut self) -> Option<Duration> {
        Some(self.interval)
    }
}

#[derive(Debug, Clone)]
pub struct BackoffFn<F> {
    f: F,
}

/// Adapts a closure into a [`Backoff`].
pub fn backoff_fn<F>(f: F) -> BackoffFn<F>
where
    F: FnMut() -> Option<Duration>,
{
    BackoffFn { f }
}

impl<F> Backoff for BackoffFn<F>
where
    F: FnMut() -> Option<Duration>,
{
    fn next_delay(&mut self) -> Option<Duration> {
        (self.f)()
    }
}

/// Stops after `max` intervals have been handed out.
#[derive(Debug, Clone)]
pub struct MaxRetries<B> {
    inner: B,
    max: u32,
    attempt: u32,
}

impl<B: Backoff> Backoff for MaxRetries<B> {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max {
            return None;
        }
        self.attempt += 1;
        self.inner.next_delay()
    }
}

/// Clamps every interval to `cap`.
#[derive(Debug, Clone)]
pub struct CappedDuration<B> {
    inner: B,
    cap: Duration,
}

impl<B: Backoff> Backoff for CappedDuration<B> {
    fn next_delay(&mut self) -> Option<Duration> {
        self.inner.next_delay().map(|delay| delay.min(self.cap))
    }
}

/// Stops once `limit` has elapsed since construction.
///
/// Intervals are clamped to the remaining budget, so the final wait never
/// overshoots the limit.
#[derive(Debug, Clone)]
pub struct MaxDuration<B> {
    inner: B,
    limit: Duration,
    started: Instant,
}

impl<B: Backoff> Backoff for MaxDuration<B> {
    fn next_delay(&mut self) -> Option<Duration> {
        let remaining = self.limit.checked_sub(self.started.elapsed())?;
        if remaining.is_zero() {
            return None;
        }
        self.inner.next_delay().map(|delay| delay.min(remaining))
    }
}

pub trait BackoffExt: Backoff + Sized {
    fn with_max_retries(self, max: u32) -> MaxRetries<Self> {
        MaxRetries {
            inner: self,
            max,
            attempt: 0,
        }
    }

    fn with_capped_duration(self, cap: Duration) -> CappedDuration<Self> {
        CappedDuration { inner: self, cap }
    }

    fn with_max_duration(self, limit: Duration) -> MaxDuration<Self> {
        MaxDuration {
            inner: self,
            limit,
            started: Instant::now(),
        }
    }
}

impl<B: Backoff> BackoffExt for B {}
