use std::time::Duration;

use tokio::sync::watch;

use rebound::cancel::{CancelSignal, cancellation};

#[tokio::test]
async fn cancel_is_observed_by_every_signal() {
    let (handle, signal) = cancellation();
    let other = handle.signal();

    assert!(!signal.is_cancelled());
    handle.cancel();

    assert!(signal.is_cancelled());
    assert!(other.is_cancelled());
    assert!(handle.is_cancelled());
}

#[tokio::test]
async fn cancelled_resolves_when_already_triggered() {
    let (handle, signal) = cancellation();
    handle.cancel();

    tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
        .await
        .expect("already-cancelled signal should resolve immediately");
}

#[tokio::test]
async fn cancelled_survives_dropped_handle() {
    let (handle, signal) = cancellation();
    handle.cancel();
    drop(handle);

    assert!(signal.is_cancelled());
    tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
        .await
        .expect("cancellation should persist after the handle is gone");
}

#[tokio::test]
async fn dropped_handle_without_cancel_never_fires() {
    let (handle, signal) = cancellation();
    drop(handle);

    let waited = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
    assert!(waited.is_err());
    assert!(!signal.is_cancelled());
}

#[tokio::test]
async fn never_signal_stays_pending() {
    let signal = CancelSignal::never();

    let waited = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn cancel_after_fires_once_delay_elapses() {
    let (handle, signal) = cancellation();
    let _timer = handle.cancel_after(Duration::from_millis(20));

    tokio::time::timeout(Duration::from_secs(5), signal.cancelled())
        .await
        .expect("timer should cancel the signal");
    assert!(signal.is_cancelled());
}

#[tokio::test]
async fn wraps_existing_stop_channel() {
    let (tx, rx) = watch::channel(false);
    let signal = CancelSignal::from(rx);

    tx.send_replace(true);

    assert!(signal.is_cancelled());
}
