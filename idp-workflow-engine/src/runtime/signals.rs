//! Named signal delivery into workflow instances.
//!
//! Signals are unordered, idempotent and buffered: delivering a signal that no
//! one is waiting for parks it until the next receive, and delivering the same
//! signal twice is indistinguishable from once. A wait races arrival against
//! its timeout; the first to fire wins.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct RunSignals {
    pending: HashSet<String>,
    notify: Arc<Notify>,
}

/// Per-run signal inboxes. Cheap to clone; all clones share state.
#[derive(Clone, Default)]
pub struct SignalHub {
    inner: Arc<Mutex<HashMap<String, RunSignals>>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `signal` to `run_id`. Buffered until consumed; duplicate
    /// deliveries collapse.
    pub fn deliver(&self, run_id: &str, signal: &str) {
        let notify = {
            let mut inner = self.inner.lock();
            let entry = inner.entry(run_id.to_string()).or_default();
            entry.pending.insert(signal.to_string());
            entry.notify.clone()
        };
        notify.notify_waiters();
    }

    /// Waits until `signal` arrives for `run_id` or `timeout` elapses.
    /// Returns `true` when the signal was received (and consumed).
    pub async fn wait(&self, run_id: &str, signal: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notify = {
                let mut inner = self.inner.lock();
                inner.entry(run_id.to_string()).or_default().notify.clone()
            };

            // Subscribe before checking the inbox: notify_waiters only
            // reaches futures that are already registered, so a deliver()
            // racing this loop must either land in `pending` before the
            // check below or wake the enabled future.
            let mut notified = pin!(notify.notified());
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if let Some(entry) = inner.get_mut(run_id) {
                    if entry.pending.remove(signal) {
                        return true;
                    }
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                // Timed out; one last check covers a delivery racing the
                // timer itself.
                let mut inner = self.inner.lock();
                return inner
                    .get_mut(run_id)
                    .map(|entry| entry.pending.remove(signal))
                    .unwrap_or(false);
            }
        }
    }

    /// Drops all buffered signals for a finished run.
    pub fn remove_run(&self, run_id: &str) {
        self.inner.lock().remove(run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffered_signal_is_consumed_without_waiting() {
        let hub = SignalHub::new();
        hub.deliver("run-1", "SecurityScanPassed");
        hub.deliver("run-1", "SecurityScanPassed");

        assert!(hub.wait("run-1", "SecurityScanPassed", Duration::from_secs(1)).await);
        // Duplicate delivery collapsed; a second wait times out.
        assert!(!hub.wait("run-1", "SecurityScanPassed", Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn signal_unblocks_concurrent_waiter() {
        let hub = SignalHub::new();
        let waiter = {
            let hub = hub.clone();
            tokio::spawn(async move {
                hub.wait("run-1", "RotationValidatedExternally", Duration::from_secs(5)).await
            })
        };

        tokio::task::yield_now().await;
        hub.deliver("run-1", "RotationValidatedExternally");

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_without_signal() {
        let hub = SignalHub::new();
        assert!(!hub.wait("run-1", "SecurityScanPassed", Duration::from_secs(900)).await);
    }

    #[tokio::test]
    async fn signals_are_scoped_per_run() {
        let hub = SignalHub::new();
        hub.deliver("run-1", "SecurityScanPassed");
        assert!(!hub.wait("run-2", "SecurityScanPassed", Duration::from_millis(10)).await);
        assert!(hub.wait("run-1", "SecurityScanPassed", Duration::from_millis(10)).await);
    }

    /// Stresses the deliver-vs-wait race on a multi-threaded runtime: the
    /// deliverer runs on a different OS thread than the waiter, so a
    /// notify_waiters call can land at any point of the waiter's
    /// subscribe/check sequence. A waiter that only wakes via its timer
    /// (lost wakeup) blows the per-iteration bound.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_delivery_from_another_thread_wakes_waiter_promptly() {
        let hub = SignalHub::new();

        for i in 0..1000 {
            let run_id = format!("run-{i}");
            let started = std::time::Instant::now();

            let waiter = {
                let hub = hub.clone();
                let run_id = run_id.clone();
                tokio::spawn(async move {
                    hub.wait(&run_id, "SecurityScanPassed", Duration::from_secs(30)).await
                })
            };
            let deliverer = {
                let hub = hub.clone();
                let run_id = run_id.clone();
                tokio::spawn(async move {
                    hub.deliver(&run_id, "SecurityScanPassed");
                })
            };

            deliverer.await.unwrap();
            assert!(
                waiter.await.unwrap(),
                "iteration {i}: delivered signal was lost"
            );
            assert!(
                started.elapsed() < Duration::from_secs(30),
                "iteration {i}: waiter only woke via its timeout"
            );
        }
    }
}
