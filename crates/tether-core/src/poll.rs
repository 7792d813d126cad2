//! Bounded poll-until-converged helper.
//!
//! The platform commands this tool drives have no completion events, so
//! every asynchronous state change (app started, app exited) is observed
//! by repeated sampling. This module is the single implementation of that
//! pattern: probe immediately, then once per interval, until the probe
//! converges or the deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::Result;

/// Sample `probe` until it returns `true` or `timeout` elapses.
///
/// Probes once immediately, then once per `interval` while the deadline
/// has not passed — a 10 s window at 1 s intervals performs at most 10
/// probes. Returns `Ok(true)` on convergence, `Ok(false)` when the
/// deadline passes first, and the probe's error unchanged if one fails.
pub async fn until<F, Fut>(interval: Duration, timeout: Duration, mut probe: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if probe().await? {
            return Ok(true);
        }
        sleep(interval).await;
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_until_converges() {
        let probes = AtomicUsize::new(0);
        let converged = until(Duration::from_secs(1), Duration::from_secs(10), || {
            let n = probes.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n >= 2) }
        })
        .await
        .expect("poll");

        assert!(converged);
        assert_eq!(probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_deadline_bounds_probe_count() {
        let probes = AtomicUsize::new(0);
        let converged = until(Duration::from_secs(1), Duration::from_secs(10), || {
            probes.fetch_add(1, Ordering::SeqCst);
            async { Ok(false) }
        })
        .await
        .expect("poll");

        assert!(!converged);
        assert_eq!(probes.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_propagates_probe_error() {
        let result = until(Duration::from_secs(1), Duration::from_secs(10), || async {
            Err(Error::DeviceNotConnected)
        })
        .await;

        assert!(matches!(result, Err(Error::DeviceNotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_zero_timeout_never_probes() {
        let probes = AtomicUsize::new(0);
        let converged = until(Duration::from_secs(1), Duration::ZERO, || {
            probes.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        })
        .await
        .expect("poll");

        assert!(!converged);
        assert_eq!(probes.load(Ordering::SeqCst), 0);
    }
}
