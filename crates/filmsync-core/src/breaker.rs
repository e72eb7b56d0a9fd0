use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Run-wide stop flag set by the first rate-limited response.
///
/// Monotonic: once tripped it stays tripped for the rest of the run. Workers
/// check it before dispatching a remote write, and the scheduler stops pulling
/// new items when it fires.
#[derive(Debug, Default)]
pub struct RateLimitBreaker {
    tripped: AtomicBool,
    signal: CancellationToken,
}

impl RateLimitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns true only for the call that actually tripped it.
    pub fn trip(&self) -> bool {
        let first = !self.tripped.swap(true, Ordering::SeqCst);
        if first {
            warn!("Rate limit reached, no new transfers will be started");
            self.signal.cancel();
        }
        first
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Resolves once the breaker has tripped
    pub async fn tripped(&self) {
        self.signal.cancelled().await
    }

    /// Token cancelled when the breaker trips, for owned waits
    pub fn token(&self) -> CancellationToken {
        self.signal.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_only_first_trip_reports() {
        let breaker = RateLimitBreaker::new();
        assert!(!breaker.is_tripped());
        assert!(breaker.trip());
        assert!(!breaker.trip());
        assert!(breaker.is_tripped());
    }

    #[tokio::test]
    async fn test_tripped_wakes_waiters() {
        let breaker = Arc::new(RateLimitBreaker::new());
        let waiter = {
            let breaker = breaker.clone();
            tokio::spawn(async move { breaker.tripped().await })
        };

        breaker.trip();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_trips_report_once() {
        let breaker = Arc::new(RateLimitBreaker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = breaker.clone();
                tokio::spawn(async move { breaker.trip() })
            })
            .collect();

        let mut firsts = 0;
        for handle in handles {
            if handle.await.unwrap() {
                firsts += 1;
            }
        }
        assert_eq!(firsts, 1);
    }
}
