//! Bounded lock acquisition
//!
//! Every lock the scheduler takes goes through [`acquire`]: a fixed number
//! of timed attempts, after which the caller gets
//! [`SchedulerError::LockTimeout`]. Worst-case blocking of a request is
//! therefore `attempts * attempt_timeout`.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

use super::error::{SchedulerError, SchedulerResult};

/// How hard to try before giving up on a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Number of timed attempts
    pub attempts: u32,

    /// How long each attempt waits
    pub attempt_timeout: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            attempts: 6,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl LockPolicy {
    /// Create a policy with custom limits
    pub fn new(attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            attempts,
            attempt_timeout,
        }
    }

    /// Upper bound on time spent waiting for one lock
    pub fn max_wait(&self) -> Duration {
        self.attempt_timeout * self.attempts
    }
}

/// Run `attempt` up to `policy.attempts` times, each bounded by the timeout
///
/// `attempt` produces the acquisition future (a guard once resolved). The
/// future of a timed-out attempt is dropped, which leaves the lock's wait
/// queue.
pub async fn acquire<G, F, Fut>(policy: &LockPolicy, lock: &'static str, attempt: F) -> SchedulerResult<G>
where
    F: Fn() -> Fut,
    Fut: Future<Output = G>,
{
    for n in 1..=policy.attempts {
        match tokio::time::timeout(policy.attempt_timeout, attempt()).await {
            Ok(guard) => {
                if n > 1 {
                    debug!(lock = lock, attempt = n, "Lock acquired after retry");
                }
                return Ok(guard);
            }
            Err(_) => {
                warn!(
                    lock = lock,
                    attempt = n,
                    max_attempts = policy.attempts,
                    timeout_ms = policy.attempt_timeout.as_millis() as u64,
                    "Timed out waiting for lock"
                );
            }
        }
    }

    error!(lock = lock, attempts = policy.attempts, "Exceeded lock retries");
    crate::metrics::record_lock_timeout(lock);

    Err(SchedulerError::LockTimeout {
        lock,
        attempts: policy.attempts,
    })
}

/// A reader/writer lock that is only reachable through bounded acquisition
#[derive(Debug)]
pub struct RetryLock<T> {
    name: &'static str,
    policy: LockPolicy,
    inner: RwLock<T>,
}

impl<T> RetryLock<T> {
    /// Wrap `value` under a named lock
    pub fn new(name: &'static str, policy: LockPolicy, value: T) -> Self {
        Self {
            name,
            policy,
            inner: RwLock::new(value),
        }
    }

    /// Name used in logs and errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquisition limits of this lock
    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    /// Acquire shared access
    pub async fn read(&self) -> SchedulerResult<RwLockReadGuard<'_, T>> {
        acquire(&self.policy, self.name, || self.inner.read()).await
    }

    /// Acquire exclusive access
    pub async fn write(&self) -> SchedulerResult<RwLockWriteGuard<'_, T>> {
        acquire(&self.policy, self.name, || self.inner.write()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_policy(attempts: u32) -> LockPolicy {
        LockPolicy::new(attempts, Duration::from_millis(20))
    }

    #[test]
    fn test_default_policy() {
        let policy = LockPolicy::default();
        assert_eq!(policy.attempts, 6);
        assert_eq!(policy.max_wait(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_acquire_first_attempt() {
        let lock = RetryLock::new("test", quick_policy(3), 42);
        let guard = lock.read().await.unwrap();
        assert_eq!(*guard, 42);
    }

    #[tokio::test]
    async fn test_shared_readers() {
        let lock = RetryLock::new("test", quick_policy(1), 1);
        let first = lock.read().await.unwrap();
        let second = lock.read().await.unwrap();
        assert_eq!(*first + *second, 2);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_time_out() {
        let lock = RetryLock::new("runway", quick_policy(2), 0);
        let _held = lock.write().await.unwrap();

        let err = lock.read().await.unwrap_err();
        assert_eq!(
            err,
            SchedulerError::LockTimeout {
                lock: "runway",
                attempts: 2
            }
        );
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_acquired_after_holder_releases() {
        let lock = Arc::new(RetryLock::new("test", quick_policy(10), 0));
        let held = Arc::clone(&lock);
        let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();

        let holder = tokio::spawn(async move {
            let mut guard = held.write().await.unwrap();
            locked_tx.send(()).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            *guard = 7;
        });

        locked_rx.await.unwrap();
        let value = *lock.read().await.unwrap();
        assert_eq!(value, 7);
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_counts_attempts() {
        let attempts = AtomicU32::new(0);
        let result: SchedulerResult<()> = acquire(&quick_policy(3), "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>()
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
