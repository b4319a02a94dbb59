//! Asynchronous event delivery
//!
//! Every observer owns an [`ObserverLane`]: an unbounded FIFO drained by its
//! own task. Pushing onto a lane never blocks, so the scheduler can enqueue
//! while holding its locks. Deliveries across all lanes share one semaphore,
//! which caps how many observer callbacks run at the same time.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify, Semaphore};
use tracing::{debug, warn};
use uuid::Uuid;

use super::observer::{deliver, FlightObserver, ObserverError};
use super::FlightEvent;

// ============================================================================
// Configuration
// ============================================================================

/// Notifier limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Observer callbacks allowed to run concurrently
    pub max_concurrent_deliveries: usize,

    /// Per-callback timeout in milliseconds
    pub delivery_timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deliveries: 32,
            delivery_timeout_ms: 5_000,
        }
    }
}

impl NotifierConfig {
    /// Set the concurrency cap
    pub fn with_max_concurrent_deliveries(mut self, max: usize) -> Self {
        self.max_concurrent_deliveries = max;
        self
    }

    /// Set the per-callback timeout
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout_ms = timeout.as_millis() as u64;
        self
    }

    fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Delivery counters since start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotifierStats {
    pub delivered: u64,
    pub failed: u64,
    pub pending: usize,
    pub open_lanes: usize,
}

#[derive(Debug)]
struct Shared {
    config: NotifierConfig,
    permits: Semaphore,
    pending: AtomicUsize,
    open_lanes: AtomicUsize,
    delivered: AtomicU64,
    failed: AtomicU64,
    idle: Notify,
}

impl Shared {
    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Delivery engine shared by all observer lanes
#[derive(Debug, Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NotifierConfig::default())
    }
}

impl Notifier {
    /// Create a notifier; a zero concurrency cap is raised to one
    pub fn new(config: NotifierConfig) -> Self {
        let permits = Semaphore::new(config.max_concurrent_deliveries.max(1));
        Self {
            shared: Arc::new(Shared {
                config,
                permits,
                pending: AtomicUsize::new(0),
                open_lanes: AtomicUsize::new(0),
                delivered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Get the active configuration
    pub fn config(&self) -> &NotifierConfig {
        &self.shared.config
    }

    /// Start a lane for `observer`
    ///
    /// Spawns the lane's drain task, so this must run inside a Tokio runtime.
    pub fn open_lane(&self, observer: Arc<dyn FlightObserver>) -> ObserverLane {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        self.shared.open_lanes.fetch_add(1, Ordering::AcqRel);
        tokio::spawn(drain(Arc::clone(&self.shared), id, observer, rx));

        ObserverLane {
            id,
            tx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Wait until every enqueued event has been delivered or dropped
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Snapshot of the delivery counters
    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            pending: self.shared.pending.load(Ordering::Acquire),
            open_lanes: self.shared.open_lanes.load(Ordering::Acquire),
        }
    }
}

// ============================================================================
// Lanes
// ============================================================================

/// Sending half of one observer's FIFO
#[derive(Debug)]
pub struct ObserverLane {
    id: Uuid,
    tx: mpsc::UnboundedSender<FlightEvent>,
    shared: Arc<Shared>,
}

impl ObserverLane {
    /// Lane identifier, unique per subscription
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueue `event` without blocking
    pub fn push(&self, event: FlightEvent) {
        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            self.shared.finish_one();
            warn!(lane = %self.id, event = %event, "Observer lane closed, event dropped");
        }
    }
}

async fn drain(
    shared: Arc<Shared>,
    lane: Uuid,
    observer: Arc<dyn FlightObserver>,
    mut rx: mpsc::UnboundedReceiver<FlightEvent>,
) {
    let timeout = shared.config.delivery_timeout();

    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();

        let outcome = match shared.permits.acquire().await {
            Ok(_permit) => match tokio::time::timeout(timeout, deliver(observer.as_ref(), &event)).await {
                Ok(result) => result,
                Err(_) => Err(ObserverError::Timeout(timeout.as_millis() as u64)),
            },
            Err(_) => Err(ObserverError::Other("delivery permits closed".to_string())),
        };

        match outcome {
            Ok(()) => {
                shared.delivered.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_delivery(event.as_str(), true);
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_delivery(event.as_str(), false);
                warn!(
                    lane = %lane,
                    observer = observer.name(),
                    flight = event.flight_id(),
                    event = %event,
                    error = %e,
                    "Observer delivery failed"
                );
            }
        }
        shared.finish_one();

        if terminal {
            break;
        }
    }

    // Nothing should follow the terminal event, but keep the counter honest.
    rx.close();
    while rx.try_recv().is_ok() {
        shared.finish_one();
    }

    shared.open_lanes.fetch_sub(1, Ordering::AcqRel);
    debug!(lane = %lane, observer = observer.name(), "Observer lane closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::observer::ObserverResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Slow {
        seen: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay_ms: u64,
        fail: bool,
    }

    impl Slow {
        async fn record(&self, line: String) -> ObserverResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.seen.lock().unwrap().push(line);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                Err(ObserverError::Rejected("nope".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl FlightObserver for Slow {
        async fn on_assignment(&self, f: &str, _: &str, _: &str, n: usize) -> ObserverResult<()> {
            self.record(format!("assign {f} {n}")).await
        }
        async fn on_position_update(&self, f: &str, _: &str, _: &str, n: usize) -> ObserverResult<()> {
            self.record(format!("move {f} {n}")).await
        }
        async fn on_departure(&self, f: &str, _: &str, _: &str) -> ObserverResult<()> {
            self.record(format!("depart {f}")).await
        }
        async fn on_tracking_ended(&self, f: &str) -> ObserverResult<()> {
            self.record(format!("end {f}")).await
        }
    }

    fn moved(flight: &str, ahead: usize) -> FlightEvent {
        FlightEvent::PositionUpdated {
            flight_id: flight.to_string(),
            destination: "EZE".to_string(),
            runway: "R1".to_string(),
            flights_ahead: ahead,
        }
    }

    #[tokio::test]
    async fn test_lane_preserves_order() {
        let notifier = Notifier::default();
        let observer = Arc::new(Slow::default());
        let lane = notifier.open_lane(observer.clone());

        for ahead in (0..5).rev() {
            lane.push(moved("F1", ahead));
        }
        lane.push(FlightEvent::TrackingEnded {
            flight_id: "F1".to_string(),
        });
        notifier.wait_idle().await;

        let seen = observer.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["move F1 4", "move F1 3", "move F1 2", "move F1 1", "move F1 0", "end F1"]);
        assert_eq!(notifier.stats().delivered, 6);
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let notifier = Notifier::new(NotifierConfig::default().with_max_concurrent_deliveries(2));
        let observer = Arc::new(Slow {
            delay_ms: 20,
            ..Default::default()
        });

        let lanes: Vec<_> = (0..6).map(|_| notifier.open_lane(observer.clone())).collect();
        for (i, lane) in lanes.iter().enumerate() {
            lane.push(moved(&format!("F{i}"), 0));
        }
        notifier.wait_idle().await;

        assert_eq!(observer.seen.lock().unwrap().len(), 6);
        assert!(observer.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let notifier = Notifier::default();
        let observer = Arc::new(Slow {
            fail: true,
            ..Default::default()
        });
        let lane = notifier.open_lane(observer.clone());

        lane.push(moved("F1", 1));
        lane.push(moved("F1", 0));
        notifier.wait_idle().await;

        let stats = notifier.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_slow_observer_times_out() {
        let notifier = Notifier::new(
            NotifierConfig::default().with_delivery_timeout(Duration::from_millis(10)),
        );
        let observer = Arc::new(Slow {
            delay_ms: 200,
            ..Default::default()
        });
        let lane = notifier.open_lane(observer.clone());

        lane.push(moved("F1", 0));
        notifier.wait_idle().await;

        assert_eq!(notifier.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_lane_closes_after_tracking_ended() {
        let notifier = Notifier::default();
        let lane = notifier.open_lane(Arc::new(Slow::default()));
        assert_eq!(notifier.stats().open_lanes, 1);

        lane.push(FlightEvent::TrackingEnded {
            flight_id: "F1".to_string(),
        });
        notifier.wait_idle().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        lane.push(moved("F1", 0));
        assert_eq!(notifier.stats().pending, 0);
        assert_eq!(notifier.stats().open_lanes, 0);
    }

    #[tokio::test]
    async fn test_wait_idle_without_events() {
        let notifier = Notifier::default();
        notifier.wait_idle().await;
        assert_eq!(notifier.stats(), NotifierStats::default());
    }
}
