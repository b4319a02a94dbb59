//! Subscriptions keyed by flight

use std::collections::HashMap;

use super::dispatcher::ObserverLane;
use super::FlightEvent;

/// Which lanes listen to which flight
///
/// Guarded by the scheduler's registry lock. Pushing to a lane never blocks,
/// so every method here is cheap to call under that lock.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    lanes: HashMap<String, Vec<ObserverLane>>,
}

impl CallbackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `lane` to `flight_id`
    pub fn register(&mut self, flight_id: &str, lane: ObserverLane) {
        self.lanes.entry(flight_id.to_string()).or_default().push(lane);
    }

    /// Push `event` to every observer of its flight
    pub fn notify(&self, event: &FlightEvent) {
        if let Some(lanes) = self.lanes.get(event.flight_id()) {
            for lane in lanes {
                lane.push(event.clone());
            }
        }
    }

    /// Push the final `events` of a flight and forget its observers
    pub fn finish(&mut self, flight_id: &str, events: &[FlightEvent]) -> usize {
        let Some(lanes) = self.lanes.remove(flight_id) else {
            return 0;
        };

        for lane in &lanes {
            for event in events {
                lane.push(event.clone());
            }
            lane.push(FlightEvent::TrackingEnded {
                flight_id: flight_id.to_string(),
            });
        }
        lanes.len()
    }

    /// Number of observers on `flight_id`
    pub fn observer_count(&self, flight_id: &str) -> usize {
        self.lanes.get(flight_id).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{EventStreamObserver, Notifier};
    use std::sync::Arc;

    fn departed(flight: &str) -> FlightEvent {
        FlightEvent::Departed {
            flight_id: flight.to_string(),
            destination: "EZE".to_string(),
            runway: "R1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_finish_sends_tracking_ended_last() {
        let notifier = Notifier::default();
        let (observer, mut rx) = EventStreamObserver::channel("AA");
        let mut registry = CallbackRegistry::new();

        registry.register("F1", notifier.open_lane(Arc::new(observer)));
        assert_eq!(registry.observer_count("F1"), 1);

        assert_eq!(registry.finish("F1", &[departed("F1")]), 1);
        assert_eq!(registry.observer_count("F1"), 0);
        notifier.wait_idle().await;

        assert_eq!(rx.recv().await.unwrap(), departed("F1"));
        assert!(rx.recv().await.unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_notify_only_reaches_the_flight() {
        let notifier = Notifier::default();
        let (first, mut first_rx) = EventStreamObserver::channel("AA");
        let (second, mut second_rx) = EventStreamObserver::channel("BB");
        let mut registry = CallbackRegistry::new();

        registry.register("F1", notifier.open_lane(Arc::new(first)));
        registry.register("F2", notifier.open_lane(Arc::new(second)));
        assert_eq!(registry.observer_count("F1"), 1);
        assert_eq!(registry.observer_count("F2"), 1);

        registry.notify(&departed("F1"));
        notifier.wait_idle().await;

        assert_eq!(first_rx.recv().await.unwrap(), departed("F1"));
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn test_finish_untracked_flight() {
        let mut registry = CallbackRegistry::new();
        assert_eq!(registry.finish("F9", &[]), 0);
        assert_eq!(registry.observer_count("F9"), 0);
    }
}
