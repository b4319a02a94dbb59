//! Observer contract for flight tracking

use async_trait::async_trait;

use super::FlightEvent;

/// Result type for observer callbacks
pub type ObserverResult<T> = Result<T, ObserverError>;

/// Errors an observer can report back to the dispatcher
///
/// None of these reach the scheduler's callers; they are logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The remote side went away
    #[error("Observer disconnected: {0}")]
    Disconnected(String),

    /// The observer refused the event
    #[error("Observer rejected event: {0}")]
    Rejected(String),

    /// Delivery did not finish in time
    #[error("Delivery timed out after {0} ms")]
    Timeout(u64),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("Observer error: {0}")]
    Other(String),
}

/// Receiver of one flight's lifecycle events
///
/// Implement this trait to track flights. Callbacks are invoked from the
/// notifier's delivery tasks, never while scheduler locks are held.
#[async_trait]
pub trait FlightObserver: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        "observer"
    }

    /// The flight was assigned to a runway queue
    async fn on_assignment(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()>;

    /// The flight moved up in its queue
    async fn on_position_update(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()>;

    /// The flight departed
    async fn on_departure(&self, flight_id: &str, destination: &str, runway: &str)
        -> ObserverResult<()>;

    /// No more events will be sent for this flight
    async fn on_tracking_ended(&self, flight_id: &str) -> ObserverResult<()>;
}

/// Route an event to the matching callback
pub async fn deliver(observer: &dyn FlightObserver, event: &FlightEvent) -> ObserverResult<()> {
    match event {
        FlightEvent::Assigned {
            flight_id,
            destination,
            runway,
            flights_ahead,
        } => {
            observer
                .on_assignment(flight_id, destination, runway, *flights_ahead)
                .await
        }
        FlightEvent::PositionUpdated {
            flight_id,
            destination,
            runway,
            flights_ahead,
        } => {
            observer
                .on_position_update(flight_id, destination, runway, *flights_ahead)
                .await
        }
        FlightEvent::Departed {
            flight_id,
            destination,
            runway,
        } => observer.on_departure(flight_id, destination, runway).await,
        FlightEvent::TrackingEnded { flight_id } => observer.on_tracking_ended(flight_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    #[async_trait]
    impl FlightObserver for Calls {
        async fn on_assignment(&self, f: &str, _: &str, r: &str, ahead: usize) -> ObserverResult<()> {
            self.0.lock().unwrap().push(format!("assign {f} {r} {ahead}"));
            Ok(())
        }

        async fn on_position_update(&self, f: &str, _: &str, _: &str, ahead: usize) -> ObserverResult<()> {
            self.0.lock().unwrap().push(format!("move {f} {ahead}"));
            Ok(())
        }

        async fn on_departure(&self, f: &str, _: &str, r: &str) -> ObserverResult<()> {
            self.0.lock().unwrap().push(format!("depart {f} {r}"));
            Ok(())
        }

        async fn on_tracking_ended(&self, f: &str) -> ObserverResult<()> {
            self.0.lock().unwrap().push(format!("end {f}"));
            Err(ObserverError::Rejected("already gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_deliver_routes_events() {
        let calls = Calls::default();

        deliver(
            &calls,
            &FlightEvent::Assigned {
                flight_id: "F1".into(),
                destination: "EZE".into(),
                runway: "R1".into(),
                flights_ahead: 3,
            },
        )
        .await
        .unwrap();
        deliver(
            &calls,
            &FlightEvent::Departed {
                flight_id: "F1".into(),
                destination: "EZE".into(),
                runway: "R1".into(),
            },
        )
        .await
        .unwrap();
        let ended = deliver(&calls, &FlightEvent::TrackingEnded { flight_id: "F1".into() }).await;

        assert!(matches!(ended, Err(ObserverError::Rejected(_))));
        assert_eq!(
            *calls.0.lock().unwrap(),
            vec!["assign F1 R1 3", "depart F1 R1", "end F1"]
        );
        assert_eq!(calls.name(), "observer");
    }
}
