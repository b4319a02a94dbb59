//! Built-in observers

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use super::observer::{FlightObserver, ObserverError, ObserverResult};
use super::FlightEvent;

// ============================================================================
// Logging
// ============================================================================

/// Writes every event as a log line
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    label: Option<String>,
}

impl LoggingObserver {
    /// Create a logging observer with a label (usually the airline)
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    fn log(&self, event: FlightEvent) -> ObserverResult<()> {
        info!(
            observer = self.label.as_deref().unwrap_or("-"),
            flight = event.flight_id(),
            event = %event,
            "{}",
            event.describe()
        );
        Ok(())
    }
}

#[async_trait]
impl FlightObserver for LoggingObserver {
    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("logging")
    }

    async fn on_assignment(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()> {
        self.log(FlightEvent::Assigned {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
            flights_ahead,
        })
    }

    async fn on_position_update(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()> {
        self.log(FlightEvent::PositionUpdated {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
            flights_ahead,
        })
    }

    async fn on_departure(&self, flight_id: &str, destination: &str, runway: &str) -> ObserverResult<()> {
        self.log(FlightEvent::Departed {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
        })
    }

    async fn on_tracking_ended(&self, flight_id: &str) -> ObserverResult<()> {
        self.log(FlightEvent::TrackingEnded {
            flight_id: flight_id.to_string(),
        })
    }
}

// ============================================================================
// Event stream
// ============================================================================

/// Forwards events into a channel, for streaming them to a remote client
///
/// Once the receiving side is dropped every callback fails with
/// [`ObserverError::Disconnected`].
#[derive(Debug, Clone)]
pub struct EventStreamObserver {
    name: String,
    tx: mpsc::UnboundedSender<FlightEvent>,
}

impl EventStreamObserver {
    /// Create the observer together with the stream it feeds
    pub fn channel(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<FlightEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }

    fn forward(&self, event: FlightEvent) -> ObserverResult<()> {
        self.tx
            .send(event)
            .map_err(|_| ObserverError::Disconnected(format!("{} stream closed", self.name)))
    }
}

#[async_trait]
impl FlightObserver for EventStreamObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_assignment(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()> {
        self.forward(FlightEvent::Assigned {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
            flights_ahead,
        })
    }

    async fn on_position_update(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()> {
        self.forward(FlightEvent::PositionUpdated {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
            flights_ahead,
        })
    }

    async fn on_departure(&self, flight_id: &str, destination: &str, runway: &str) -> ObserverResult<()> {
        self.forward(FlightEvent::Departed {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
        })
    }

    async fn on_tracking_ended(&self, flight_id: &str) -> ObserverResult<()> {
        self.forward(FlightEvent::TrackingEnded {
            flight_id: flight_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_forwards_in_order() {
        let (observer, mut rx) = EventStreamObserver::channel("AA");

        observer.on_assignment("F1", "EZE", "R1", 1).await.unwrap();
        observer.on_departure("F1", "EZE", "R1").await.unwrap();
        observer.on_tracking_ended("F1").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().as_str(), "assigned");
        assert_eq!(rx.recv().await.unwrap().as_str(), "departed");
        assert!(rx.recv().await.unwrap().is_terminal());
        assert_eq!(observer.name(), "AA");
    }

    #[tokio::test]
    async fn test_stream_reports_disconnect() {
        let (observer, rx) = EventStreamObserver::channel("AA");
        drop(rx);

        let err = observer.on_tracking_ended("F1").await.unwrap_err();
        assert!(matches!(err, ObserverError::Disconnected(_)));
    }

    #[tokio::test]
    async fn test_logging_never_fails() {
        let observer = LoggingObserver::new("AA");
        assert!(observer.on_position_update("F1", "EZE", "R1", 0).await.is_ok());
        assert_eq!(observer.name(), "AA");
        assert_eq!(LoggingObserver::default().name(), "logging");
    }
}
