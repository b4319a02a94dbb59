//! Common test utilities

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tarmac::notifications::{FlightEvent, FlightObserver, ObserverError, ObserverResult};
use tarmac::scheduler::{Category, RunwayScheduler};

/// Observer that keeps every event it receives, in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FlightEvent>>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Events received so far
    pub fn events(&self) -> Vec<FlightEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Event type names received so far
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(FlightEvent::as_str).collect()
    }

    fn record(&self, event: FlightEvent) -> ObserverResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl FlightObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    async fn on_assignment(
        &self,
        flight_id: &str,
        destination: &str,
        runway: &str,
        flights_ahead: usize,
    ) -> ObserverResult<()> {
        self.record(FlightEvent::Assigned {
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
        self.record(FlightEvent::PositionUpdated {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
            flights_ahead,
        })
    }

    async fn on_departure(&self, flight_id: &str, destination: &str, runway: &str) -> ObserverResult<()> {
        self.record(FlightEvent::Departed {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            runway: runway.to_string(),
        })
    }

    async fn on_tracking_ended(&self, flight_id: &str) -> ObserverResult<()> {
        self.record(FlightEvent::TrackingEnded {
            flight_id: flight_id.to_string(),
        })
    }
}

/// Observer that fails every callback
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FailingObserver;

#[async_trait]
impl FlightObserver for FailingObserver {
    async fn on_assignment(&self, _: &str, _: &str, _: &str, _: usize) -> ObserverResult<()> {
        Err(ObserverError::Rejected("always fails".to_string()))
    }

    async fn on_position_update(&self, _: &str, _: &str, _: &str, _: usize) -> ObserverResult<()> {
        Err(ObserverError::Rejected("always fails".to_string()))
    }

    async fn on_departure(&self, _: &str, _: &str, _: &str) -> ObserverResult<()> {
        Err(ObserverError::Rejected("always fails".to_string()))
    }

    async fn on_tracking_ended(&self, _: &str) -> ObserverResult<()> {
        Err(ObserverError::Rejected("always fails".to_string()))
    }
}

/// Observer that sleeps before every callback
#[allow(dead_code)]
#[derive(Debug)]
pub struct SlowObserver {
    pub delay: Duration,
}

#[async_trait]
impl FlightObserver for SlowObserver {
    async fn on_assignment(&self, _: &str, _: &str, _: &str, _: usize) -> ObserverResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn on_position_update(&self, _: &str, _: &str, _: &str, _: usize) -> ObserverResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn on_departure(&self, _: &str, _: &str, _: &str) -> ObserverResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn on_tracking_ended(&self, _: &str) -> ObserverResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Scheduler holding the given runways, all open
#[allow(dead_code)]
pub async fn scheduler_with(runways: &[(&str, Category)]) -> RunwayScheduler {
    let scheduler = RunwayScheduler::default();
    for (name, category) in runways {
        scheduler.create_runway(name, *category).await.unwrap();
    }
    scheduler
}

/// Request a flight of airline "AL1" to "EZE"
#[allow(dead_code)]
pub async fn request(scheduler: &RunwayScheduler, flight_id: &str, category: Category) -> String {
    scheduler
        .request_runway(flight_id, "EZE", "AL1", category)
        .await
        .unwrap()
        .runway
}
