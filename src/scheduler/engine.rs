//! The runway scheduler
//!
//! [`RunwayScheduler`] owns the runway table and the callback registry, each
//! behind its own [`RetryLock`]. When an operation needs both, the runway
//! lock is always taken first, and both are held before any state changes,
//! so a lock timeout leaves the tables untouched. Observer events are pushed
//! onto their lanes while the locks are held and delivered afterwards by the
//! [`Notifier`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::category::Category;
use super::error::{SchedulerError, SchedulerResult};
use super::flight::Flight;
use super::lock::{LockPolicy, RetryLock};
use super::query::{project, DepartureFilter, DepartureRecord};
use super::runway::RunwayStatus;
use super::table::{Assignment, DrainedFlight, RunwayTable};
use crate::metrics;
use crate::notifications::{CallbackRegistry, FlightEvent, FlightObserver, Notifier};

// ============================================================================
// Operation results
// ============================================================================

/// Outcome of one departure tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureSummary {
    /// Flights that left, one per runway at most
    pub departed: Vec<String>,

    /// Flights still waiting after the tick
    pub still_queued: usize,
}

/// Outcome of a bulk reassignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RearrangeSummary {
    /// Flights placed on a runway again
    pub assigned: usize,

    /// Flights no runway could take, in drain order
    pub failed: Vec<String>,
}

impl RearrangeSummary {
    /// Number of flights the rearrange drained
    pub fn drained(&self) -> usize {
        self.assigned + self.failed.len()
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Concurrent runway scheduler
///
/// All methods take `&self`; share the scheduler between tasks with an
/// [`Arc`].
///
/// # Example
///
/// ```ignore
/// let scheduler = RunwayScheduler::default();
/// scheduler.create_runway("R1", Category::A).await?;
/// let assignment = scheduler.request_runway("AR1300", "EZE", "Aerolineas", Category::C).await?;
/// assert_eq!(assignment.runway, "R1");
/// ```
#[derive(Debug)]
pub struct RunwayScheduler {
    runways: RetryLock<RunwayTable>,
    callbacks: RetryLock<CallbackRegistry>,
    notifier: Notifier,
}

impl Default for RunwayScheduler {
    fn default() -> Self {
        Self::new(LockPolicy::default(), Notifier::default())
    }
}

impl RunwayScheduler {
    /// Create an empty scheduler
    pub fn new(policy: LockPolicy, notifier: Notifier) -> Self {
        Self {
            runways: RetryLock::new("runway", policy, RunwayTable::new()),
            callbacks: RetryLock::new("callback", policy, CallbackRegistry::new()),
            notifier,
        }
    }

    /// Notifier delivering this scheduler's events
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Acquisition limits shared by both locks
    pub fn lock_policy(&self) -> LockPolicy {
        self.runways.policy()
    }

    // ------------------------------------------------------------------
    // Runway registry
    // ------------------------------------------------------------------

    /// Register a new, open runway
    pub async fn create_runway(&self, name: &str, category: Category) -> SchedulerResult<()> {
        SchedulerError::require("name", name)?;

        let mut table = self.runways.write().await?;
        table.insert(name, category)?;

        info!(runway = %name, category = %category, "Runway created");
        Ok(())
    }

    /// Whether the runway is open
    pub async fn is_runway_open(&self, name: &str) -> SchedulerResult<bool> {
        SchedulerError::require("name", name)?;

        let table = self.runways.read().await?;
        Ok(table.require(name)?.is_open())
    }

    /// Snapshot of one runway
    pub async fn runway_status(&self, name: &str) -> SchedulerResult<RunwayStatus> {
        SchedulerError::require("name", name)?;

        let table = self.runways.read().await?;
        Ok(table.require(name)?.status())
    }

    /// Snapshot of every runway, in creation order
    pub async fn runways(&self) -> SchedulerResult<Vec<RunwayStatus>> {
        let table = self.runways.read().await?;
        Ok(table.runways().iter().map(|r| r.status()).collect())
    }

    /// Open a closed runway
    pub async fn open_runway(&self, name: &str) -> SchedulerResult<()> {
        self.set_runway_open(name, true).await
    }

    /// Close an open runway
    ///
    /// Queued flights stay where they are until reopened or rearranged.
    pub async fn close_runway(&self, name: &str) -> SchedulerResult<()> {
        self.set_runway_open(name, false).await
    }

    async fn set_runway_open(&self, name: &str, open: bool) -> SchedulerResult<()> {
        SchedulerError::require("name", name)?;

        let mut table = self.runways.write().await?;
        let runway = table
            .get_mut(name)
            .ok_or_else(|| SchedulerError::runway_not_found(name))?;

        if runway.is_open() == open {
            let state = if open { "open" } else { "closed" };
            return Err(SchedulerError::invalid_state(
                name,
                format!("runway is already {state}"),
            ));
        }

        runway.set_open(open);
        info!(runway = %name, open, queued = runway.queue_len(), "Runway state changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    /// Queue a new flight on the best-fit runway
    pub async fn request_runway(
        &self,
        flight_id: &str,
        destination: &str,
        airline: &str,
        category: Category,
    ) -> SchedulerResult<Assignment> {
        SchedulerError::require("flight_id", flight_id)?;
        SchedulerError::require("destination", destination)?;
        SchedulerError::require("airline", airline)?;

        let mut table = self.runways.write().await?;
        if table.knows_flight(flight_id) {
            return Err(SchedulerError::FlightAlreadyExists {
                flight_id: flight_id.to_string(),
            });
        }
        let callbacks = self.callbacks.read().await?;

        let flight = Flight::new(flight_id, destination, airline, category);
        let assignment = match table.assign(flight) {
            Ok(assignment) => assignment,
            Err(flight) => {
                metrics::record_rejection(flight.category.id());
                return Err(SchedulerError::NoEligibleRunway {
                    flight_id: flight.id,
                    category: flight.category,
                });
            }
        };
        metrics::record_assignment(&assignment.runway);
        metrics::set_queued(table.queued());
        callbacks.notify(&assigned_event(&assignment, destination));

        info!(
            flight = %flight_id,
            runway = %assignment.runway,
            flights_ahead = assignment.flights_ahead,
            "Flight assigned"
        );
        Ok(assignment)
    }

    // ------------------------------------------------------------------
    // Departures
    // ------------------------------------------------------------------

    /// Run one departure tick across all runways
    ///
    /// Closed and empty runways are skipped without notifications.
    pub async fn issue_departure(&self) -> SchedulerResult<DepartureSummary> {
        let _timer = metrics::start_operation_timer("tick");
        let mut table = self.runways.write().await?;
        let mut callbacks = self.callbacks.write().await?;
        let ticks = table.tick();
        let still_queued = table.queued();

        let mut summary = DepartureSummary {
            departed: Vec::with_capacity(ticks.len()),
            still_queued,
        };

        if ticks.is_empty() {
            debug!("Departure tick with nothing to depart");
            return Ok(summary);
        }

        for tick in ticks {
            let flight = tick.departed;

            callbacks.finish(
                &flight.id,
                &[FlightEvent::Departed {
                    flight_id: flight.id.clone(),
                    destination: flight.destination.clone(),
                    runway: tick.runway.clone(),
                }],
            );

            for (flights_ahead, (flight_id, destination)) in tick.waiting.into_iter().enumerate() {
                debug!(flight = %flight_id, runway = %tick.runway, flights_ahead, "Flight moved up");
                callbacks.notify(&FlightEvent::PositionUpdated {
                    flight_id,
                    destination,
                    runway: tick.runway.clone(),
                    flights_ahead,
                });
            }

            metrics::record_departure(&tick.runway);
            info!(flight = %flight.id, runway = %tick.runway, "Flight departed");
            summary.departed.push(flight.id);
        }
        metrics::set_queued(still_queued);

        info!(
            departed = summary.departed.len(),
            still_queued, "Departure tick complete"
        );
        Ok(summary)
    }

    /// Drain every queue and assign each flight again
    ///
    /// The drain is atomic; each reassignment is its own locked step, so
    /// concurrent requests may interleave with it. If a step cannot get its
    /// locks, the flights not yet reassigned go back to the end of the
    /// runways they were drained from before the error is returned.
    pub async fn rearrange(&self) -> SchedulerResult<RearrangeSummary> {
        let _timer = metrics::start_operation_timer("rearrange");
        let mut pending: VecDeque<DrainedFlight> = {
            let mut table = self.runways.write().await?;
            table.drain_all().into()
        };
        info!(drained = pending.len(), "Rearranging queued flights");

        let mut summary = RearrangeSummary::default();
        loop {
            match self.reassign_next(&mut pending).await {
                Ok(Some(Ok(_))) => summary.assigned += 1,
                Ok(Some(Err(flight_id))) => summary.failed.push(flight_id),
                Ok(None) => break,
                Err(err) => {
                    self.restore_drained(&mut pending).await;
                    return Err(err);
                }
            }
        }

        metrics::record_rearrange(summary.assigned, summary.failed.len());
        info!(
            assigned = summary.assigned,
            failed = summary.failed.len(),
            "Rearrange complete"
        );
        Ok(summary)
    }

    /// Put the next drained flight back, or retire it when nothing qualifies
    ///
    /// The flight is only taken from `pending` once both locks are held.
    async fn reassign_next(
        &self,
        pending: &mut VecDeque<DrainedFlight>,
    ) -> SchedulerResult<Option<Result<Assignment, String>>> {
        if pending.is_empty() {
            return Ok(None);
        }

        let mut table = self.runways.write().await?;
        let mut callbacks = match self.callbacks.write().await {
            Ok(callbacks) => callbacks,
            Err(err) => {
                let restored = table.restore(pending.drain(..));
                metrics::set_queued(table.queued());
                warn!(restored, "Rearrange interrupted, flights returned to their runways");
                return Err(err);
            }
        };

        let Some(DrainedFlight { flight, .. }) = pending.pop_front() else {
            return Ok(None);
        };
        let destination = flight.destination.clone();

        match table.assign(flight) {
            Ok(assignment) => {
                metrics::set_queued(table.queued());
                callbacks.notify(&assigned_event(&assignment, &destination));

                debug!(
                    flight = %assignment.flight_id,
                    runway = %assignment.runway,
                    flights_ahead = assignment.flights_ahead,
                    "Flight reassigned"
                );
                Ok(Some(Ok(assignment)))
            }
            Err(flight) => {
                table.forget_flight(&flight.id);
                metrics::set_queued(table.queued());
                callbacks.finish(&flight.id, &[]);

                warn!(flight = %flight.id, category = %flight.category, "Cannot reassign flight");
                Ok(Some(Err(flight.id)))
            }
        }
    }

    /// Return flights of an interrupted rearrange to their runways
    async fn restore_drained(&self, pending: &mut VecDeque<DrainedFlight>) {
        if pending.is_empty() {
            return;
        }

        match self.runways.write().await {
            Ok(mut table) => {
                let restored = table.restore(pending.drain(..));
                metrics::set_queued(table.queued());
                warn!(restored, "Rearrange interrupted, flights returned to their runways");
            }
            Err(_) => {
                let stranded: Vec<&str> = pending.iter().map(|d| d.flight.id.as_str()).collect();
                error!(?stranded, "Could not return drained flights to their runways");
            }
        }
    }

    // ------------------------------------------------------------------
    // Tracking
    // ------------------------------------------------------------------

    /// Track a queued flight of `airline`
    ///
    /// The observer first receives an `Assigned` event describing the
    /// flight's current position. Returns the subscription id.
    pub async fn subscribe(
        &self,
        flight_id: &str,
        airline: &str,
        observer: Arc<dyn FlightObserver>,
    ) -> SchedulerResult<Uuid> {
        SchedulerError::require("flight_id", flight_id)?;
        SchedulerError::require("airline", airline)?;

        // Holding the runway lock keeps the snapshot current until the lane
        // is registered.
        let table = self.runways.read().await?;
        let queued = table
            .locate(flight_id)
            .filter(|q| q.flight.is_operated_by(airline))
            .ok_or_else(|| SchedulerError::flight_not_found(flight_id, airline))?;

        let mut callbacks = self.callbacks.write().await?;
        let lane = self.notifier.open_lane(observer);
        let subscription = lane.id();
        lane.push(FlightEvent::Assigned {
            flight_id: flight_id.to_string(),
            destination: queued.flight.destination.clone(),
            runway: queued.runway.name().to_string(),
            flights_ahead: queued.flights_ahead,
        });
        callbacks.register(flight_id, lane);

        info!(flight = %flight_id, airline = %airline, subscription = %subscription, "Observer subscribed");
        Ok(subscription)
    }

    /// Number of observers currently tracking `flight_id`
    pub async fn observer_count(&self, flight_id: &str) -> SchedulerResult<usize> {
        let callbacks = self.callbacks.read().await?;
        Ok(callbacks.observer_count(flight_id))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every departure, oldest first
    pub async fn all_departures(&self) -> SchedulerResult<Vec<DepartureRecord>> {
        let table = self.runways.read().await?;
        Ok(project(table.runways(), &DepartureFilter::All))
    }

    /// Departures of one runway, oldest first
    pub async fn runway_departures(&self, name: &str) -> SchedulerResult<Vec<DepartureRecord>> {
        SchedulerError::require("name", name)?;

        let table = self.runways.read().await?;
        let runway = table.require(name)?;
        Ok(project([runway], &DepartureFilter::All))
    }

    /// Departures of one airline, oldest first; unknown airlines yield nothing
    pub async fn airline_departures(&self, airline: &str) -> SchedulerResult<Vec<DepartureRecord>> {
        SchedulerError::require("airline", airline)?;

        let table = self.runways.read().await?;
        Ok(project(
            table.runways(),
            &DepartureFilter::Airline(airline.to_string()),
        ))
    }

    /// Run a departure query selected by `filter`
    pub async fn departures(&self, filter: &DepartureFilter) -> SchedulerResult<Vec<DepartureRecord>> {
        match filter {
            DepartureFilter::All => self.all_departures().await,
            DepartureFilter::Runway(name) => self.runway_departures(name).await,
            DepartureFilter::Airline(airline) => self.airline_departures(airline).await,
        }
    }
}

fn assigned_event(assignment: &Assignment, destination: &str) -> FlightEvent {
    FlightEvent::Assigned {
        flight_id: assignment.flight_id.clone(),
        destination: destination.to_string(),
        runway: assignment.runway.clone(),
        flights_ahead: assignment.flights_ahead,
    }
}
