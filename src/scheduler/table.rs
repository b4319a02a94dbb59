//! The runway table guarded by the scheduler's runway lock

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::assignment::select_runway;
use super::category::Category;
use super::error::{SchedulerError, SchedulerResult};
use super::flight::Flight;
use super::runway::Runway;

/// Where a flight landed after a successful assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub flight_id: String,
    pub runway: String,
    pub flights_ahead: usize,
}

/// A queued flight located by id
#[derive(Debug, Clone, Copy)]
pub struct QueuedFlight<'a> {
    pub runway: &'a Runway,
    pub flight: &'a Flight,
    pub flights_ahead: usize,
}

/// Result of one runway's share of a departure tick
#[derive(Debug, Clone)]
pub struct RunwayTick {
    pub runway: String,
    pub departed: Flight,

    /// Flights still waiting, head first, as (id, destination)
    pub waiting: Vec<(String, String)>,
}

/// A flight taken off its runway by a rearrange
#[derive(Debug, Clone)]
pub struct DrainedFlight {
    /// Runway the flight was queued on
    pub origin: String,
    pub flight: Flight,
}

/// Runways in creation order plus the set of known flight ids
#[derive(Debug, Default)]
pub struct RunwayTable {
    runways: Vec<Runway>,
    index: HashMap<String, usize>,
    flights: HashSet<String>,
    last_departure: Option<DateTime<Utc>>,
}

impl RunwayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runways in creation order
    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    pub fn get(&self, name: &str) -> Option<&Runway> {
        self.index.get(name).map(|&i| &self.runways[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Runway> {
        let index = *self.index.get(name)?;
        self.runways.get_mut(index)
    }

    /// Look up a runway or fail with `RunwayNotFound`
    pub fn require(&self, name: &str) -> SchedulerResult<&Runway> {
        self.get(name)
            .ok_or_else(|| SchedulerError::runway_not_found(name))
    }

    /// Add a new open runway
    pub fn insert(&mut self, name: &str, category: Category) -> SchedulerResult<()> {
        if self.index.contains_key(name) {
            return Err(SchedulerError::RunwayAlreadyExists {
                name: name.to_string(),
            });
        }

        self.index.insert(name.to_string(), self.runways.len());
        self.runways.push(Runway::new(name, category));
        Ok(())
    }

    /// Whether `flight_id` is queued or has departed
    pub fn knows_flight(&self, flight_id: &str) -> bool {
        self.flights.contains(flight_id)
    }

    /// Forget a flight that left the system without departing
    pub fn forget_flight(&mut self, flight_id: &str) {
        self.flights.remove(flight_id);
    }

    /// Total flights waiting across all runways
    pub fn queued(&self) -> usize {
        self.runways.iter().map(Runway::queue_len).sum()
    }

    /// Put `flight` on the best-fit runway
    ///
    /// Gives the flight back when no runway qualifies.
    pub fn assign(&mut self, flight: Flight) -> Result<Assignment, Flight> {
        let Some(index) = select_runway(&self.runways, flight.category) else {
            return Err(flight);
        };

        let flight_id = flight.id.clone();
        self.flights.insert(flight_id.clone());

        let runway = &mut self.runways[index];
        let flights_ahead = runway.enqueue(flight);
        Ok(Assignment {
            flight_id,
            runway: runway.name().to_string(),
            flights_ahead,
        })
    }

    /// Find a waiting flight
    pub fn locate(&self, flight_id: &str) -> Option<QueuedFlight<'_>> {
        self.runways.iter().find_map(|runway| {
            let flights_ahead = runway.flights_ahead(flight_id)?;
            let flight = runway.find_queued(flight_id)?;
            Some(QueuedFlight {
                runway,
                flight,
                flights_ahead,
            })
        })
    }

    /// Depart the head of every open, non-empty runway
    pub fn tick(&mut self) -> Vec<RunwayTick> {
        let mut ticks = Vec::new();

        for index in 0..self.runways.len() {
            if !self.runways[index].is_open() || self.runways[index].queue_len() == 0 {
                continue;
            }

            let at = self.next_departure_time();
            let runway = &mut self.runways[index];
            let Some(departed) = runway.depart_head(at).cloned() else {
                continue;
            };

            ticks.push(RunwayTick {
                runway: runway.name().to_string(),
                departed,
                waiting: runway
                    .queue()
                    .map(|f| (f.id.clone(), f.destination.clone()))
                    .collect(),
            });
        }

        ticks
    }

    /// Empty every queue, runways in creation order
    pub fn drain_all(&mut self) -> Vec<DrainedFlight> {
        self.runways
            .iter_mut()
            .flat_map(|runway| {
                let origin = runway.name().to_string();
                runway.drain_queue().into_iter().map(move |flight| DrainedFlight {
                    origin: origin.clone(),
                    flight,
                })
            })
            .collect()
    }

    /// Append drained flights back onto the runways they came from
    ///
    /// Flights keep their drain order within each runway. Returns how many
    /// were queued again.
    pub fn restore(&mut self, drained: impl IntoIterator<Item = DrainedFlight>) -> usize {
        let mut restored = 0;
        for DrainedFlight { origin, flight } in drained {
            match self.get_mut(&origin) {
                Some(runway) => {
                    runway.enqueue(flight);
                    restored += 1;
                }
                None => self.forget_flight(&flight.id),
            }
        }
        restored
    }

    /// Strictly increasing departure instants
    fn next_departure_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_departure {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_departure = Some(at);
        at
    }
}
