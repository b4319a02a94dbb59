//! Read-only projections over departure history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flight::Flight;
use super::runway::Runway;

/// One departed flight, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureRecord {
    /// Ticks the flight waited in its queue
    pub flights_before_departure: u64,
    pub runway: String,
    pub flight_id: String,
    pub destination: String,
    pub airline: String,
    pub departed_at: DateTime<Utc>,
}

impl DepartureRecord {
    fn from_history(runway: &Runway, flight: &Flight) -> Option<Self> {
        Some(Self {
            flights_before_departure: flight.flights_before_departure,
            runway: runway.name().to_string(),
            flight_id: flight.id.clone(),
            destination: flight.destination.clone(),
            airline: flight.airline.clone(),
            departed_at: flight.departed_at?,
        })
    }
}

/// Which slice of the history a query covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DepartureFilter {
    #[default]
    All,
    Runway(String),
    Airline(String),
}

impl DepartureFilter {
    fn keeps(&self, runway: &Runway, flight: &Flight) -> bool {
        match self {
            Self::All => true,
            Self::Runway(name) => runway.name() == name,
            Self::Airline(airline) => flight.is_operated_by(airline),
        }
    }
}

/// Project the histories of `runways`, sorted by departure time ascending
pub fn project<'a>(
    runways: impl IntoIterator<Item = &'a Runway>,
    filter: &DepartureFilter,
) -> Vec<DepartureRecord> {
    let mut records: Vec<DepartureRecord> = runways
        .into_iter()
        .flat_map(|runway| {
            runway
                .history()
                .iter()
                .filter(move |flight| filter.keeps(runway, flight))
                .filter_map(move |flight| DepartureRecord::from_history(runway, flight))
        })
        .collect();

    records.sort_by_key(|record| record.departed_at);
    records
}
