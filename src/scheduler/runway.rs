//! Runway records: a FIFO departure queue plus departure history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::category::Category;
use super::flight::Flight;

/// Point-in-time view of a runway, safe to hand out after the lock is released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayStatus {
    pub name: String,
    pub category: Category,
    pub open: bool,
    pub queued: usize,
    pub departed: usize,
}

/// A named runway
///
/// Name and category are fixed at creation. The queue order defines each
/// waiting flight's position; the history only grows.
#[derive(Debug, Clone)]
pub struct Runway {
    name: String,
    category: Category,
    open: bool,
    queue: VecDeque<Flight>,
    history: Vec<Flight>,
}

impl Runway {
    /// Create an open runway with an empty queue and history
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            open: true,
            queue: VecDeque::new(),
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Number of flights waiting
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Waiting flights, head first
    pub fn queue(&self) -> impl Iterator<Item = &Flight> {
        self.queue.iter()
    }

    /// Departed flights, in departure order
    pub fn history(&self) -> &[Flight] {
        &self.history
    }

    /// Whether this runway can take `flight` right now
    pub fn accepts(&self, category: Category) -> bool {
        self.open && self.category.serves(category)
    }

    /// Append a flight to the tail; returns its flights-ahead count
    pub fn enqueue(&mut self, flight: Flight) -> usize {
        self.queue.push_back(flight);
        self.queue.len() - 1
    }

    /// Number of flights strictly before `flight_id`, if it is queued here
    pub fn flights_ahead(&self, flight_id: &str) -> Option<usize> {
        self.queue.iter().position(|f| f.id == flight_id)
    }

    /// Find a queued flight by id
    pub fn find_queued(&self, flight_id: &str) -> Option<&Flight> {
        self.queue.iter().find(|f| f.id == flight_id)
    }

    /// Release the head flight into the history
    ///
    /// Closed or empty runways do nothing. The flights still waiting each
    /// observe one tick.
    pub fn depart_head(&mut self, at: DateTime<Utc>) -> Option<&Flight> {
        if !self.open {
            return None;
        }

        let mut flight = self.queue.pop_front()?;
        flight.depart(at);
        self.history.push(flight);

        for waiting in self.queue.iter_mut() {
            waiting.observe_tick();
        }

        self.history.last()
    }

    /// Empty the queue, preserving FIFO order
    pub fn drain_queue(&mut self) -> Vec<Flight> {
        self.queue.drain(..).collect()
    }

    /// Snapshot for reporting
    pub fn status(&self) -> RunwayStatus {
        RunwayStatus {
            name: self.name.clone(),
            category: self.category,
            open: self.open,
            queued: self.queue.len(),
            departed: self.history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(id: &str) -> Flight {
        Flight::new(id, "EZE", "Aerolineas", Category::D)
    }

    #[test]
    fn test_new_runway_is_open_and_empty() {
        let runway = Runway::new("R1", Category::A);
        assert!(runway.is_open());
        assert_eq!(runway.queue_len(), 0);
        assert!(runway.history().is_empty());
    }

    #[test]
    fn test_enqueue_positions() {
        let mut runway = Runway::new("R1", Category::A);
        assert_eq!(runway.enqueue(flight("F1")), 0);
        assert_eq!(runway.enqueue(flight("F2")), 1);
        assert_eq!(runway.flights_ahead("F2"), Some(1));
        assert_eq!(runway.flights_ahead("F9"), None);
    }

    #[test]
    fn test_accepts() {
        let mut runway = Runway::new("R1", Category::C);
        assert!(runway.accepts(Category::D));
        assert!(runway.accepts(Category::C));
        assert!(!runway.accepts(Category::B));

        runway.set_open(false);
        assert!(!runway.accepts(Category::D));
    }

    #[test]
    fn test_depart_head_ticks_remaining() {
        let mut runway = Runway::new("R1", Category::A);
        runway.enqueue(flight("F1"));
        runway.enqueue(flight("F2"));
        runway.enqueue(flight("F3"));

        let departed = runway.depart_head(Utc::now()).unwrap();
        assert_eq!(departed.id, "F1");
        assert!(departed.has_departed());

        assert_eq!(runway.flights_ahead("F2"), Some(0));
        assert!(runway.queue().all(|f| f.flights_before_departure == 1));
        assert_eq!(runway.history().len(), 1);
    }

    #[test]
    fn test_closed_runway_does_not_depart() {
        let mut runway = Runway::new("R1", Category::A);
        runway.enqueue(flight("F1"));
        runway.set_open(false);

        assert!(runway.depart_head(Utc::now()).is_none());
        assert_eq!(runway.queue_len(), 1);
        assert_eq!(runway.queue().next().unwrap().flights_before_departure, 0);
    }

    #[test]
    fn test_drain_preserves_order() {
        let mut runway = Runway::new("R1", Category::A);
        runway.enqueue(flight("F1"));
        runway.enqueue(flight("F2"));

        let drained = runway.drain_queue();
        let ids: Vec<_> = drained.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2"]);
        assert_eq!(runway.queue_len(), 0);
    }
}
