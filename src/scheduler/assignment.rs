//! Best-fit runway selection
//!
//! Among the open runways whose category is at least the requested one,
//! pick the shortest queue. Ties go to the lower category, then to the
//! lexicographically smaller name.

use super::category::Category;
use super::runway::Runway;

/// Ordering key for a candidate runway; smaller wins
fn fit_key(runway: &Runway) -> (usize, Category, &str) {
    (runway.queue_len(), runway.category(), runway.name())
}

/// Index of the runway a flight of `category` should join, if any qualifies
pub fn select_runway(runways: &[Runway], category: Category) -> Option<usize> {
    runways
        .iter()
        .enumerate()
        .filter(|(_, runway)| runway.accepts(category))
        .min_by(|(_, a), (_, b)| fit_key(a).cmp(&fit_key(b)))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::flight::Flight;
    use proptest::prelude::*;

    fn runway_with_queue(name: &str, category: Category, queued: usize) -> Runway {
        let mut runway = Runway::new(name, category);
        for i in 0..queued {
            runway.enqueue(Flight::new(format!("{name}-{i}"), "EZE", "AA", Category::F));
        }
        runway
    }

    fn selected<'a>(runways: &'a [Runway], category: Category) -> Option<&'a str> {
        select_runway(runways, category).map(|i| runways[i].name())
    }

    #[test]
    fn test_no_runways() {
        assert_eq!(select_runway(&[], Category::F), None);
    }

    #[test]
    fn test_shortest_queue_wins() {
        let runways = vec![
            runway_with_queue("R1", Category::A, 3),
            runway_with_queue("R2", Category::A, 1),
            runway_with_queue("R3", Category::A, 2),
        ];
        assert_eq!(selected(&runways, Category::A), Some("R2"));
    }

    #[test]
    fn test_tie_prefers_lower_category() {
        let runways = vec![
            runway_with_queue("R1", Category::A, 1),
            runway_with_queue("R2", Category::C, 1),
            runway_with_queue("R3", Category::B, 1),
        ];
        assert_eq!(selected(&runways, Category::D), Some("R2"));
    }

    #[test]
    fn test_tie_then_prefers_name() {
        let runways = vec![
            runway_with_queue("Z", Category::B, 0),
            runway_with_queue("M", Category::B, 0),
            runway_with_queue("N", Category::B, 0),
        ];
        assert_eq!(selected(&runways, Category::B), Some("M"));
    }

    #[test]
    fn test_closed_and_low_category_are_skipped() {
        let mut closed = runway_with_queue("R1", Category::A, 0);
        closed.set_open(false);
        let runways = vec![
            closed,
            runway_with_queue("R2", Category::C, 0),
            runway_with_queue("R3", Category::A, 5),
        ];
        assert_eq!(selected(&runways, Category::B), Some("R3"));
        assert_eq!(selected(&runways, Category::A), Some("R3"));
    }

    #[test]
    fn test_nothing_qualifies() {
        let runways = vec![runway_with_queue("R1", Category::D, 0)];
        assert_eq!(selected(&runways, Category::C), None);
    }

    fn any_category() -> impl Strategy<Value = Category> {
        (0usize..6).prop_map(|i| Category::all()[i])
    }

    proptest! {
        #[test]
        fn prop_selection_is_eligible_and_minimal(
            specs in prop::collection::vec((any_category(), 0usize..6, any::<bool>()), 0..8),
            wanted in any_category(),
        ) {
            let runways: Vec<Runway> = specs
                .iter()
                .enumerate()
                .map(|(i, (category, queued, open))| {
                    let mut runway = runway_with_queue(&format!("R{i}"), *category, *queued);
                    runway.set_open(*open);
                    runway
                })
                .collect();

            match select_runway(&runways, wanted) {
                Some(index) => {
                    let chosen = &runways[index];
                    prop_assert!(chosen.is_open());
                    prop_assert!(chosen.category() >= wanted);
                    for other in runways.iter().filter(|r| r.accepts(wanted)) {
                        prop_assert!(fit_key(chosen) <= fit_key(other));
                    }
                }
                None => {
                    prop_assert!(runways.iter().all(|r| !r.accepts(wanted)));
                }
            }
        }
    }
}
