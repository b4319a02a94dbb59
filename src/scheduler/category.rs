//! Runway category ordering
//!
//! Categories are ordered `F < E < D < C < B < A`. A runway may serve any
//! flight whose minimum category is at or below the runway's own category.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{SchedulerError, SchedulerResult};

// ============================================================================
// Category
// ============================================================================

/// Service level of a runway, or the minimum level a flight requires
///
/// Variants are declared lowest first so that the derived `Ord` follows
/// the ordinal comparison used for compatibility and tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    F,
    E,
    D,
    C,
    B,
    A,
}

impl Category {
    /// All categories, highest first
    pub fn all() -> Vec<Self> {
        vec![Self::A, Self::B, Self::C, Self::D, Self::E, Self::F]
    }

    /// Single-letter identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }

    /// Parse a category letter (case-insensitive)
    pub fn from_id(id: &str) -> SchedulerResult<Self> {
        match id.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            _ => Err(SchedulerError::invalid_input(
                "category",
                format!(
                    "'{}' is not one of {}",
                    id,
                    Self::all()
                        .iter()
                        .map(|c| c.id())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }

    /// Whether a runway of this category can serve a flight requiring `required`
    pub fn serves(&self, required: Category) -> bool {
        *self >= required
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Category {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}
