//! Divisions (grade-range categories), tournament configuration, and partitions.

use crate::models::archer::{Gender, Grade};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a division.
pub type DivisionId = Uuid;

/// A grade-range-based competitor category. Static configuration, loaded
/// once per tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub label: String,
    /// Inclusive grade range used to classify archers.
    pub min_grade: Grade,
    pub max_grade: Grade,
    /// Overrides the tournament-wide gender separation flag when set.
    pub separate_by_gender: Option<bool>,
}

impl Division {
    pub fn new(label: impl Into<String>, min_grade: Grade, max_grade: Grade) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            min_grade,
            max_grade,
            separate_by_gender: None,
        }
    }

    pub fn contains(&self, grade: Grade) -> bool {
        self.min_grade <= grade && grade <= self.max_grade
    }
}

/// Tournament-wide scoring configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Divisions in classification order: an archer belongs to the first
    /// division whose grade range contains their grade.
    pub divisions: Vec<Division>,
    /// Lowest rank number still eligible for a prize. Ties below it are
    /// left unresolved.
    pub award_rank_limit: u32,
    pub arrows_round_1: usize,
    pub arrows_round_2: usize,
    /// Tournament-wide gender separation default.
    pub separate_by_gender: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            divisions: Vec::new(),
            award_rank_limit: 3,
            arrows_round_1: 4,
            arrows_round_2: 4,
            separate_by_gender: false,
        }
    }
}

impl TournamentConfig {
    /// First division whose grade range contains `grade`, or `None` when
    /// the archer is unassigned.
    pub fn division_of(&self, grade: Grade) -> Option<&Division> {
        self.divisions.iter().find(|d| d.contains(grade))
    }

    pub fn division(&self, id: DivisionId) -> Option<&Division> {
        self.divisions.iter().find(|d| d.id == id)
    }

    /// Whether archers in `division` compete separated by gender. Unassigned
    /// archers follow the tournament-wide flag.
    pub fn separates_gender(&self, division: Option<&Division>) -> bool {
        division
            .and_then(|d| d.separate_by_gender)
            .unwrap_or(self.separate_by_gender)
    }
}

/// The unit ranks are unique within: a division, optionally further split
/// by gender. Derived on every evaluation, never persisted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// `None` when the archer's grade matches no configured division.
    pub division: Option<DivisionId>,
    /// `None` when gender separation is off for this division, or the
    /// archer has no recorded gender.
    pub gender: Option<Gender>,
}
