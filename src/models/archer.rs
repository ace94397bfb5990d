//! Archer data: grade, gender, and per-arrow results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an archer (used in heats and lookups).
pub type ArcherId = Uuid;

/// Kyudo grade, ordered from unranked (mudan) up to 9th dan.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Mudan,
    Shodan,
    Nidan,
    Sandan,
    Yondan,
    Godan,
    Rokudan,
    Nanadan,
    Hachidan,
    Kudan,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Outcome of a single arrow. `Unknown` means not yet entered; an archer
/// with any unknown arrow has an indeterminate hit count.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowResult {
    Hit,
    Miss,
    #[default]
    Unknown,
}

impl ArrowResult {
    pub fn is_hit(self) -> bool {
        self == ArrowResult::Hit
    }
}

/// A checked-in archer. The per-arrow result vectors are filled in as the
/// shooting rounds progress; hit counts are always recomputed from them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Archer {
    pub id: ArcherId,
    pub name: String,
    pub grade: Grade,
    pub gender: Option<Gender>,
    /// Arrow results for the first shooting round, in shooting order.
    pub round_1: Vec<ArrowResult>,
    /// Arrow results for the second shooting round, in shooting order.
    pub round_2: Vec<ArrowResult>,
}

impl Archer {
    /// Create a new archer with empty result sheets.
    pub fn new(name: impl Into<String>, grade: Grade, gender: Option<Gender>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            grade,
            gender,
            round_1: Vec::new(),
            round_2: Vec::new(),
        }
    }

    /// Hits across both rounds, capped by the configured arrows per round.
    pub fn hit_count(&self, arrows_round_1: usize, arrows_round_2: usize) -> u32 {
        let r1 = self.round_1.iter().take(arrows_round_1);
        let r2 = self.round_2.iter().take(arrows_round_2);
        r1.chain(r2).filter(|a| a.is_hit()).count() as u32
    }

    /// True when every configured arrow of both rounds has a known outcome.
    /// Until then the hit count is indeterminate and may still change.
    pub fn has_complete_results(&self, arrows_round_1: usize, arrows_round_2: usize) -> bool {
        round_complete(&self.round_1, arrows_round_1) && round_complete(&self.round_2, arrows_round_2)
    }
}

fn round_complete(results: &[ArrowResult], arrows: usize) -> bool {
    results.len() >= arrows && results[..arrows].iter().all(|a| *a != ArrowResult::Unknown)
}
