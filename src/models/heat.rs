//! Saved shoot-off results: elimination and distance heat records.

use crate::models::archer::{ArcherId, ArrowResult};
use crate::models::division::DivisionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result row for one archer in a completed elimination shoot-off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EliminationRecord {
    pub archer_id: ArcherId,
    /// One outcome per round the archer was still shooting.
    pub outcomes: Vec<ArrowResult>,
    /// Final rank. Shared by several archers when one round eliminated them
    /// together and the tie has not yet gone to a distance shoot-off.
    pub rank: u32,
    pub is_winner: bool,
    /// 1-based round the archer was eliminated in; `None` for the winner.
    pub eliminated_at_round: Option<u32>,
    /// Division captured when the heat was saved. This is the join key used
    /// when merging; it is never recomputed from current archer data.
    pub division_id: DivisionId,
}

/// Outcome of a distance shoot-off for one archer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceOutcome {
    /// Placed at this rank (consecutive from the heat's target rank slot).
    Ranked(u32),
    /// Explicitly out without a measurement; receives no numeric rank.
    Defeated,
}

/// Result row for one archer in a completed distance shoot-off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub archer_id: ArcherId,
    /// Rank slot the heat was convened to resolve (lowest rank of the range).
    pub target_rank: u32,
    pub outcome: DistanceOutcome,
    /// Division captured when the heat was saved; never recomputed.
    pub division_id: DivisionId,
}

/// All elimination records for a tournament, with the completion time of
/// the most recent save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminationResults {
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<EliminationRecord>,
}

/// All distance records for a tournament.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceResults {
    pub results: Vec<DistanceRecord>,
}

/// Everything the heat store holds for one tournament.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShootoffResults {
    pub elimination: EliminationResults,
    pub distance: DistanceResults,
}
