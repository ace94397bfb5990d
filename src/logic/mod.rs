//! Scoring engine: standings, tie categorization, shoot-offs, and merging.

mod distance;
mod elimination;
mod merge;
mod standings;
mod ties;

pub use distance::{rank_slot_choices, DistanceEntry, DistanceHeat};
pub use elimination::{EliminationHeat, HeatState};
pub use merge::{final_rankings, merge_partition, FinalRow, PartitionResult, ResolutionMethod};
pub use standings::{partition_standings, PartitionStandings, ScoredArcher};
pub use ties::{categorize, RankGroup, Resolution};
