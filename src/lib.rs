//! Kyudo tournament scoring web app: library with models and the ranking engine.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    categorize, final_rankings, merge_partition, partition_standings, rank_slot_choices,
    DistanceEntry, DistanceHeat, EliminationHeat, FinalRow, HeatState, PartitionResult,
    PartitionStandings, RankGroup, Resolution, ResolutionMethod, ScoredArcher,
};
pub use models::{
    Archer, ArcherId, ArrowResult, DistanceOutcome, DistanceRecord, DistanceResults, Division,
    DivisionId, EliminationRecord, EliminationResults, Gender, Grade, Partition, ShootoffResults,
    Tournament, TournamentConfig, TournamentError, TournamentId,
};
pub use store::{HeatStore, MemoryHeatStore, StoreError};
