//! Data structures for the tournament: archers, divisions, heat records.

mod archer;
mod division;
mod heat;
mod tournament;

pub use archer::{Archer, ArcherId, ArrowResult, Gender, Grade};
pub use division::{Division, DivisionId, Partition, TournamentConfig};
pub use heat::{
    DistanceOutcome, DistanceRecord, DistanceResults, EliminationRecord, EliminationResults,
    ShootoffResults,
};
pub use tournament::{Tournament, TournamentError, TournamentId};
