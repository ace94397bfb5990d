//! Heat store boundary: durable, shared storage for completed shoot-offs.
//!
//! Heats are saved as whole, self-consistent units and replaced by key,
//! never patched field by field; that is what makes concurrent access from
//! independent scoring stations safe without locks. The last successful
//! write for a given (division, heat type, target rank slot) wins.

use crate::models::{
    DistanceRecord, EliminationRecord, ShootoffResults, TournamentId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Persistence failure surfaced to the operator. Retrying is the caller's
/// policy, never done internally.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreError {
    Unavailable,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Heat store is unavailable"),
        }
    }
}

/// Storage for shoot-off results, shared by every scoring station.
///
/// Save operations keep the per-archer invariant in storage: a new
/// elimination save replaces the division's previous elimination results,
/// and a new distance save replaces both the previous records for its
/// (division, target rank slot) and any previous distance record of an
/// archer participating in the new heat.
pub trait HeatStore {
    fn shootoff_results(&self, tournament_id: TournamentId) -> Result<ShootoffResults, StoreError>;

    /// Full replace of the elimination results for the records' division.
    fn save_elimination_heat(
        &self,
        tournament_id: TournamentId,
        records: Vec<EliminationRecord>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Full replace of the distance records for the records' division and
    /// target rank slot.
    fn save_distance_heat(
        &self,
        tournament_id: TournamentId,
        target_rank: u32,
        records: Vec<DistanceRecord>,
    ) -> Result<(), StoreError>;

    /// Irreversibly clear all shoot-off state for the tournament.
    /// Elimination and distance records go together; partial deletion is a
    /// correctness bug.
    fn delete_all_shootoff_results(&self, tournament_id: TournamentId) -> Result<(), StoreError>;
}

/// In-process heat store used by the single-binary server and in tests.
#[derive(Default)]
pub struct MemoryHeatStore {
    results: RwLock<HashMap<TournamentId, ShootoffResults>>,
}

impl MemoryHeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeatStore for MemoryHeatStore {
    fn shootoff_results(&self, tournament_id: TournamentId) -> Result<ShootoffResults, StoreError> {
        let g = self.results.read().map_err(|_| StoreError::Unavailable)?;
        Ok(g.get(&tournament_id).cloned().unwrap_or_default())
    }

    fn save_elimination_heat(
        &self,
        tournament_id: TournamentId,
        records: Vec<EliminationRecord>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut g = self.results.write().map_err(|_| StoreError::Unavailable)?;
        let entry = g.entry(tournament_id).or_default();
        if let Some(division_id) = records.first().map(|r| r.division_id) {
            entry
                .elimination
                .results
                .retain(|r| r.division_id != division_id);
        }
        entry.elimination.results.extend(records);
        entry.elimination.completed_at = Some(completed_at);
        Ok(())
    }

    fn save_distance_heat(
        &self,
        tournament_id: TournamentId,
        target_rank: u32,
        records: Vec<DistanceRecord>,
    ) -> Result<(), StoreError> {
        let mut g = self.results.write().map_err(|_| StoreError::Unavailable)?;
        let entry = g.entry(tournament_id).or_default();
        if let Some(division_id) = records.first().map(|r| r.division_id) {
            let archers: Vec<_> = records.iter().map(|r| r.archer_id).collect();
            entry.distance.results.retain(|r| {
                r.division_id != division_id
                    || (r.target_rank != target_rank && !archers.contains(&r.archer_id))
            });
        }
        entry.distance.results.extend(records);
        Ok(())
    }

    fn delete_all_shootoff_results(&self, tournament_id: TournamentId) -> Result<(), StoreError> {
        let mut g = self.results.write().map_err(|_| StoreError::Unavailable)?;
        g.remove(&tournament_id);
        Ok(())
    }
}
