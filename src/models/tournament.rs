//! Tournament aggregate: configuration, checked-in archers, and errors.

use crate::models::archer::{Archer, ArcherId, ArrowResult, Gender, Grade};
use crate::models::division::{Division, DivisionId, TournamentConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament and heat operations.
#[derive(Clone, Debug, PartialEq)]
pub enum TournamentError {
    /// Archer not found in the checked-in list.
    ArcherNotFound(ArcherId),
    /// An archer with this name already exists (names are unique, case-insensitive).
    DuplicateArcherName,
    /// No division with this id in the tournament configuration.
    DivisionNotFound(DivisionId),
    /// Arrow round must be 1 or 2.
    InvalidRound(u8),
    /// Arrow index past the configured arrows for that round.
    InvalidArrowIndex { round: u8, index: usize },
    /// A shoot-off needs at least two tied archers.
    HeatTooSmall { needed: usize, got: usize },
    /// The same archer was seeded into a heat twice.
    DuplicateParticipant(ArcherId),
    /// The archer is not a participant of this heat.
    NotAParticipant(ArcherId),
    /// Outcome recorded for an archer already eliminated in an earlier round.
    OutcomeForInactiveArcher(ArcherId),
    /// Round number outside the heat's recorded or next round.
    RoundOutOfRange { round: u32 },
    /// Elimination results requested before a single winner was decided.
    HeatUndecided,
    /// Distance results requested while entries are still missing.
    HeatIncomplete { missing: usize },
    /// Distance measurement must be a finite number.
    InvalidMeasurement,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::ArcherNotFound(_) => write!(f, "Archer not found"),
            TournamentError::DuplicateArcherName => {
                write!(f, "An archer with this name already exists")
            }
            TournamentError::DivisionNotFound(_) => write!(f, "Division not found"),
            TournamentError::InvalidRound(round) => {
                write!(f, "Invalid shooting round {} (must be 1 or 2)", round)
            }
            TournamentError::InvalidArrowIndex { round, index } => {
                write!(f, "Arrow index {} is out of range for round {}", index, round)
            }
            TournamentError::HeatTooSmall { needed, got } => {
                write!(f, "A shoot-off needs at least {} archers (got {})", needed, got)
            }
            TournamentError::DuplicateParticipant(_) => {
                write!(f, "The same archer was seeded into the heat twice")
            }
            TournamentError::NotAParticipant(_) => {
                write!(f, "Archer is not a participant of this heat")
            }
            TournamentError::OutcomeForInactiveArcher(_) => {
                write!(f, "Archer was already eliminated before this round")
            }
            TournamentError::RoundOutOfRange { round } => {
                write!(f, "Round {} is not open for outcomes", round)
            }
            TournamentError::HeatUndecided => {
                write!(f, "The shoot-off has not decided a winner yet")
            }
            TournamentError::HeatIncomplete { missing } => {
                write!(f, "{} archer(s) still need a measurement or defeated mark", missing)
            }
            TournamentError::InvalidMeasurement => {
                write!(f, "Measurement must be a finite number")
            }
        }
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// A tournament: its scoring configuration and checked-in archers.
///
/// Shoot-off results are not held here; they live in the shared heat store
/// so that every scoring station sees the same saved heats.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub config: TournamentConfig,
    /// Checked-in archers in check-in order. That order is the stable
    /// tie-break within equal hit counts.
    pub archers: Vec<Archer>,
}

impl Tournament {
    pub fn new(config: TournamentConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            archers: Vec::new(),
        }
    }

    pub fn archer(&self, id: ArcherId) -> Option<&Archer> {
        self.archers.iter().find(|a| a.id == id)
    }

    pub fn archer_mut(&mut self, id: ArcherId) -> Option<&mut Archer> {
        self.archers.iter_mut().find(|a| a.id == id)
    }

    pub fn division(&self, id: DivisionId) -> Option<&Division> {
        self.config.division(id)
    }

    /// Check in an archer. Names must be unique (case-insensitive).
    pub fn add_archer(
        &mut self,
        name: impl Into<String>,
        grade: Grade,
        gender: Option<Gender>,
    ) -> Result<ArcherId, TournamentError> {
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::DuplicateArcherName);
        }
        let is_duplicate = self
            .archers
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicateArcherName);
        }
        let archer = Archer::new(name_trimmed, grade, gender);
        let id = archer.id;
        self.archers.push(archer);
        Ok(id)
    }

    /// Remove a checked-in archer.
    pub fn remove_archer(&mut self, id: ArcherId) -> Result<(), TournamentError> {
        let idx = self
            .archers
            .iter()
            .position(|a| a.id == id)
            .ok_or(TournamentError::ArcherNotFound(id))?;
        self.archers.remove(idx);
        Ok(())
    }

    /// Record one arrow outcome for an archer. `round` is 1 or 2; `index`
    /// is the 0-based arrow within that round. Earlier unset arrows of the
    /// round are padded with `Unknown` so they stay visibly missing.
    pub fn set_arrow(
        &mut self,
        archer_id: ArcherId,
        round: u8,
        index: usize,
        result: ArrowResult,
    ) -> Result<(), TournamentError> {
        let arrows = match round {
            1 => self.config.arrows_round_1,
            2 => self.config.arrows_round_2,
            _ => return Err(TournamentError::InvalidRound(round)),
        };
        if index >= arrows {
            return Err(TournamentError::InvalidArrowIndex { round, index });
        }
        let archer = self
            .archer_mut(archer_id)
            .ok_or(TournamentError::ArcherNotFound(archer_id))?;
        let results = if round == 1 {
            &mut archer.round_1
        } else {
            &mut archer.round_2
        };
        if results.len() <= index {
            results.resize(index + 1, ArrowResult::Unknown);
        }
        results[index] = result;
        Ok(())
    }
}
