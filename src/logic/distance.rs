//! Distance shoot-off (enkin): tie-break by closeness measurement, used for
//! contested award ranks other than first place.

use crate::models::{
    ArcherId, DistanceOutcome, DistanceRecord, DivisionId, TournamentError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One archer's entry in a distance shoot-off.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceEntry {
    /// Distance from the target center; lower is better.
    Measurement(f64),
    /// Out without a measurement (withdrew or was shot off earlier).
    Defeated,
}

/// A distance shoot-off for one tied group, convened to resolve the rank
/// slots starting at `target_rank`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceHeat {
    division_id: DivisionId,
    target_rank: u32,
    /// The tied group, in standings order.
    participants: Vec<ArcherId>,
    entries: HashMap<ArcherId, DistanceEntry>,
}

impl DistanceHeat {
    pub fn new(
        division_id: DivisionId,
        target_rank: u32,
        participants: Vec<ArcherId>,
    ) -> Result<Self, TournamentError> {
        if participants.len() < 2 {
            return Err(TournamentError::HeatTooSmall {
                needed: 2,
                got: participants.len(),
            });
        }
        for (i, id) in participants.iter().enumerate() {
            if participants[..i].contains(id) {
                return Err(TournamentError::DuplicateParticipant(*id));
            }
        }
        Ok(Self {
            division_id,
            target_rank,
            participants,
            entries: HashMap::new(),
        })
    }

    pub fn division_id(&self) -> DivisionId {
        self.division_id
    }

    pub fn target_rank(&self) -> u32 {
        self.target_rank
    }

    pub fn participants(&self) -> &[ArcherId] {
        &self.participants
    }

    /// Record a measurement for an archer. Re-entering overwrites.
    pub fn record_measurement(
        &mut self,
        archer_id: ArcherId,
        measurement: f64,
    ) -> Result<(), TournamentError> {
        if !self.participants.contains(&archer_id) {
            return Err(TournamentError::NotAParticipant(archer_id));
        }
        if !measurement.is_finite() {
            return Err(TournamentError::InvalidMeasurement);
        }
        self.entries
            .insert(archer_id, DistanceEntry::Measurement(measurement));
        Ok(())
    }

    /// Mark an archer defeated: out of the heat with no numeric rank.
    pub fn record_defeated(&mut self, archer_id: ArcherId) -> Result<(), TournamentError> {
        if !self.participants.contains(&archer_id) {
            return Err(TournamentError::NotAParticipant(archer_id));
        }
        self.entries.insert(archer_id, DistanceEntry::Defeated);
        Ok(())
    }

    /// A heat is complete once every participant has a measurement or a
    /// defeated mark.
    pub fn is_complete(&self) -> bool {
        self.participants
            .iter()
            .all(|id| self.entries.contains_key(id))
    }

    /// One record per participant: non-defeated archers sorted ascending by
    /// measurement get consecutive ranks from the target slot; defeated
    /// archers get no numeric rank. Only available once complete.
    pub fn records(&self) -> Result<Vec<DistanceRecord>, TournamentError> {
        let missing = self
            .participants
            .iter()
            .filter(|id| !self.entries.contains_key(*id))
            .count();
        if missing > 0 {
            return Err(TournamentError::HeatIncomplete { missing });
        }

        let mut measured: Vec<(ArcherId, f64)> = self
            .participants
            .iter()
            .filter_map(|id| match self.entries[id] {
                DistanceEntry::Measurement(m) => Some((*id, m)),
                DistanceEntry::Defeated => None,
            })
            .collect();
        // Stable: equal measurements keep standings order.
        measured.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut rank_of: HashMap<ArcherId, u32> = HashMap::new();
        for (i, (id, _)) in measured.iter().enumerate() {
            rank_of.insert(*id, self.target_rank + i as u32);
        }

        Ok(self
            .participants
            .iter()
            .map(|&archer_id| DistanceRecord {
                archer_id,
                target_rank: self.target_rank,
                outcome: match rank_of.get(&archer_id) {
                    Some(rank) => DistanceOutcome::Ranked(*rank),
                    None => DistanceOutcome::Defeated,
                },
                division_id: self.division_id,
            })
            .collect())
    }
}

/// Rank-slot choices offered to the operator recording a distance heat for
/// `group_size` archers at `target_rank`. When the group fits inside the
/// award range this is one contiguous block; when it straddles the cutoff,
/// the in-range slots are extended past the limit so a full ordering can
/// still be recorded.
pub fn rank_slot_choices(target_rank: u32, group_size: usize, award_rank_limit: u32) -> Vec<u32> {
    let last = target_rank + group_size.saturating_sub(1) as u32;
    let mut slots: Vec<u32> = (target_rank..=last.min(award_rank_limit)).collect();
    slots.extend((award_rank_limit + 1).max(target_rank)..=last);
    slots
}
