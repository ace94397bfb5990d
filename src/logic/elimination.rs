//! Elimination shoot-off (shichuma): sequential single-arrow sudden death,
//! reserved for resolving a tie for first place.

use crate::models::{ArcherId, ArrowResult, DivisionId, EliminationRecord, TournamentError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived state of an elimination shoot-off.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatState {
    /// Waiting for outcomes in the given 1-based round.
    RoundInProgress(u32),
    /// A single winner remains and every eliminated rank is distinct.
    WinnerDecided,
    /// A single winner remains, but at least one round eliminated several
    /// archers together; those groups still need a distance shoot-off.
    AwaitingDistanceHeat,
}

/// An elimination shoot-off in progress.
///
/// The per-round outcome table is the only authoritative state: corrections
/// overwrite a round's entries in place and everything derived (active set,
/// eliminations, ranks) is rebuilt by replaying the rounds from the start.
/// Entries left behind in later rounds by a correction are stale and are
/// ignored by the replay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EliminationHeat {
    division_id: DivisionId,
    /// The tied group, in standings order.
    participants: Vec<ArcherId>,
    /// Outcomes per 1-based round.
    rounds: Vec<HashMap<ArcherId, ArrowResult>>,
}

/// Replayed view of the heat: who is still shooting and who fell when.
struct Replay {
    active: Vec<ArcherId>,
    /// (archer, 1-based round eliminated in), in elimination order.
    eliminated: Vec<(ArcherId, u32)>,
    rounds_completed: u32,
}

impl Replay {
    fn decided(&self) -> bool {
        self.active.len() == 1
    }
}

impl EliminationHeat {
    /// Seed a heat with the tied group (at least two archers, no duplicates).
    pub fn new(
        division_id: DivisionId,
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
            participants,
            rounds: Vec::new(),
        })
    }

    /// Rebuild a heat from a full outcome table, validating every entry the
    /// same way live entry would. Used when a client submits a finished
    /// heat in one piece.
    pub fn from_rounds(
        division_id: DivisionId,
        participants: Vec<ArcherId>,
        rounds: Vec<Vec<(ArcherId, ArrowResult)>>,
    ) -> Result<Self, TournamentError> {
        let mut heat = Self::new(division_id, participants)?;
        for (i, round) in rounds.iter().enumerate() {
            for &(archer_id, result) in round {
                heat.record_outcome(i as u32 + 1, archer_id, result)?;
            }
        }
        Ok(heat)
    }

    pub fn division_id(&self) -> DivisionId {
        self.division_id
    }

    pub fn participants(&self) -> &[ArcherId] {
        &self.participants
    }

    /// Record (or correct) one archer's outcome in a round. The round must
    /// be an already-recorded one or the currently open one, and the archer
    /// must still be active when that round starts.
    pub fn record_outcome(
        &mut self,
        round: u32,
        archer_id: ArcherId,
        result: ArrowResult,
    ) -> Result<(), TournamentError> {
        if round == 0 {
            return Err(TournamentError::RoundOutOfRange { round });
        }
        if !self.participants.contains(&archer_id) {
            return Err(TournamentError::NotAParticipant(archer_id));
        }
        let round_idx = round as usize - 1;
        if round_idx >= self.rounds.len() {
            let replay = self.replay_through(self.rounds.len());
            let open_round = if replay.decided() {
                None
            } else {
                Some(replay.rounds_completed as usize)
            };
            if open_round != Some(round_idx) {
                return Err(TournamentError::RoundOutOfRange { round });
            }
            self.rounds.push(HashMap::new());
        }
        let at_round_start = self.replay_through(round_idx);
        if !at_round_start.active.contains(&archer_id) {
            return Err(TournamentError::OutcomeForInactiveArcher(archer_id));
        }
        self.rounds[round_idx].insert(archer_id, result);
        Ok(())
    }

    /// Current state, derived by replay.
    pub fn state(&self) -> HeatState {
        let replay = self.replay_through(self.rounds.len());
        if !replay.decided() {
            return HeatState::RoundInProgress(replay.rounds_completed + 1);
        }
        let multi_group = self
            .elimination_groups(&replay)
            .iter()
            .any(|(_, ids)| ids.len() > 1);
        if multi_group {
            HeatState::AwaitingDistanceHeat
        } else {
            HeatState::WinnerDecided
        }
    }

    /// The winner, once exactly one archer remains.
    pub fn winner(&self) -> Option<ArcherId> {
        let replay = self.replay_through(self.rounds.len());
        if replay.decided() {
            replay.active.first().copied()
        } else {
            None
        }
    }

    /// Groups of archers eliminated in the same round, with the shared
    /// provisional rank each group would occupy; only groups larger than
    /// one need a distance shoot-off.
    pub fn pending_distance_groups(&self) -> Vec<(u32, Vec<ArcherId>)> {
        let replay = self.replay_through(self.rounds.len());
        if !replay.decided() {
            return Vec::new();
        }
        self.elimination_groups(&replay)
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect()
    }

    /// One record per participant, available only once a winner is decided.
    /// Archers eliminated together share a provisional rank until a
    /// distance shoot-off splits them.
    pub fn records(&self) -> Result<Vec<EliminationRecord>, TournamentError> {
        let replay = self.replay_through(self.rounds.len());
        if !replay.decided() {
            return Err(TournamentError::HeatUndecided);
        }
        let winner = replay.active[0];
        let eliminated_round: HashMap<ArcherId, u32> = replay.eliminated.iter().copied().collect();
        let mut rank_of: HashMap<ArcherId, u32> = HashMap::new();
        rank_of.insert(winner, 1);
        for (rank, ids) in self.elimination_groups(&replay) {
            for id in ids {
                rank_of.insert(id, rank);
            }
        }

        let mut records = Vec::with_capacity(self.participants.len());
        for &archer_id in &self.participants {
            let eliminated_at_round = eliminated_round.get(&archer_id).copied();
            let shot_rounds = eliminated_at_round.unwrap_or(replay.rounds_completed) as usize;
            let outcomes: Vec<ArrowResult> = self.rounds[..shot_rounds]
                .iter()
                .map(|r| r.get(&archer_id).copied().unwrap_or(ArrowResult::Unknown))
                .collect();
            records.push(EliminationRecord {
                archer_id,
                outcomes,
                rank: rank_of[&archer_id],
                is_winner: archer_id == winner,
                eliminated_at_round,
                division_id: self.division_id,
            });
        }
        Ok(records)
    }

    /// Replay the first `upto` rounds from scratch.
    ///
    /// A round only takes effect once every active archer has a known
    /// outcome in it. A round in which every active archer misses
    /// eliminates no one (the round is reshot). Replay stops as soon as a
    /// single archer remains; later recorded rounds are stale.
    fn replay_through(&self, upto: usize) -> Replay {
        let mut active = self.participants.clone();
        let mut eliminated = Vec::new();
        let mut rounds_completed = 0u32;

        for round in &self.rounds[..upto] {
            if active.len() == 1 {
                break;
            }
            let complete = active
                .iter()
                .all(|id| round.get(id).is_some_and(|r| *r != ArrowResult::Unknown));
            if !complete {
                break;
            }
            let missers: Vec<ArcherId> = active
                .iter()
                .filter(|id| round[*id] == ArrowResult::Miss)
                .copied()
                .collect();
            rounds_completed += 1;
            if missers.len() == active.len() {
                continue;
            }
            for id in missers {
                active.retain(|a| *a != id);
                eliminated.push((id, rounds_completed));
            }
        }

        Replay {
            active,
            eliminated,
            rounds_completed,
        }
    }

    /// Eliminated archers grouped by round with competition ranks assigned
    /// from rank 2 downward; a later elimination round means a better rank.
    fn elimination_groups(&self, replay: &Replay) -> Vec<(u32, Vec<ArcherId>)> {
        let mut rounds: Vec<u32> = replay.eliminated.iter().map(|(_, r)| *r).collect();
        rounds.sort_unstable();
        rounds.dedup();

        let mut groups = Vec::new();
        let mut next_rank = 2u32;
        for round in rounds.into_iter().rev() {
            let ids: Vec<ArcherId> = replay
                .eliminated
                .iter()
                .filter(|(_, r)| *r == round)
                .map(|(id, _)| *id)
                .collect();
            let size = ids.len() as u32;
            groups.push((next_rank, ids));
            next_rank += size;
        }
        groups
    }
}
