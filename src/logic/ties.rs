//! Tie categorization: which groups need which kind of shoot-off.

use crate::logic::standings::PartitionStandings;
use crate::models::ArcherId;
use serde::{Deserialize, Serialize};

/// How a tie group gets resolved to distinct ranks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// No tie, or a tie intentionally left shared because it falls outside
    /// the award range.
    Confirmed,
    /// Tie for first place: sequential sudden-death shoot-off (shichuma).
    Elimination,
    /// Tie for an awarded rank other than first: distance shoot-off (enkin).
    Distance,
}

/// A group of archers sharing one hit count, with the rank slot the group
/// occupies and the resolution path it needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankGroup {
    /// Competition rank of the group (1,1,3 style: gaps after shared ranks).
    pub rank: u32,
    pub hit_count: u32,
    /// Members in standings order.
    pub archer_ids: Vec<ArcherId>,
    pub resolution: Resolution,
}

/// Walk a partition's standings in descending hit-count order and label
/// every tie group.
///
/// First place is always settled by elimination shooting; any other tied
/// rank inside the award range goes to a distance shoot-off; tied ranks
/// past the award limit stay shared.
pub fn categorize(standings: &PartitionStandings, award_rank_limit: u32) -> Vec<RankGroup> {
    let mut groups = Vec::new();
    let mut current_rank: u32 = 1;
    let rows = &standings.rows;
    let mut i = 0;
    while i < rows.len() {
        let hit_count = rows[i].hit_count;
        let mut j = i;
        while j < rows.len() && rows[j].hit_count == hit_count {
            j += 1;
        }
        let archer_ids: Vec<ArcherId> = rows[i..j].iter().map(|r| r.archer_id).collect();
        let size = archer_ids.len() as u32;
        let resolution = if size == 1 {
            Resolution::Confirmed
        } else if current_rank == 1 {
            Resolution::Elimination
        } else if current_rank <= award_rank_limit {
            Resolution::Distance
        } else {
            Resolution::Confirmed
        };
        groups.push(RankGroup {
            rank: current_rank,
            hit_count,
            archer_ids,
            resolution,
        });
        current_rank += size;
        i = j;
    }
    groups
}
