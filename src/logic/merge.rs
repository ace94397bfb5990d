//! Result merging: combine confirmed groups with saved shoot-off records
//! into one authoritative, rank-ordered table per partition.
//!
//! The merge is a pure function of its inputs. Re-running it with unchanged
//! store contents yields the same table, so it is safe to call after every
//! heat save and on every client poll without any cross-client locking.

use crate::logic::standings::{partition_standings, PartitionStandings};
use crate::logic::ties::{categorize, RankGroup, Resolution};
use crate::models::{
    ArcherId, DistanceOutcome, DistanceRecord, EliminationRecord, Partition, ShootoffResults,
    Tournament,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which path produced (or will produce) a row's rank.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Confirmed,
    Elimination,
    Distance,
}

impl From<Resolution> for ResolutionMethod {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Confirmed => ResolutionMethod::Confirmed,
            Resolution::Elimination => ResolutionMethod::Elimination,
            Resolution::Distance => ResolutionMethod::Distance,
        }
    }
}

/// One line of the final table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    /// `None` for an archer defeated in a distance shoot-off.
    pub rank: Option<u32>,
    pub archer_id: ArcherId,
    pub hit_count: u32,
    pub method: ResolutionMethod,
    /// True while the rank is still shared with other archers.
    pub tied: bool,
}

/// Final table for one partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionResult {
    pub partition: Partition,
    pub rows: Vec<FinalRow>,
}

/// Merge one partition's tie groups with the saved heat records.
///
/// Precedence, highest first: a distance record supersedes an elimination
/// record for the same archer (elimination only hands out a shared
/// provisional rank when it forwards a tie); elimination records supersede
/// confirmed group ranks; confirmed groups fill in the rest. A record whose
/// rank collides with an already-used rank is skipped with a logged reason,
/// unless the collision is a same-origin tie (elimination records sharing
/// an unresolved rank, or a confirmed group past the award limit).
pub fn merge_partition(
    standings: &PartitionStandings,
    groups: &[RankGroup],
    elimination: &[EliminationRecord],
    distance: &[DistanceRecord],
) -> Vec<FinalRow> {
    let hit_counts: HashMap<ArcherId, u32> = standings
        .rows
        .iter()
        .map(|r| (r.archer_id, r.hit_count))
        .collect();
    // Records joined on the division id stored at save time. Gender-split
    // partitions share a division id, so membership in this partition's
    // standings is required as well.
    let relevant = |division_id, archer_id: &ArcherId| {
        standings.partition.division == Some(division_id) && hit_counts.contains_key(archer_id)
    };

    let mut distance_by_archer: HashMap<ArcherId, &DistanceRecord> = HashMap::new();
    for rec in distance {
        if !relevant(rec.division_id, &rec.archer_id) {
            continue;
        }
        if distance_by_archer.insert(rec.archer_id, rec).is_some() {
            log::warn!(
                "archer {} has more than one distance record; keeping the latest save",
                rec.archer_id
            );
        }
    }

    let mut rows: Vec<FinalRow> = Vec::new();
    let mut used_ranks: HashSet<u32> = HashSet::new();
    let mut placed: HashSet<ArcherId> = HashSet::new();

    // Elimination records first, skipping archers whose provisional result
    // a distance heat has since superseded.
    let mut elim_rank_count: HashMap<u32, usize> = HashMap::new();
    let elim_relevant: Vec<&EliminationRecord> = elimination
        .iter()
        .filter(|rec| relevant(rec.division_id, &rec.archer_id))
        .filter(|rec| !distance_by_archer.contains_key(&rec.archer_id))
        .collect();
    for rec in &elim_relevant {
        *elim_rank_count.entry(rec.rank).or_insert(0) += 1;
    }
    for rec in elim_relevant {
        if placed.contains(&rec.archer_id) {
            log::warn!(
                "archer {} has more than one elimination record; keeping the first",
                rec.archer_id
            );
            continue;
        }
        // Shared ranks inside the elimination results are a legitimate
        // unresolved tie, not a conflict.
        rows.push(FinalRow {
            rank: Some(rec.rank),
            archer_id: rec.archer_id,
            hit_count: hit_counts[&rec.archer_id],
            method: ResolutionMethod::Elimination,
            tied: elim_rank_count[&rec.rank] > 1,
        });
        used_ranks.insert(rec.rank);
        placed.insert(rec.archer_id);
    }

    // Distance records: non-defeated take their resolved rank, defeated
    // archers keep a row with no numeric rank.
    for rec in distance {
        let Some(kept) = distance_by_archer.get(&rec.archer_id) else {
            continue;
        };
        if !std::ptr::eq(*kept, rec) || placed.contains(&rec.archer_id) {
            continue;
        }
        match rec.outcome {
            DistanceOutcome::Defeated => {
                rows.push(FinalRow {
                    rank: None,
                    archer_id: rec.archer_id,
                    hit_count: hit_counts[&rec.archer_id],
                    method: ResolutionMethod::Distance,
                    tied: false,
                });
                placed.insert(rec.archer_id);
            }
            DistanceOutcome::Ranked(rank) => {
                if used_ranks.contains(&rank) {
                    log::warn!(
                        "skipping distance record for archer {}: rank {} already assigned",
                        rec.archer_id,
                        rank
                    );
                    continue;
                }
                rows.push(FinalRow {
                    rank: Some(rank),
                    archer_id: rec.archer_id,
                    hit_count: hit_counts[&rec.archer_id],
                    method: ResolutionMethod::Distance,
                    tied: false,
                });
                used_ranks.insert(rank);
                placed.insert(rec.archer_id);
            }
        }
    }

    // Confirmed groups fill the remaining slots. Unresolved tie groups
    // appear at their shared rank, flagged tied, labeled with the path that
    // will split them.
    for group in groups {
        let unplaced: Vec<ArcherId> = group
            .archer_ids
            .iter()
            .filter(|id| !placed.contains(*id))
            .copied()
            .collect();
        if unplaced.is_empty() {
            continue;
        }
        if used_ranks.contains(&group.rank) {
            log::warn!(
                "skipping {} archer(s) at rank {}: rank already assigned by a shoot-off",
                unplaced.len(),
                group.rank
            );
            continue;
        }
        let tied = unplaced.len() > 1;
        for archer_id in unplaced {
            rows.push(FinalRow {
                rank: Some(group.rank),
                archer_id,
                hit_count: group.hit_count,
                method: group.resolution.into(),
                tied,
            });
            placed.insert(archer_id);
        }
        used_ranks.insert(group.rank);
    }

    // Ranked rows ascending, defeated rows at the bottom; stable within a
    // shared rank.
    rows.sort_by_key(|r| r.rank.unwrap_or(u32::MAX));
    rows
}

/// Run classifier, categorizer, and merger for every partition of the
/// tournament against the given store contents.
pub fn final_rankings(tournament: &Tournament, shootoff: &ShootoffResults) -> Vec<PartitionResult> {
    partition_standings(tournament)
        .iter()
        .map(|standings| {
            let groups = categorize(standings, tournament.config.award_rank_limit);
            PartitionResult {
                partition: standings.partition,
                rows: merge_partition(
                    standings,
                    &groups,
                    &shootoff.elimination.results,
                    &shootoff.distance.results,
                ),
            }
        })
        .collect()
}
