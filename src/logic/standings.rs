//! Rank classification: partition assignment and hit-count standings.

use crate::models::{ArcherId, DivisionId, Gender, Partition, Tournament};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One archer's scoring line inside a partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredArcher {
    pub archer_id: ArcherId,
    pub hit_count: u32,
    /// True while any configured arrow is missing; the count may still change.
    pub indeterminate: bool,
}

/// Hit-count standings for one partition, sorted descending with equal
/// counts kept adjacent in check-in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionStandings {
    pub partition: Partition,
    pub rows: Vec<ScoredArcher>,
}

/// Assign every checked-in archer to a partition and compute per-partition
/// standings. Partitions come out in a deterministic order: divisions in
/// configuration order (unassigned archers last), genders male, female,
/// then unspecified.
pub fn partition_standings(tournament: &Tournament) -> Vec<PartitionStandings> {
    let config = &tournament.config;
    let mut by_partition: HashMap<Partition, Vec<ScoredArcher>> = HashMap::new();

    for archer in &tournament.archers {
        let division = config.division_of(archer.grade);
        let gender = if config.separates_gender(division) {
            archer.gender
        } else {
            None
        };
        let partition = Partition {
            division: division.map(|d| d.id),
            gender,
        };
        by_partition.entry(partition).or_default().push(ScoredArcher {
            archer_id: archer.id,
            hit_count: archer.hit_count(config.arrows_round_1, config.arrows_round_2),
            indeterminate: !archer
                .has_complete_results(config.arrows_round_1, config.arrows_round_2),
        });
    }

    let mut standings = Vec::new();
    let division_keys: Vec<Option<DivisionId>> = config
        .divisions
        .iter()
        .map(|d| Some(d.id))
        .chain(std::iter::once(None))
        .collect();
    for division in division_keys {
        for gender in [Some(Gender::Male), Some(Gender::Female), None] {
            let partition = Partition { division, gender };
            if let Some(mut rows) = by_partition.remove(&partition) {
                // Stable sort: equal hit counts keep check-in order.
                rows.sort_by_key(|r| std::cmp::Reverse(r.hit_count));
                standings.push(PartitionStandings { partition, rows });
            }
        }
    }
    standings
}
