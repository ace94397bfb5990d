//! Integration tests for the result merger and the heat store semantics.

use chrono::Utc;
use kyudo_tournament_web::{
    final_rankings, ArcherId, ArrowResult, DistanceHeat, DistanceOutcome, DistanceRecord,
    Division, DivisionId, EliminationHeat, EliminationRecord, Gender, Grade, HeatStore,
    MemoryHeatStore, ResolutionMethod, Tournament, TournamentConfig,
};
use uuid::Uuid;

fn set_hits(t: &mut Tournament, id: ArcherId, hits: u32) {
    let first = hits.min(4);
    let second = hits.saturating_sub(4).min(4);
    let a = t.archer_mut(id).unwrap();
    a.round_1 = (0..4)
        .map(|i| if i < first { ArrowResult::Hit } else { ArrowResult::Miss })
        .collect();
    a.round_2 = (0..4)
        .map(|i| if i < second { ArrowResult::Hit } else { ArrowResult::Miss })
        .collect();
}

/// One-division tournament with the given archers and hit counts.
fn tournament_with(hits: &[(&str, u32)]) -> (Tournament, Vec<ArcherId>, DivisionId) {
    let config = TournamentConfig {
        divisions: vec![Division::new("Yudansha", Grade::Shodan, Grade::Kudan)],
        ..TournamentConfig::default()
    };
    let division_id = config.divisions[0].id;
    let mut t = Tournament::new(config);
    let ids = hits
        .iter()
        .map(|(name, n)| {
            let id = t.add_archer(*name, Grade::Sandan, None).unwrap();
            set_hits(&mut t, id, *n);
            id
        })
        .collect();
    (t, ids, division_id)
}

#[test]
fn unresolved_ties_appear_shared_with_their_resolution_path() {
    let (t, ids, _) = tournament_with(&[("A", 4), ("B", 4), ("C", 3), ("D", 3), ("E", 2)]);
    let store = MemoryHeatStore::new();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    assert_eq!(results.len(), 1);
    let rows = &results[0].rows;
    assert_eq!(rows.len(), 5);

    let row = |id| rows.iter().find(|r| r.archer_id == id).unwrap();
    assert_eq!(row(ids[0]).rank, Some(1));
    assert_eq!(row(ids[1]).rank, Some(1));
    assert!(row(ids[0]).tied);
    assert_eq!(row(ids[0]).method, ResolutionMethod::Elimination);
    assert_eq!(row(ids[2]).rank, Some(3));
    assert_eq!(row(ids[3]).rank, Some(3));
    assert_eq!(row(ids[2]).method, ResolutionMethod::Distance);
    assert_eq!(row(ids[4]).rank, Some(5));
    assert!(!row(ids[4]).tied);
    assert_eq!(row(ids[4]).method, ResolutionMethod::Confirmed);
}

#[test]
fn elimination_then_distance_resolves_every_award_rank() {
    let (t, ids, division_id) =
        tournament_with(&[("A", 4), ("B", 4), ("C", 3), ("D", 3), ("E", 2)]);
    let (a, b, c, d, e) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
    let store = MemoryHeatStore::new();

    // First place shoot-off: A beats B in one round.
    let mut heat = EliminationHeat::new(division_id, vec![a, b]).unwrap();
    heat.record_outcome(1, a, ArrowResult::Hit).unwrap();
    heat.record_outcome(1, b, ArrowResult::Miss).unwrap();
    store
        .save_elimination_heat(t.id, heat.records().unwrap(), Utc::now())
        .unwrap();

    // Distance shoot-off for rank 3: D closer than C.
    let mut heat = DistanceHeat::new(division_id, 3, vec![c, d]).unwrap();
    heat.record_measurement(c, 9.0).unwrap();
    heat.record_measurement(d, 7.5).unwrap();
    store
        .save_distance_heat(t.id, 3, heat.records().unwrap())
        .unwrap();

    let shootoff = store.shootoff_results(t.id).unwrap();
    let results = final_rankings(&t, &shootoff);
    let rows = &results[0].rows;

    let expected = [
        (a, 1, ResolutionMethod::Elimination),
        (b, 2, ResolutionMethod::Elimination),
        (d, 3, ResolutionMethod::Distance),
        (c, 4, ResolutionMethod::Distance),
        (e, 5, ResolutionMethod::Confirmed),
    ];
    assert_eq!(rows.len(), expected.len());
    for (row, (id, rank, method)) in rows.iter().zip(expected) {
        assert_eq!(row.archer_id, id);
        assert_eq!(row.rank, Some(rank));
        assert_eq!(row.method, method);
        assert!(!row.tied);
    }

    // Idempotence: unchanged store contents, identical table.
    assert_eq!(results, final_rankings(&t, &shootoff));
}

#[test]
fn distance_supersedes_elimination_for_forwarded_groups() {
    let (t, ids, division_id) = tournament_with(&[("A", 4), ("B", 4), ("C", 4)]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    let store = MemoryHeatStore::new();

    // B and C miss together: both forwarded at provisional rank 2.
    let mut heat = EliminationHeat::new(division_id, vec![a, b, c]).unwrap();
    heat.record_outcome(1, a, ArrowResult::Hit).unwrap();
    heat.record_outcome(1, b, ArrowResult::Miss).unwrap();
    heat.record_outcome(1, c, ArrowResult::Miss).unwrap();
    assert_eq!(heat.pending_distance_groups(), vec![(2, vec![b, c])]);
    store
        .save_elimination_heat(t.id, heat.records().unwrap(), Utc::now())
        .unwrap();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    let row = |rows: &Vec<_>, id| {
        rows.iter()
            .find(|r: &&kyudo_tournament_web::FinalRow| r.archer_id == id)
            .cloned()
            .unwrap()
    };
    let rows = &results[0].rows;
    assert_eq!(row(rows, b).rank, Some(2));
    assert_eq!(row(rows, c).rank, Some(2));
    assert!(row(rows, b).tied);

    // The distance shoot-off splits the forwarded pair.
    let mut heat = DistanceHeat::new(division_id, 2, vec![b, c]).unwrap();
    heat.record_measurement(b, 5.0).unwrap();
    heat.record_measurement(c, 6.0).unwrap();
    store
        .save_distance_heat(t.id, 2, heat.records().unwrap())
        .unwrap();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    let rows = &results[0].rows;
    assert_eq!(row(rows, a).rank, Some(1));
    assert_eq!(row(rows, a).method, ResolutionMethod::Elimination);
    assert_eq!(row(rows, b).rank, Some(2));
    assert_eq!(row(rows, b).method, ResolutionMethod::Distance);
    assert_eq!(row(rows, c).rank, Some(3));
    assert_eq!(row(rows, c).method, ResolutionMethod::Distance);
    assert!(rows.iter().all(|r| !r.tied));
}

#[test]
fn defeated_archer_sits_at_the_bottom_without_a_rank() {
    let (t, ids, division_id) = tournament_with(&[("A", 4), ("C", 3), ("D", 3), ("E", 3)]);
    let (a, c, d, e) = (ids[0], ids[1], ids[2], ids[3]);
    let store = MemoryHeatStore::new();

    let mut heat = DistanceHeat::new(division_id, 2, vec![c, d, e]).unwrap();
    heat.record_measurement(c, 5.0).unwrap();
    heat.record_defeated(d).unwrap();
    heat.record_measurement(e, 3.0).unwrap();
    store
        .save_distance_heat(t.id, 2, heat.records().unwrap())
        .unwrap();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    let rows = &results[0].rows;
    assert_eq!(rows[0].archer_id, a);
    assert_eq!(rows[0].rank, Some(1));
    assert_eq!(rows[1].archer_id, e);
    assert_eq!(rows[1].rank, Some(2));
    assert_eq!(rows[2].archer_id, c);
    assert_eq!(rows[2].rank, Some(3));
    // Defeated: present for auditability, no numeric rank, sorted last.
    assert_eq!(rows[3].archer_id, d);
    assert_eq!(rows[3].rank, None);
    assert_eq!(rows[3].method, ResolutionMethod::Distance);
}

#[test]
fn full_delete_restores_original_tie_groups() {
    let (t, ids, division_id) =
        tournament_with(&[("A", 4), ("B", 4), ("C", 3), ("D", 3), ("E", 2)]);
    let (a, b) = (ids[0], ids[1]);
    let store = MemoryHeatStore::new();

    let before = final_rankings(&t, &store.shootoff_results(t.id).unwrap());

    let mut heat = EliminationHeat::new(division_id, vec![a, b]).unwrap();
    heat.record_outcome(1, a, ArrowResult::Hit).unwrap();
    heat.record_outcome(1, b, ArrowResult::Miss).unwrap();
    store
        .save_elimination_heat(t.id, heat.records().unwrap(), Utc::now())
        .unwrap();
    assert_ne!(before, final_rankings(&t, &store.shootoff_results(t.id).unwrap()));

    store.delete_all_shootoff_results(t.id).unwrap();
    // No residue: the original unresolved tie groups come back exactly.
    assert_eq!(before, final_rankings(&t, &store.shootoff_results(t.id).unwrap()));
}

#[test]
fn distance_saves_replace_by_slot_and_supersede_by_archer() {
    let tournament_id = Uuid::new_v4();
    let division_id = Uuid::new_v4();
    let (c, d, f) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let store = MemoryHeatStore::new();

    let record = |archer_id, target_rank, rank| DistanceRecord {
        archer_id,
        target_rank,
        outcome: DistanceOutcome::Ranked(rank),
        division_id,
    };

    store
        .save_distance_heat(tournament_id, 3, vec![record(c, 3, 3), record(d, 3, 4)])
        .unwrap();
    // Re-running the same slot overwrites, not appends.
    store
        .save_distance_heat(tournament_id, 3, vec![record(c, 3, 4), record(d, 3, 3)])
        .unwrap();
    let results = store.shootoff_results(tournament_id).unwrap();
    assert_eq!(results.distance.results.len(), 2);

    // A later heat for another slot pulls D out of the old one.
    store
        .save_distance_heat(tournament_id, 2, vec![record(d, 2, 2), record(f, 2, 3)])
        .unwrap();
    let results = store.shootoff_results(tournament_id).unwrap();
    assert_eq!(results.distance.results.len(), 3);
    let for_archer = |id| {
        results
            .distance
            .results
            .iter()
            .filter(|r| r.archer_id == id)
            .count()
    };
    assert_eq!(for_archer(c), 1);
    assert_eq!(for_archer(d), 1);
    assert_eq!(for_archer(f), 1);
    let d_record = results
        .distance
        .results
        .iter()
        .find(|r| r.archer_id == d)
        .unwrap();
    assert_eq!(d_record.target_rank, 2);
}

#[test]
fn elimination_saves_replace_the_division_wholesale() {
    let tournament_id = Uuid::new_v4();
    let division_id = Uuid::new_v4();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let store = MemoryHeatStore::new();

    let record = |archer_id, rank, is_winner| EliminationRecord {
        archer_id,
        outcomes: vec![ArrowResult::Hit],
        rank,
        is_winner,
        eliminated_at_round: if is_winner { None } else { Some(1) },
        division_id,
    };

    store
        .save_elimination_heat(
            tournament_id,
            vec![record(a, 1, true), record(b, 2, false)],
            Utc::now(),
        )
        .unwrap();
    // A corrected re-save for the same division replaces the earlier one.
    store
        .save_elimination_heat(
            tournament_id,
            vec![record(b, 1, true), record(a, 2, false)],
            Utc::now(),
        )
        .unwrap();

    let results = store.shootoff_results(tournament_id).unwrap();
    assert_eq!(results.elimination.results.len(), 2);
    let winner = results
        .elimination
        .results
        .iter()
        .find(|r| r.is_winner)
        .unwrap();
    assert_eq!(winner.archer_id, b);
    assert!(results.elimination.completed_at.is_some());
}

#[test]
fn records_from_the_other_gender_partition_are_ignored() {
    let config = TournamentConfig {
        divisions: vec![Division::new("Yudansha", Grade::Shodan, Grade::Kudan)],
        separate_by_gender: true,
        ..TournamentConfig::default()
    };
    let division_id = config.divisions[0].id;
    let mut t = Tournament::new(config);
    let m1 = t.add_archer("M1", Grade::Sandan, Some(Gender::Male)).unwrap();
    let m2 = t.add_archer("M2", Grade::Sandan, Some(Gender::Male)).unwrap();
    let f1 = t.add_archer("F1", Grade::Sandan, Some(Gender::Female)).unwrap();
    let f2 = t.add_archer("F2", Grade::Sandan, Some(Gender::Female)).unwrap();
    for id in [m1, m2, f1, f2] {
        set_hits(&mut t, id, 4);
    }
    let store = MemoryHeatStore::new();

    // Men's first-place shoot-off decided; women's still pending. Both
    // partitions share the division id.
    let mut heat = EliminationHeat::new(division_id, vec![m1, m2]).unwrap();
    heat.record_outcome(1, m1, ArrowResult::Hit).unwrap();
    heat.record_outcome(1, m2, ArrowResult::Miss).unwrap();
    store
        .save_elimination_heat(t.id, heat.records().unwrap(), Utc::now())
        .unwrap();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    assert_eq!(results.len(), 2);

    let men = &results[0].rows;
    assert_eq!(men[0].archer_id, m1);
    assert_eq!(men[0].rank, Some(1));
    assert!(!men[0].tied);

    let women = &results[1].rows;
    assert!(women.iter().all(|r| r.rank == Some(1) && r.tied));
    assert!(women
        .iter()
        .all(|r| r.method == ResolutionMethod::Elimination));
}

#[test]
fn records_for_unknown_archers_are_skipped() {
    let (t, ids, division_id) = tournament_with(&[("A", 4), ("B", 3)]);
    let store = MemoryHeatStore::new();

    // A record for an archer who was since removed from the tournament.
    let ghost = Uuid::new_v4();
    store
        .save_elimination_heat(
            t.id,
            vec![EliminationRecord {
                archer_id: ghost,
                outcomes: vec![ArrowResult::Hit],
                rank: 1,
                is_winner: true,
                eliminated_at_round: None,
                division_id,
            }],
            Utc::now(),
        )
        .unwrap();

    let results = final_rankings(&t, &store.shootoff_results(t.id).unwrap());
    let rows = &results[0].rows;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.archer_id != ghost));
    assert_eq!(rows[0].archer_id, ids[0]);
    assert_eq!(rows[0].rank, Some(1));
}
