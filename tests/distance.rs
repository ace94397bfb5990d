//! Integration tests for distance shoot-offs and rank slot generation.

use kyudo_tournament_web::{
    rank_slot_choices, ArcherId, DistanceHeat, DistanceOutcome, TournamentError,
};
use uuid::Uuid;

fn ids(n: usize) -> Vec<ArcherId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[test]
fn measurements_rank_ascending_from_the_target_slot() {
    let division = Uuid::new_v4();
    let archers = ids(3);
    let (a, b, c) = (archers[0], archers[1], archers[2]);
    let mut heat = DistanceHeat::new(division, 2, archers).unwrap();

    heat.record_measurement(a, 12.0).unwrap();
    heat.record_measurement(b, 8.5).unwrap();
    heat.record_measurement(c, 20.1).unwrap();
    assert!(heat.is_complete());

    let records = heat.records().unwrap();
    let outcome = |id| records.iter().find(|r| r.archer_id == id).unwrap().outcome;
    assert_eq!(outcome(b), DistanceOutcome::Ranked(2));
    assert_eq!(outcome(a), DistanceOutcome::Ranked(3));
    assert_eq!(outcome(c), DistanceOutcome::Ranked(4));
    assert!(records.iter().all(|r| r.target_rank == 2));
    assert!(records.iter().all(|r| r.division_id == division));
}

#[test]
fn defeated_archers_get_no_numeric_rank() {
    let division = Uuid::new_v4();
    let archers = ids(3);
    let (a, b, c) = (archers[0], archers[1], archers[2]);
    let mut heat = DistanceHeat::new(division, 2, archers).unwrap();

    heat.record_measurement(a, 4.0).unwrap();
    heat.record_defeated(b).unwrap();
    heat.record_measurement(c, 6.5).unwrap();

    let records = heat.records().unwrap();
    let outcome = |id| records.iter().find(|r| r.archer_id == id).unwrap().outcome;
    // The two non-defeated archers take ranks 2 and 3; nobody takes 4.
    assert_eq!(outcome(a), DistanceOutcome::Ranked(2));
    assert_eq!(outcome(c), DistanceOutcome::Ranked(3));
    assert_eq!(outcome(b), DistanceOutcome::Defeated);
}

#[test]
fn incomplete_heat_refuses_to_produce_records() {
    let division = Uuid::new_v4();
    let archers = ids(2);
    let a = archers[0];
    let mut heat = DistanceHeat::new(division, 3, archers).unwrap();

    heat.record_measurement(a, 10.0).unwrap();
    assert!(!heat.is_complete());
    assert_eq!(
        heat.records().unwrap_err(),
        TournamentError::HeatIncomplete { missing: 1 }
    );
}

#[test]
fn measurements_must_be_finite_and_from_participants() {
    let division = Uuid::new_v4();
    let archers = ids(2);
    let a = archers[0];
    let outsider = Uuid::new_v4();
    let mut heat = DistanceHeat::new(division, 2, archers).unwrap();

    assert_eq!(
        heat.record_measurement(a, f64::NAN),
        Err(TournamentError::InvalidMeasurement)
    );
    assert_eq!(
        heat.record_measurement(outsider, 5.0),
        Err(TournamentError::NotAParticipant(outsider))
    );
}

#[test]
fn re_entering_a_measurement_overwrites() {
    let division = Uuid::new_v4();
    let archers = ids(2);
    let (a, b) = (archers[0], archers[1]);
    let mut heat = DistanceHeat::new(division, 2, archers).unwrap();

    heat.record_measurement(a, 3.0).unwrap();
    heat.record_measurement(b, 5.0).unwrap();
    heat.record_measurement(a, 9.0).unwrap();

    let records = heat.records().unwrap();
    let outcome = |id| records.iter().find(|r| r.archer_id == id).unwrap().outcome;
    assert_eq!(outcome(b), DistanceOutcome::Ranked(2));
    assert_eq!(outcome(a), DistanceOutcome::Ranked(3));
}

#[test]
fn slot_choices_extend_past_the_award_cutoff_when_the_group_straddles_it() {
    // Fully inside the award range: one contiguous block.
    assert_eq!(rank_slot_choices(2, 2, 3), vec![2, 3]);
    // Straddling the cutoff: in-range slots plus the out-of-range tail.
    assert_eq!(rank_slot_choices(3, 2, 3), vec![3, 4]);
    assert_eq!(rank_slot_choices(2, 3, 3), vec![2, 3, 4]);
    // Entirely past the cutoff (operator-convened heat).
    assert_eq!(rank_slot_choices(4, 2, 3), vec![4, 5]);
}
