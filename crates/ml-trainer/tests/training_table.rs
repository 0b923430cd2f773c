mod common;

use core_types::Position;
use ml_features::StatFamily;
use ml_trainer::{AssemblyParams, LeagueCaches, TrainerError, build_training_table, schema};

fn params() -> AssemblyParams {
    AssemblyParams::new(6, 8, 1.0)
}

#[test]
fn running_back_table_counts_every_candidate() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let table = build_training_table(Position::RunningBack, &store, &caches, &[common::SEASON], &params()).unwrap();

    // Week 1 has no prior games, CHI never defended a back, LAR's week 2 lacks points.
    assert_eq!(table.candidates, 7);
    assert_eq!(table.len(), 2);
    assert_eq!(table.exclusions.empty_offense_window, 3);
    assert_eq!(table.exclusions.empty_defense_window, 1);
    assert_eq!(table.exclusions.missing_target, 1);
    assert_eq!(table.candidates, table.len() + table.exclusions.total());

    let ids: Vec<&str> = table.rows.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["backup", "lead"]);
    assert!(table.rows.iter().all(|r| r.week == 2 && r.opponent_team == "SEA"));

    let lead = &table.rows[1];
    assert_eq!(lead.depth_chart_position, Some(1));
    assert_eq!(lead.target, Some(1.0));
    assert_eq!(table.rows[0].depth_chart_position, Some(2));
}

#[test]
fn rows_only_carry_schema_columns() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let table = build_training_table(Position::RunningBack, &store, &caches, &[common::SEASON], &params()).unwrap();
    let columns = schema(Position::RunningBack);

    assert_eq!(table.schema, columns);
    for row in &table.rows {
        assert!(row.features.keys().all(|key| columns.contains(key)));
    }
}

#[test]
fn target_follows_the_reception_scoring() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let standard = build_training_table(
        Position::WideReceiver,
        &store,
        &caches,
        &[common::SEASON],
        &AssemblyParams::new(6, 8, 0.0),
    )
    .unwrap();

    // 2.5 PPR points minus one reception.
    assert_eq!(standard.rows[0].target, Some(1.5));
}

#[test]
fn wide_receiver_table_counts_every_candidate() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let table = build_training_table(Position::WideReceiver, &store, &caches, &[common::SEASON], &params()).unwrap();

    assert_eq!(table.candidates, 3);
    assert_eq!(table.len(), 1);
    assert_eq!(table.exclusions.empty_offense_window, 1);
    assert_eq!(table.exclusions.empty_defense_window, 0);
    assert_eq!(table.exclusions.missing_target, 1);

    let row = &table.rows[0];
    assert_eq!((row.entity_id.as_str(), row.week), ("wr1", 2));
    assert_eq!(row.depth_chart_position, None);
    assert_eq!(row.target, Some(2.5));
    assert!(row.features.keys().all(|key| table.schema.contains(key)));
}

#[test]
fn seasons_outside_the_store_give_an_empty_table() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let table = build_training_table(Position::WideReceiver, &store, &caches, &[2019], &params()).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.candidates, 0);
}

#[test]
fn no_seasons_is_an_error() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let result = build_training_table(Position::RunningBack, &store, &caches, &[], &params());
    assert!(matches!(result, Err(TrainerError::NoSeasons)));
}

#[test]
fn rebuilding_over_warm_caches_gives_the_same_table() {
    let store = common::league();
    let caches = LeagueCaches::new();
    let first = build_training_table(Position::RunningBack, &store, &caches, &[common::SEASON], &params()).unwrap();
    assert!(caches.bounds.contains(common::SEASON, StatFamily::RunningBackOpportunity));

    let second = build_training_table(Position::RunningBack, &store, &caches, &[common::SEASON], &params()).unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(first.rows[1].features, second.rows[1].features);

    build_training_table(Position::WideReceiver, &store, &caches, &[common::SEASON], &params()).unwrap();
    assert!(caches.maxima.contains(common::SEASON, StatFamily::ReceiverMaxima));
    let again = build_training_table(Position::WideReceiver, &store, &caches, &[common::SEASON], &params()).unwrap();
    assert_eq!(again.len(), 1);
}
