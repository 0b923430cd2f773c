mod common;

use configuration::ModelSettings;
use core_types::{FeatureKey, FeatureRow, Metric, Position};
use ml_trainer::{
    AssemblyParams, Exclusions, ForestRegressor, LeagueCaches, Regressor, TrainerError, TrainingTable,
    build_training_table, dataset_path, model_path, read_dataset, schema, write_dataset,
};
use std::collections::BTreeMap;
use tempfile::tempdir;

const FEATURE: FeatureKey = FeatureKey::Metric(Metric::OpportunitiesPerGame);

fn synthetic_row(i: usize) -> FeatureRow {
    let x = i as f64;
    FeatureRow {
        entity_id: format!("rb{i:02}"),
        player_name: None,
        team: "DET".into(),
        opponent_team: "GB".into(),
        season: 2023,
        week: (i % 17 + 1) as u8,
        depth_chart_position: Some(1),
        features: BTreeMap::from([(FEATURE, x)]),
        target: Some(2.0 * x),
    }
}

fn synthetic_table() -> TrainingTable {
    let rows: Vec<FeatureRow> = (0..40).map(synthetic_row).collect();
    TrainingTable {
        position: Position::RunningBack,
        schema: vec![FEATURE],
        candidates: rows.len(),
        rows,
        exclusions: Exclusions::default(),
    }
}

fn settings() -> ModelSettings {
    ModelSettings { n_trees: 10, test_size: 0.2, ..ModelSettings::default() }
}

#[test]
fn dataset_survives_a_parquet_round_trip() {
    let dir = tempdir().unwrap();
    let store = common::league();
    let caches = LeagueCaches::new();
    let params = AssemblyParams::new(6, 8, 1.0);
    let table = build_training_table(Position::RunningBack, &store, &caches, &[common::SEASON], &params).unwrap();

    let path = dataset_path(dir.path(), Position::RunningBack, &[common::SEASON], 6, 8, 1.0).unwrap();
    write_dataset(&table, &path).unwrap();
    assert!(path.ends_with("rb_ds_2323_o6d8p1.parquet"));

    let read = read_dataset(&path, Position::RunningBack, schema(Position::RunningBack)).unwrap();
    assert_eq!(read.schema, table.schema);
    assert_eq!(read.rows, table.rows);
}

#[test]
fn forest_learns_a_linear_target_and_reloads() {
    let dir = tempdir().unwrap();
    let model = ForestRegressor::fit(&synthetic_table(), &settings()).unwrap();

    let scores = model.evaluation().unwrap();
    assert_eq!(scores.n_test, 8);
    assert_eq!(scores.n_train, 32);

    let unseen = FeatureRow { features: BTreeMap::from([(FEATURE, 20.0)]), target: None, ..synthetic_row(20) };
    let predicted = model.predict(&unseen).unwrap();
    assert!((0.0..=78.0).contains(&predicted));

    let path = model_path(dir.path(), Position::RunningBack);
    model.save(&path).unwrap();
    let loaded = ForestRegressor::load(&path, Position::RunningBack).unwrap();
    assert_eq!(loaded.schema(), &[FEATURE]);
    assert_eq!(loaded.predict(&unseen).unwrap(), predicted);
    assert_eq!(loaded.evaluation(), model.evaluation());
}

#[test]
fn prediction_rejects_foreign_columns() {
    let model = ForestRegressor::fit(&synthetic_table(), &settings()).unwrap();
    let mut row = synthetic_row(3);
    row.features.insert(FeatureKey::Metric(Metric::YardsPerCarry), 4.2);

    let result = model.predict(&row);
    assert!(matches!(result, Err(TrainerError::SchemaMismatch { column, .. }) if column == FeatureKey::Metric(Metric::YardsPerCarry).column_name()));
}

#[test]
fn missing_columns_predict_as_zero() {
    let model = ForestRegressor::fit(&synthetic_table(), &settings()).unwrap();
    let empty = FeatureRow { features: BTreeMap::new(), ..synthetic_row(0) };
    let zero = FeatureRow { features: BTreeMap::from([(FEATURE, 0.0)]), ..synthetic_row(0) };
    assert_eq!(model.predict(&empty).unwrap(), model.predict(&zero).unwrap());
}

#[test]
fn loading_for_another_position_fails() {
    let dir = tempdir().unwrap();
    let path = model_path(dir.path(), Position::RunningBack);
    ForestRegressor::fit(&synthetic_table(), &settings()).unwrap().save(&path).unwrap();

    let result = ForestRegressor::load(&path, Position::WideReceiver);
    assert!(matches!(
        result,
        Err(TrainerError::PositionMismatch { expected: Position::WideReceiver, actual: Position::RunningBack })
    ));
}

#[test]
fn table_without_targets_cannot_be_fitted() {
    let mut table = synthetic_table();
    for row in &mut table.rows {
        row.target = None;
    }
    assert!(matches!(ForestRegressor::fit(&table, &settings()), Err(TrainerError::EmptyDataset)));
}
