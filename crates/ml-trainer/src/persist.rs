//! Parquet persistence of training tables.
//!
//! Feature columns are written under their flat `FeatureKey::column_name`;
//! an absent feature is a null cell.

use crate::error::TrainerError;
use crate::table::TrainingTable;
use core_types::{FeatureKey, FeatureRow, Position};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TARGET_COLUMN: &str = "fantasy_points";

/// `{dir}/{pos}_ds_{yy}{yy}_o{off}d{def}p{ppr}.parquet`, e.g.
/// `rb_ds_2122_o6d8p1.parquet` for RBs over 2021-2022 with a 6/8 window at full PPR.
pub fn dataset_path(
    dir: &Path,
    position: Position,
    seasons: &[i32],
    offense_window: u8,
    defense_window: u8,
    points_per_reception: f64,
) -> Result<PathBuf, TrainerError> {
    let (Some(first), Some(last)) = (seasons.first(), seasons.last()) else {
        return Err(TrainerError::NoSeasons);
    };
    let file_name = format!(
        "{}_ds_{:02}{:02}_o{}d{}p{}.parquet",
        position.abbreviation().to_lowercase(),
        first.rem_euclid(100),
        last.rem_euclid(100),
        offense_window,
        defense_window,
        points_per_reception,
    );
    Ok(dir.join(file_name))
}

/// Flattens a table into a DataFrame: identifying columns, the schema in
/// order, then the target.
pub fn to_dataframe(table: &TrainingTable) -> Result<DataFrame, TrainerError> {
    let rows = &table.rows;
    let mut columns = vec![
        Series::new("player_id", rows.iter().map(|r| r.entity_id.as_str()).collect::<Vec<_>>()),
        Series::new("player_name", rows.iter().map(|r| r.player_name.as_deref()).collect::<Vec<_>>()),
        Series::new("team", rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>()),
        Series::new("opponent_team", rows.iter().map(|r| r.opponent_team.as_str()).collect::<Vec<_>>()),
        Series::new("season", rows.iter().map(|r| r.season).collect::<Vec<i32>>()),
        Series::new("week", rows.iter().map(|r| i32::from(r.week)).collect::<Vec<i32>>()),
        Series::new(
            "depth_chart_position",
            rows.iter().map(|r| r.depth_chart_position.map(i32::from)).collect::<Vec<Option<i32>>>(),
        ),
    ];
    for key in &table.schema {
        columns.push(Series::new(
            &key.column_name(),
            rows.iter().map(|r| r.get(key)).collect::<Vec<Option<f64>>>(),
        ));
    }
    columns.push(Series::new(TARGET_COLUMN, rows.iter().map(|r| r.target).collect::<Vec<Option<f64>>>()));
    Ok(DataFrame::new(columns)?)
}

pub fn write_dataset(table: &TrainingTable, path: &Path) -> Result<(), TrainerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut df = to_dataframe(table)?;
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "Dataset written");
    Ok(())
}

fn strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, TrainerError> {
    let cast = df.column(name)?.cast(&DataType::String)?;
    Ok(cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn ints(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, TrainerError> {
    let cast = df.column(name)?.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TrainerError> {
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Reads a dataset written by [`write_dataset`] back into a table.
///
/// Rows lacking an id, season or week are skipped. The schema is the given
/// position's; a missing schema column is an error.
pub fn read_dataset(path: &Path, position: Position, schema: Vec<FeatureKey>) -> Result<TrainingTable, TrainerError> {
    let df = ParquetReader::new(File::open(path)?).finish()?;

    let ids = strings(&df, "player_id")?;
    let names = strings(&df, "player_name")?;
    let teams = strings(&df, "team")?;
    let opponents = strings(&df, "opponent_team")?;
    let seasons = ints(&df, "season")?;
    let weeks = ints(&df, "week")?;
    let depths = ints(&df, "depth_chart_position")?;
    let targets = floats(&df, TARGET_COLUMN)?;
    let features = schema
        .iter()
        .map(|key| Ok((*key, floats(&df, &key.column_name())?)))
        .collect::<Result<Vec<_>, TrainerError>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(id), Some(season), Some(week)) = (&ids[i], seasons[i], weeks[i]) else { continue };
        let (Ok(season), Ok(week)) = (i32::try_from(season), u8::try_from(week)) else { continue };
        let values: BTreeMap<FeatureKey, f64> =
            features.iter().filter_map(|(key, column)| column[i].map(|v| (*key, v))).collect();
        rows.push(FeatureRow {
            entity_id: id.clone(),
            player_name: names[i].clone(),
            team: teams[i].clone().unwrap_or_default(),
            opponent_team: opponents[i].clone().unwrap_or_default(),
            season,
            week,
            depth_chart_position: depths[i].and_then(|d| u8::try_from(d).ok()),
            features: values,
            target: targets[i],
        });
    }
    info!(path = %path.display(), rows = rows.len(), "Dataset read");

    Ok(TrainingTable {
        position,
        schema,
        candidates: rows.len(),
        rows,
        exclusions: Default::default(),
    })
}
