use crate::error::TrainerError;
use crate::evaluation::Evaluation;
use crate::persist::{TARGET_COLUMN, to_dataframe};
use crate::table::TrainingTable;
use configuration::ModelSettings;
use core_types::{FeatureKey, FeatureRow, Position, fill_missing_as_zero};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{RandomForestRegressor, RandomForestRegressorParameters};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::model_selection::train_test_split;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Anything that scores one assembled feature row.
pub trait Regressor {
    /// The columns the model was trained on, in order.
    fn schema(&self) -> &[FeatureKey];

    fn predict(&self, row: &FeatureRow) -> Result<f64, TrainerError>;
}

/// What is saved next to the fitted forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub position: Position,
    pub schema: Vec<FeatureKey>,
    pub evaluation: Option<Evaluation>,
}

/// A random-forest regressor bound to the feature schema it was fitted on.
pub struct ForestRegressor {
    forest: Forest,
    artifact: ModelArtifact,
}

fn model_error(err: impl std::fmt::Display) -> TrainerError {
    TrainerError::Model(err.to_string())
}

/// `{dir}/{pos}_model.bin`
pub fn model_path(dir: &Path, position: Position) -> PathBuf {
    dir.join(format!("{}_model.bin", position.abbreviation().to_lowercase()))
}

/// Feature matrix and target of every row that has a target.
///
/// Absent feature values enter the model as zero.
fn design_matrix(table: &TrainingTable) -> Result<(DenseMatrix<f64>, Vec<f64>), TrainerError> {
    let df = to_dataframe(table)?.drop_nulls(Some(&[TARGET_COLUMN][..]))?;
    if df.height() == 0 {
        return Err(TrainerError::EmptyDataset);
    }
    let names: Vec<String> = table.schema.iter().map(FeatureKey::column_name).collect();
    let features = df.select(&names)?.fill_null(FillNullStrategy::Zero)?;
    let x: Array2<f64> = features.to_ndarray::<Float64Type>(IndexOrder::C)?;
    let values = x
        .as_slice()
        .ok_or_else(|| TrainerError::Model("feature matrix is not contiguous".into()))?
        .to_vec();
    let matrix = DenseMatrix::new(x.nrows(), x.ncols(), values, false).map_err(model_error)?;
    let target: Vec<f64> = df.column(TARGET_COLUMN)?.f64()?.into_no_null_iter().collect();
    Ok((matrix, target))
}

impl ForestRegressor {
    /// Fits on a shuffled split of `table` and scores the held-out part.
    pub fn fit(table: &TrainingTable, settings: &ModelSettings) -> Result<Self, TrainerError> {
        let (x, y) = design_matrix(table)?;

        let mut params = RandomForestRegressorParameters::default()
            .with_n_trees(usize::from(settings.n_trees))
            .with_min_samples_leaf(settings.min_samples_leaf)
            .with_min_samples_split(settings.min_samples_split)
            .with_seed(settings.seed);
        if let Some(depth) = settings.max_depth {
            params = params.with_max_depth(depth);
        }

        let held_out = (y.len() as f32 * settings.test_size) as usize;
        let (forest, evaluation) = if held_out == 0 || held_out >= y.len() {
            warn!(rows = y.len(), test_size = settings.test_size, "Too few rows to hold any out, fitting on all of them");
            (Forest::fit(&x, &y, params).map_err(model_error)?, None)
        } else {
            let (x_train, x_test, y_train, y_test) =
                train_test_split(&x, &y, settings.test_size, true, Some(settings.seed));
            info!(
                position = %table.position,
                features = table.schema.len(),
                train = y_train.len(),
                test = y_test.len(),
                "Fitting random forest"
            );
            let forest = Forest::fit(&x_train, &y_train, params).map_err(model_error)?;
            let predicted = forest.predict(&x_test).map_err(model_error)?;
            let evaluation = Evaluation::compute(&y_test, &predicted, y_train.len());
            (forest, evaluation)
        };
        if let Some(scores) = &evaluation {
            info!(%scores, "Model evaluated on held-out rows");
        }

        Ok(Self {
            forest,
            artifact: ModelArtifact {
                position: table.position,
                schema: table.schema.clone(),
                evaluation,
            },
        })
    }

    pub fn position(&self) -> Position {
        self.artifact.position
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.artifact.evaluation.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<(), TrainerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &(&self.forest, &self.artifact))?;
        info!(path = %path.display(), position = %self.artifact.position, "Model saved");
        Ok(())
    }

    /// Loads a model and checks it was trained for `position`.
    pub fn load(path: &Path, position: Position) -> Result<Self, TrainerError> {
        let reader = BufReader::new(File::open(path)?);
        let (forest, artifact): (Forest, ModelArtifact) = bincode::deserialize_from(reader)?;
        if artifact.position != position {
            return Err(TrainerError::PositionMismatch { expected: position, actual: artifact.position });
        }
        Ok(Self { forest, artifact })
    }
}

impl Regressor for ForestRegressor {
    fn schema(&self) -> &[FeatureKey] {
        &self.artifact.schema
    }

    /// Rejects rows carrying a feature outside the trained schema; schema
    /// features the row lacks are zero.
    fn predict(&self, row: &FeatureRow) -> Result<f64, TrainerError> {
        if let Some(unknown) = row.features.keys().find(|key| !self.artifact.schema.contains(key)) {
            return Err(TrainerError::SchemaMismatch {
                position: self.artifact.position,
                column: unknown.column_name(),
            });
        }
        let values: Vec<f64> = self
            .artifact
            .schema
            .iter()
            .map(|key| fill_missing_as_zero(row.get(key)))
            .collect();
        let x = DenseMatrix::new(1, values.len(), values, false).map_err(model_error)?;
        let predicted = self.forest.predict(&x).map_err(model_error)?;
        predicted
            .first()
            .copied()
            .ok_or_else(|| TrainerError::Model("forest returned no prediction".into()))
    }
}
