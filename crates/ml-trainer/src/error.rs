use core_types::Position;
use ml_features::FeatureError;
use polars::prelude::PolarsError;
use thiserror::Error;
use timeline_store::StoreError;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Feature engine error: {0}")]
    Features(#[from] FeatureError),

    #[error("Timeline store error: {0}")]
    Store(#[from] StoreError),

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize model: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Row has feature '{column}' that the {position} model was not trained on")]
    SchemaMismatch { position: Position, column: String },

    #[error("Model for {expected} cannot score a {actual} row")]
    PositionMismatch { expected: Position, actual: Position },

    #[error("Dataset has no rows with a target value")]
    EmptyDataset,

    #[error("No seasons requested")]
    NoSeasons,

    #[error("Failed to create progress bar template: {0}")]
    ProgressBarTemplate(String),
}
