//! # Gridiron ML Trainer
//!
//! Turns the feature engine's per-anchor features into tables and models:
//! one row per candidate game for training, one row per upcoming game for
//! projection, a tree-ensemble regressor over either.
//!
//! ## Architectural Principles
//!
//! - **Pure Assembly:** table and projection builders only read an already
//!   loaded `TimelineStore` plus numeric parameters; all I/O lives in
//!   `persist` and `model`.
//! - **Warm Then Fan Out:** per-season league caches are filled before rows are
//!   assembled on the rayon pool; workers only read them.
//! - **Counted Exclusions:** a candidate without history is skipped and
//!   counted, never half-filled.
//! - **Fixed Schema:** a model remembers its feature columns and refuses rows
//!   that do not fit them.
//!
//! ## Public API
//!
//! - `build_training_table`, `build_projection_features`: per-position entry points.
//! - `TrainingTable`, `AssemblyParams`, `LeagueCaches`: assembly inputs and output.
//! - `write_dataset`, `read_dataset`, `dataset_path`: Parquet persistence.
//! - `Regressor`, `ForestRegressor`, `Evaluation`: the model and its scores.

// Declare the modules that make up this crate.
pub mod error;
pub mod evaluation;
pub mod model;
pub mod persist;
pub mod rb;
pub mod table;
pub mod wr;

// Re-export the key components to provide a clean public API.
pub use error::TrainerError;
pub use evaluation::Evaluation;
pub use model::{ForestRegressor, ModelArtifact, Regressor, model_path};
pub use persist::{TARGET_COLUMN, dataset_path, read_dataset, to_dataframe, write_dataset};
pub use table::{AssemblyParams, Exclusion, Exclusions, LeagueCaches, TrainingTable};

use core_types::{FeatureKey, FeatureRow, Position};
use timeline_store::TimelineStore;

/// The feature columns of `position`'s table, in order.
pub fn schema(position: Position) -> Vec<FeatureKey> {
    match position {
        Position::RunningBack => rb::schema(),
        Position::WideReceiver => wr::schema(),
    }
}

/// Builds the training table for one position over `seasons`.
pub fn build_training_table(
    position: Position,
    store: &TimelineStore,
    caches: &LeagueCaches,
    seasons: &[i32],
    params: &AssemblyParams,
) -> Result<TrainingTable, TrainerError> {
    match position {
        Position::RunningBack => rb::build_training_table(store, caches, seasons, params),
        Position::WideReceiver => wr::build_training_table(store, caches, seasons, params),
    }
}

/// Builds the single feature row for `player_id`'s game at `(season, week)`.
pub fn build_projection_features(
    position: Position,
    store: &TimelineStore,
    caches: &LeagueCaches,
    params: &AssemblyParams,
    player_id: &str,
    season: i32,
    week: u8,
) -> Result<FeatureRow, TrainerError> {
    match position {
        Position::RunningBack => rb::build_projection_features(store, caches, params, player_id, season, week),
        Position::WideReceiver => wr::build_projection_features(store, caches, params, player_id, season, week),
    }
}
