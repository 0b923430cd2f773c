use crate::bounds::StatFamily;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("No {family} bounds were computed for season {season}")]
    StaleBounds { season: i32, family: StatFamily },

    #[error("Failed to compute league bounds for season {season}: {reason}")]
    BoundsComputation { season: i32, reason: String },

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("No scheduled opponent for {team} in {season} week {week}")]
    NoOpponent { team: String, season: i32, week: u8 },

    #[error("Core type error: {0}")]
    Core(#[from] CoreError),
}
