use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two positions the feature engine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    RunningBack,
    WideReceiver,
}

impl Position {
    /// The abbreviation used by the stats provider ("RB", "WR").
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for Position {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RB" => Ok(Position::RunningBack),
            "WR" => Ok(Position::WideReceiver),
            other => Err(CoreError::UnknownPosition(other.to_string())),
        }
    }
}

/// Which side of the ball an aggregate describes.
///
/// Defensive aggregates are keyed by the defending team and hold what that
/// defense allowed; their columns render with an `_against` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Offense,
    Defense,
}

/// The trailing windows the rolling aggregator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowKind {
    /// The last 3 games.
    Short,
    /// The last 6 games.
    Medium,
    /// Every game of the season so far.
    Season,
}

impl WindowKind {
    pub const ALL: [WindowKind; 3] = [WindowKind::Short, WindowKind::Medium, WindowKind::Season];

    /// Number of games in the window, `None` for the cumulative season window.
    pub fn size(&self) -> Option<usize> {
        match self {
            WindowKind::Short => Some(3),
            WindowKind::Medium => Some(6),
            WindowKind::Season => None,
        }
    }

    /// Column suffix used when the window is rendered to a flat schema.
    pub fn suffix(&self) -> &'static str {
        match self {
            WindowKind::Short => "3g_avg",
            WindowKind::Medium => "6g_avg",
            WindowKind::Season => "season_avg",
        }
    }
}

/// Controls whether the anchor game itself can contribute to its own rolling statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMode {
    /// The statistic at game `i` only sees games before `i`.
    Training,
    /// The statistic at game `i` includes game `i`; used when `i` is the most
    /// recent completed game and the projected game has not happened yet.
    Projection,
}

/// The two kinds of touch a ball carrier can get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchKind {
    Rush,
    Target,
}
