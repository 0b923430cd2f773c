//! Metric definitions.
//!
//! Rushing and receiving, offense and defense variants of the play-level
//! metrics differ only in which plays count and who gets touchdown credit.
//! Those differences are data here, so every variant runs through one
//! aggregation routine.

use configuration::ScoringSettings;
use core_types::{GameRecord, PlayRecord, Stat, TouchKind, fill_missing_as_zero};

/// Red-zone boundary: plays at or inside this distance from the goal line.
pub const RED_ZONE_YARDS: f64 = 20.0;

/// Who a touchdown on a counted play is credited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TouchdownCredit {
    /// Only touchdowns scored by this player.
    Player(String),
    /// Any rushing touchdown on a rush, any passing touchdown on a target.
    AnyScorer,
}

/// Which plays a metric looks at and how it scores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub touch: TouchKind,
    pub credit: TouchdownCredit,
}

impl MetricDefinition {
    pub fn player(touch: TouchKind, player_id: &str) -> Self {
        Self { touch, credit: TouchdownCredit::Player(player_id.to_string()) }
    }

    pub fn any_scorer(touch: TouchKind) -> Self {
        Self { touch, credit: TouchdownCredit::AnyScorer }
    }

    /// Whether the play is a touch of this definition's kind, and for a
    /// player definition, whether it was that player's touch.
    pub fn counts(&self, play: &PlayRecord) -> bool {
        let (attempt, carrier) = match self.touch {
            TouchKind::Rush => (play.rush_attempt, &play.rusher_player_id),
            TouchKind::Target => (play.pass_attempt, &play.receiver_player_id),
        };
        match &self.credit {
            TouchdownCredit::Player(id) => attempt && carrier.as_deref() == Some(id.as_str()),
            TouchdownCredit::AnyScorer => attempt,
        }
    }

    pub fn credits_touchdown(&self, play: &PlayRecord) -> bool {
        match (&self.credit, self.touch) {
            (TouchdownCredit::Player(id), _) => {
                play.touchdown && play.td_player_id.as_deref() == Some(id.as_str())
            }
            (TouchdownCredit::AnyScorer, TouchKind::Rush) => play.rush_touchdown,
            (TouchdownCredit::AnyScorer, TouchKind::Target) => play.pass_touchdown,
        }
    }

    /// Fantasy points the touch produced.
    ///
    /// A target only scores when it was caught; the reception bonus is the
    /// configured points-per-reception.
    pub fn fantasy_points(&self, play: &PlayRecord, scoring: &ScoringSettings) -> f64 {
        let td = if self.credits_touchdown(play) { 1.0 } else { 0.0 };
        match self.touch {
            TouchKind::Rush => {
                play.rushing_yards.unwrap_or(play.yards_gained) * scoring.points_per_rush_yard
                    + td * scoring.points_per_rush_td
            }
            TouchKind::Target if play.complete_pass => {
                scoring.points_per_reception
                    + play.receiving_yards.unwrap_or(play.yards_gained) * scoring.points_per_rec_yard
                    + td * scoring.points_per_rec_td
            }
            TouchKind::Target => 0.0,
        }
    }
}

/// Proximity weight of a red-zone play: `20 / yardline_100`.
///
/// `None` outside the red zone, including a missing or zero yard line.
pub fn red_zone_weight(play: &PlayRecord) -> Option<f64> {
    if play.is_red_zone() {
        play.yardline_100.map(|yl| RED_ZONE_YARDS / yl)
    } else {
        None
    }
}

/// Volume weight of any touch: the red-zone weight inside the 20, else 1.
pub fn volume_weight(play: &PlayRecord) -> f64 {
    red_zone_weight(play).unwrap_or(1.0)
}

/// A game's PPR fantasy points rescored to `points_per_reception`.
///
/// `None` when the box score has no fantasy points for the game.
pub fn adjusted_fantasy_points(game: &GameRecord, points_per_reception: f64) -> Option<f64> {
    let ppr = game.stat(Stat::FantasyPointsPpr).filter(|v| !v.is_nan())?;
    let receptions = fill_missing_as_zero(game.stat(Stat::Receptions));
    Some(ppr - (1.0 - points_per_reception) * receptions)
}
