use crate::enums::Side;
use crate::stat::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one week of one season. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameKey {
    pub season: i32,
    pub week: u8,
}

impl GameKey {
    pub fn new(season: i32, week: u8) -> Self {
        Self { season, week }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wk{}", self.season, self.week)
    }
}

/// Who a timeline belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKey {
    /// A single player, by gsis id.
    Player(String),
    /// Everything a team did with the ball.
    Offense(String),
    /// Everything a team allowed.
    Defense(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Player(id) => write!(f, "player {id}"),
            EntityKey::Offense(team) => write!(f, "{team} offense"),
            EntityKey::Defense(team) => write!(f, "{team} defense"),
        }
    }
}

/// Anything that can be placed on an entity's timeline.
pub trait TimelineRecord {
    fn game_key(&self) -> GameKey;

    /// Whether this record belongs to `entity`'s timeline.
    fn involves(&self, entity: &EntityKey) -> bool;
}

/// One row per entity per game.
///
/// Player rows carry `Side::Offense`. Defensive aggregates reuse the same
/// shape with `Side::Defense`: `entity_id` and `team` are the defending team
/// and `opponent_team` is the offense it faced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub entity_id: String,
    pub player_name: Option<String>,
    pub position: Option<String>,
    pub side: Side,
    pub season: i32,
    pub week: u8,
    pub team: String,
    pub opponent_team: String,
    pub stats: BTreeMap<Stat, f64>,
}

impl GameRecord {
    pub fn stat(&self, stat: Stat) -> Option<f64> {
        self.stats.get(&stat).copied()
    }
}

impl TimelineRecord for GameRecord {
    fn game_key(&self) -> GameKey {
        GameKey::new(self.season, self.week)
    }

    fn involves(&self, entity: &EntityKey) -> bool {
        match (entity, self.side) {
            (EntityKey::Player(id), Side::Offense) => &self.entity_id == id,
            (EntityKey::Offense(team), Side::Offense) => &self.team == team,
            (EntityKey::Defense(team), Side::Defense) => &self.entity_id == team,
            _ => false,
        }
    }
}

/// A single snap from the play-by-play feed, reduced to the columns the
/// metrics read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub season: i32,
    pub week: u8,
    pub posteam: String,
    pub defteam: String,
    pub rush_attempt: bool,
    pub pass_attempt: bool,
    pub complete_pass: bool,
    pub rusher_player_id: Option<String>,
    pub receiver_player_id: Option<String>,
    pub td_player_id: Option<String>,
    /// Distance to the opponent's goal line.
    pub yardline_100: Option<f64>,
    pub yards_gained: f64,
    pub rushing_yards: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub touchdown: bool,
    pub rush_touchdown: bool,
    pub pass_touchdown: bool,
    pub epa: Option<f64>,
    pub success: bool,
    pub air_yards: Option<f64>,
    pub yards_after_catch: Option<f64>,
    pub yac_epa: Option<f64>,
}

impl PlayRecord {
    /// The player who touched the ball on a rush or was targeted on a pass.
    pub fn ball_carrier(&self) -> Option<&str> {
        if self.rush_attempt {
            self.rusher_player_id.as_deref()
        } else if self.pass_attempt {
            self.receiver_player_id.as_deref()
        } else {
            None
        }
    }

    pub fn is_red_zone(&self) -> bool {
        matches!(self.yardline_100, Some(yl) if yl > 0.0 && yl <= 20.0)
    }
}

impl TimelineRecord for PlayRecord {
    fn game_key(&self) -> GameKey {
        GameKey::new(self.season, self.week)
    }

    fn involves(&self, entity: &EntityKey) -> bool {
        match entity {
            EntityKey::Player(id) => {
                self.rusher_player_id.as_deref() == Some(id.as_str())
                    || self.receiver_player_id.as_deref() == Some(id.as_str())
            }
            EntityKey::Offense(team) => &self.posteam == team,
            EntityKey::Defense(team) => &self.defteam == team,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_belong_to_both_sides_of_the_ball() {
        let play = PlayRecord {
            season: 2023,
            week: 4,
            posteam: "KC".into(),
            defteam: "NYJ".into(),
            rush_attempt: true,
            rusher_player_id: Some("00-0036".into()),
            ..Default::default()
        };

        assert!(play.involves(&EntityKey::Player("00-0036".into())));
        assert!(play.involves(&EntityKey::Offense("KC".into())));
        assert!(play.involves(&EntityKey::Defense("NYJ".into())));
        assert!(!play.involves(&EntityKey::Defense("KC".into())));
        assert_eq!(play.ball_carrier(), Some("00-0036"));
    }

    #[test]
    fn goal_line_zero_is_not_red_zone() {
        let mut play = PlayRecord { yardline_100: Some(0.0), ..Default::default() };
        assert!(!play.is_red_zone());
        play.yardline_100 = Some(20.0);
        assert!(play.is_red_zone());
        play.yardline_100 = Some(21.0);
        assert!(!play.is_red_zone());
    }
}
