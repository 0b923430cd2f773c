use crate::error::StoreError;
use core_types::{PlayRecord, Stat};
use std::collections::BTreeMap;
use tracing::warn;

/// One row of the weekly player-stats table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStatRecord {
    pub player_id: String,
    pub player_name: Option<String>,
    pub position: Option<String>,
    pub team: String,
    pub opponent_team: String,
    pub season: i32,
    pub week: u8,
    pub stats: BTreeMap<Stat, f64>,
}

/// Share of offensive snaps a player was on the field for, as a fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapCountRecord {
    /// gsis id, already mapped from the provider's own player id.
    pub player_id: String,
    pub season: i32,
    pub week: u8,
    pub offense_pct: f64,
}

/// Expected-opportunity model outputs for one player-game.
#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityRecord {
    pub player_id: String,
    pub season: i32,
    pub week: u8,
    pub stats: BTreeMap<Stat, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub gsis_id: String,
    pub pfr_id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub season: i32,
    pub week: u8,
    pub home_team: String,
    pub away_team: String,
}

impl ScheduleRecord {
    /// The team `team` plays in this game, if it plays in it at all.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home_team == team {
            Some(&self.away_team)
        } else if self.away_team == team {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

/// Every source table the engine consumes, already loaded.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub plays: Vec<PlayRecord>,
    pub weekly: Vec<WeeklyStatRecord>,
    pub snaps: Vec<SnapCountRecord>,
    pub opportunity: Vec<OpportunityRecord>,
    pub players: Vec<PlayerInfo>,
    pub schedules: Vec<ScheduleRecord>,
}

/// Provides the raw tables for a set of seasons.
///
/// Implementations do their own I/O; everything downstream of `load_tables`
/// works on in-memory records only.
pub trait DataSource {
    fn plays(&self, seasons: &[i32]) -> Result<Vec<PlayRecord>, StoreError>;
    fn weekly_stats(&self, seasons: &[i32]) -> Result<Vec<WeeklyStatRecord>, StoreError>;
    fn snap_counts(&self, seasons: &[i32]) -> Result<Vec<SnapCountRecord>, StoreError>;
    fn expected_opportunity(&self, seasons: &[i32]) -> Result<Vec<OpportunityRecord>, StoreError>;
    fn players(&self) -> Result<Vec<PlayerInfo>, StoreError>;
    fn schedules(&self, seasons: &[i32]) -> Result<Vec<ScheduleRecord>, StoreError>;

    /// Loads every table for `seasons` in one go.
    fn load_tables(&self, seasons: &[i32]) -> Result<SourceTables, StoreError> {
        if seasons.is_empty() {
            return Err(StoreError::NoSeasons);
        }
        Ok(SourceTables {
            plays: self.plays(seasons)?,
            weekly: self.weekly_stats(seasons)?,
            snaps: self.snap_counts(seasons)?,
            opportunity: self.expected_opportunity(seasons)?,
            players: self.players()?,
            schedules: self.schedules(seasons)?,
        })
    }

    /// Loads `seasons` plus the season before the earliest of them.
    ///
    /// Trailing windows early in a season reach back into the previous one. When
    /// that season has no tables the requested seasons are loaded on their own.
    fn load_tables_with_history(&self, seasons: &[i32]) -> Result<SourceTables, StoreError> {
        if seasons.is_empty() {
            return Err(StoreError::NoSeasons);
        }
        match self.load_tables(&with_previous_season(seasons)) {
            Err(StoreError::MissingTable { path, .. }) => {
                warn!(path = %path.display(), "Previous-season tables unavailable; windows will not spill over");
                self.load_tables(seasons)
            }
            loaded => loaded,
        }
    }
}

/// `seasons` sorted and deduplicated, preceded by the season before the earliest.
pub fn with_previous_season(seasons: &[i32]) -> Vec<i32> {
    let mut all = seasons.to_vec();
    if let Some(&first) = seasons.iter().min() {
        all.push(first - 1);
    }
    all.sort_unstable();
    all.dedup();
    all
}

/// Already-loaded tables act as a data source filtered by season.
impl DataSource for SourceTables {
    fn plays(&self, seasons: &[i32]) -> Result<Vec<PlayRecord>, StoreError> {
        Ok(self.plays.iter().filter(|p| seasons.contains(&p.season)).cloned().collect())
    }

    fn weekly_stats(&self, seasons: &[i32]) -> Result<Vec<WeeklyStatRecord>, StoreError> {
        Ok(self.weekly.iter().filter(|r| seasons.contains(&r.season)).cloned().collect())
    }

    fn snap_counts(&self, seasons: &[i32]) -> Result<Vec<SnapCountRecord>, StoreError> {
        Ok(self.snaps.iter().filter(|r| seasons.contains(&r.season)).cloned().collect())
    }

    fn expected_opportunity(&self, seasons: &[i32]) -> Result<Vec<OpportunityRecord>, StoreError> {
        Ok(self.opportunity.iter().filter(|r| seasons.contains(&r.season)).cloned().collect())
    }

    fn players(&self) -> Result<Vec<PlayerInfo>, StoreError> {
        Ok(self.players.clone())
    }

    fn schedules(&self, seasons: &[i32]) -> Result<Vec<ScheduleRecord>, StoreError> {
        Ok(self.schedules.iter().filter(|r| seasons.contains(&r.season)).cloned().collect())
    }
}
