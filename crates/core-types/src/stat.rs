use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every per-game statistic the engine reads or rolls.
///
/// The string form is the column name used by the stats provider, so a
/// `Stat` round-trips through a Parquet schema without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    // Weekly box-score columns
    Carries,
    Targets,
    Receptions,
    RushingYards,
    RushingTds,
    ReceivingYards,
    ReceivingTds,
    ReceivingAirYards,
    ReceivingYardsAfterCatch,
    ReceivingFirstDowns,
    ReceivingEpa,
    Racr,
    TargetShare,
    AirYardsShare,
    Wopr,
    FantasyPointsPpr,

    // Snap counts
    OffensePct,

    // Expected-opportunity model outputs
    RushYardsGainedExp,
    RushTouchdownExp,
    RushFirstDownExp,
    RecYardsGainedExp,
    RecTouchdownExp,
    RecFirstDownExp,
    ReceptionsExp,

    // Per-game totals derived from play-by-play
    RedzoneTargets,
    BigPlayAttempts,
    RedzoneTouchdowns,
    BigPlayConversions,
    AirYardsTargeted,
    YardsAfterCatch,
    AirYards,
    YacEpa,

    // Composite scores
    RushingOpportunity,
    ReceivingOpportunity,
}

impl Stat {
    /// Columns read from the weekly player-stats table.
    pub const WEEKLY: [Stat; 16] = [
        Stat::Carries,
        Stat::Targets,
        Stat::Receptions,
        Stat::RushingYards,
        Stat::RushingTds,
        Stat::ReceivingYards,
        Stat::ReceivingTds,
        Stat::ReceivingAirYards,
        Stat::ReceivingYardsAfterCatch,
        Stat::ReceivingFirstDowns,
        Stat::ReceivingEpa,
        Stat::Racr,
        Stat::TargetShare,
        Stat::AirYardsShare,
        Stat::Wopr,
        Stat::FantasyPointsPpr,
    ];

    /// Columns read from the weekly expected-opportunity table.
    pub const EXPECTED: [Stat; 7] = [
        Stat::RushYardsGainedExp,
        Stat::RushTouchdownExp,
        Stat::RushFirstDownExp,
        Stat::RecYardsGainedExp,
        Stat::RecTouchdownExp,
        Stat::RecFirstDownExp,
        Stat::ReceptionsExp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Carries => "carries",
            Stat::Targets => "targets",
            Stat::Receptions => "receptions",
            Stat::RushingYards => "rushing_yards",
            Stat::RushingTds => "rushing_tds",
            Stat::ReceivingYards => "receiving_yards",
            Stat::ReceivingTds => "receiving_tds",
            Stat::ReceivingAirYards => "receiving_air_yards",
            Stat::ReceivingYardsAfterCatch => "receiving_yards_after_catch",
            Stat::ReceivingFirstDowns => "receiving_first_downs",
            Stat::ReceivingEpa => "receiving_epa",
            Stat::Racr => "racr",
            Stat::TargetShare => "target_share",
            Stat::AirYardsShare => "air_yards_share",
            Stat::Wopr => "wopr",
            Stat::FantasyPointsPpr => "fantasy_points_ppr",
            Stat::OffensePct => "offense_pct",
            Stat::RushYardsGainedExp => "rush_yards_gained_exp",
            Stat::RushTouchdownExp => "rush_touchdown_exp",
            Stat::RushFirstDownExp => "rush_first_down_exp",
            Stat::RecYardsGainedExp => "rec_yards_gained_exp",
            Stat::RecTouchdownExp => "rec_touchdown_exp",
            Stat::RecFirstDownExp => "rec_first_down_exp",
            Stat::ReceptionsExp => "receptions_exp",
            Stat::RedzoneTargets => "redzone_targets",
            Stat::BigPlayAttempts => "big_play_attempts",
            Stat::RedzoneTouchdowns => "redzone_touchdowns",
            Stat::BigPlayConversions => "big_play_conversions",
            Stat::AirYardsTargeted => "air_yards_targeted",
            Stat::YardsAfterCatch => "yards_after_catch",
            Stat::AirYards => "air_yards",
            Stat::YacEpa => "yac_epa",
            Stat::RushingOpportunity => "rushing_opportunity",
            Stat::ReceivingOpportunity => "receiving_opportunity",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stat = match s {
            "carries" => Stat::Carries,
            "targets" => Stat::Targets,
            "receptions" => Stat::Receptions,
            "rushing_yards" => Stat::RushingYards,
            "rushing_tds" => Stat::RushingTds,
            "receiving_yards" => Stat::ReceivingYards,
            "receiving_tds" => Stat::ReceivingTds,
            "receiving_air_yards" => Stat::ReceivingAirYards,
            "receiving_yards_after_catch" => Stat::ReceivingYardsAfterCatch,
            "receiving_first_downs" => Stat::ReceivingFirstDowns,
            "receiving_epa" => Stat::ReceivingEpa,
            "racr" => Stat::Racr,
            "target_share" => Stat::TargetShare,
            "air_yards_share" => Stat::AirYardsShare,
            "wopr" => Stat::Wopr,
            "fantasy_points_ppr" => Stat::FantasyPointsPpr,
            "offense_pct" => Stat::OffensePct,
            "rush_yards_gained_exp" => Stat::RushYardsGainedExp,
            "rush_touchdown_exp" => Stat::RushTouchdownExp,
            "rush_first_down_exp" => Stat::RushFirstDownExp,
            "rec_yards_gained_exp" => Stat::RecYardsGainedExp,
            "rec_touchdown_exp" => Stat::RecTouchdownExp,
            "rec_first_down_exp" => Stat::RecFirstDownExp,
            "receptions_exp" => Stat::ReceptionsExp,
            "redzone_targets" => Stat::RedzoneTargets,
            "big_play_attempts" => Stat::BigPlayAttempts,
            "redzone_touchdowns" => Stat::RedzoneTouchdowns,
            "big_play_conversions" => Stat::BigPlayConversions,
            "air_yards_targeted" => Stat::AirYardsTargeted,
            "yards_after_catch" => Stat::YardsAfterCatch,
            "air_yards" => Stat::AirYards,
            "yac_epa" => Stat::YacEpa,
            "rushing_opportunity" => Stat::RushingOpportunity,
            "receiving_opportunity" => Stat::ReceivingOpportunity,
            other => return Err(CoreError::UnknownStat(other.to_string())),
        };
        Ok(stat)
    }
}
