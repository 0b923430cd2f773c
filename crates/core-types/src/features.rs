use crate::enums::{Side, WindowKind};
use crate::stat::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Window-independent metrics produced by the scorers and the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    // Player capitalization over the offense window
    YardsPerCarry,
    YardsPerTarget,
    FpointsPerCarry,
    FpointsPerTarget,
    RushingCapitalizationScore,
    ReceivingCapitalizationScore,

    // Opportunities a team gives the back at a depth rank
    OpportunitiesPerGame,
    RushesPerGame,
    TargetsPerGame,
    WeightedTargetsPerGame,
    WeightedRushesPerGame,
    FpointsPerGame,

    // Opponent defense against running backs
    EpaPerCarryAgainst,
    EpaPerTargetAgainst,
    FpointsPerCarryAgainst,
    FpointsPerTargetAgainst,
    RushingCapitalizationScoreAgainst,
    ReceivingCapitalizationScoreAgainst,

    // Offense vs defense interactions
    WeightedRushingCapitalizationScore,
    WeightedReceivingCapitalizationScore,
    ExpectedFpointsScored,
    ExpectedFpointsAllowed,
    ExpectedFpointsDifferential,
    FpointsPerOpportunity,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::YardsPerCarry => "yards_per_carry",
            Metric::YardsPerTarget => "yards_per_target",
            Metric::FpointsPerCarry => "fpoints_per_carry",
            Metric::FpointsPerTarget => "fpoints_per_target",
            Metric::RushingCapitalizationScore => "rushing_capitalization_score",
            Metric::ReceivingCapitalizationScore => "receiving_capitalization_score",
            Metric::OpportunitiesPerGame => "opportunities_per_game",
            Metric::RushesPerGame => "rushes_per_game",
            Metric::TargetsPerGame => "targets_per_game",
            Metric::WeightedTargetsPerGame => "weighted_targets_per_game",
            Metric::WeightedRushesPerGame => "weighted_rushes_per_game",
            Metric::FpointsPerGame => "fpoints_per_game",
            Metric::EpaPerCarryAgainst => "epa_per_carry_against",
            Metric::EpaPerTargetAgainst => "epa_per_target_against",
            Metric::FpointsPerCarryAgainst => "fpoints_per_carry_against",
            Metric::FpointsPerTargetAgainst => "fpoints_per_target_against",
            Metric::RushingCapitalizationScoreAgainst => "rushing_capitalization_score_against",
            Metric::ReceivingCapitalizationScoreAgainst => "receiving_capitalization_score_against",
            Metric::WeightedRushingCapitalizationScore => "weighted_rushing_capitalization_score",
            Metric::WeightedReceivingCapitalizationScore => "weighted_receiving_capitalization_score",
            Metric::ExpectedFpointsScored => "expected_fpoints_scored",
            Metric::ExpectedFpointsAllowed => "expected_fpoints_allowed",
            Metric::ExpectedFpointsDifferential => "expected_fpoints_differential",
            Metric::FpointsPerOpportunity => "fpoints_per_opportunity",
        }
    }
}

/// Ratios derived from already-rolled statistics, one value per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DerivedMetric {
    AvgDepthOfTarget,
    BigPlayConversionRate,
    YardsPerTarget,
    ReceiverQualityScore,
    BoomScore,
    WeightedTargetScore,
    TargetValueAdded,
    RacrDifferential,
    RecEpaDifferential,

    // Running-back efficiency, computed per game then rolled
    RedzoneCarryEfficiency,
    RedzoneTargetEfficiency,
    YardsPerCarry,
    SuccessfulCarryRate,
    SuccessfulTargetRate,
    ExplosiveCarryRate,
    ExplosiveReceptionRate,
    FpointsPerCarry,
    FpointsPerTarget,
}

impl DerivedMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedMetric::AvgDepthOfTarget => "avg_depth_of_target",
            DerivedMetric::BigPlayConversionRate => "big_play_conversion_rate",
            DerivedMetric::YardsPerTarget => "yards_per_target",
            DerivedMetric::ReceiverQualityScore => "receiver_quality_score",
            DerivedMetric::BoomScore => "boom_score",
            DerivedMetric::WeightedTargetScore => "weighted_target_score",
            DerivedMetric::TargetValueAdded => "target_value_added",
            DerivedMetric::RacrDifferential => "racr_differential",
            DerivedMetric::RecEpaDifferential => "rec_epa_differential",
            DerivedMetric::RedzoneCarryEfficiency => "redzone_carry_efficiency",
            DerivedMetric::RedzoneTargetEfficiency => "redzone_target_efficiency",
            DerivedMetric::YardsPerCarry => "yards_per_carry",
            DerivedMetric::SuccessfulCarryRate => "successful_carry_rate",
            DerivedMetric::SuccessfulTargetRate => "successful_target_rate",
            DerivedMetric::ExplosiveCarryRate => "explosive_carry_rate",
            DerivedMetric::ExplosiveReceptionRate => "explosive_reception_rate",
            DerivedMetric::FpointsPerCarry => "fpoints_per_carry",
            DerivedMetric::FpointsPerTarget => "fpoints_per_target",
        }
    }
}

/// Structured name of a feature column.
///
/// Kept structured everywhere inside the engine; flattened to a string only by
/// [`FeatureKey::column_name`] when a table is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKey {
    Rolling {
        stat: Stat,
        side: Side,
        window: WindowKind,
    },
    Derived {
        metric: DerivedMetric,
        window: WindowKind,
    },
    Metric(Metric),
}

impl FeatureKey {
    pub fn rolling(stat: Stat, side: Side, window: WindowKind) -> Self {
        FeatureKey::Rolling { stat, side, window }
    }

    pub fn derived(metric: DerivedMetric, window: WindowKind) -> Self {
        FeatureKey::Derived { metric, window }
    }

    pub fn column_name(&self) -> String {
        match self {
            FeatureKey::Rolling { stat, side: Side::Offense, window } => {
                format!("{}_{}", stat.as_str(), window.suffix())
            }
            FeatureKey::Rolling { stat, side: Side::Defense, window } => {
                format!("{}_against_{}", stat.as_str(), window.suffix())
            }
            FeatureKey::Derived { metric, window } => {
                format!("{}_{}", metric.as_str(), window.suffix())
            }
            FeatureKey::Metric(metric) => metric.as_str().to_string(),
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

impl From<Metric> for FeatureKey {
    fn from(metric: Metric) -> Self {
        FeatureKey::Metric(metric)
    }
}

/// One assembled row: identifying columns, feature values and the target.
///
/// A feature absent from `features` is an explicit "not enough history" value
/// and is rendered as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub entity_id: String,
    pub player_name: Option<String>,
    pub team: String,
    pub opponent_team: String,
    pub season: i32,
    pub week: u8,
    pub depth_chart_position: Option<u8>,
    pub features: BTreeMap<FeatureKey, f64>,
    pub target: Option<f64>,
}

impl FeatureRow {
    pub fn get(&self, key: &FeatureKey) -> Option<f64> {
        self.features.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<FeatureKey>, value: f64) {
        self.features.insert(key.into(), value);
    }

    /// Like `set`, but an absent value is left absent instead of written.
    pub fn set_opt(&mut self, key: impl Into<FeatureKey>, value: Option<f64>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_follow_the_flat_schema() {
        let offense = FeatureKey::rolling(Stat::Targets, Side::Offense, WindowKind::Short);
        let defense = FeatureKey::rolling(Stat::Targets, Side::Defense, WindowKind::Medium);
        let derived = FeatureKey::Derived {
            metric: DerivedMetric::RacrDifferential,
            window: WindowKind::Season,
        };

        assert_eq!(offense.column_name(), "targets_3g_avg");
        assert_eq!(defense.column_name(), "targets_against_6g_avg");
        assert_eq!(derived.column_name(), "racr_differential_season_avg");
        assert_eq!(
            FeatureKey::from(Metric::ExpectedFpointsDifferential).column_name(),
            "expected_fpoints_differential"
        );
    }
}
