use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub features: FeatureSettings,
    pub scoring: ScoringSettings,
    pub thresholds: Thresholds,
    pub model: ModelSettings,
    pub paths: Paths,
}

/// Window sizes and row filters for dataset assembly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Games averaged for offensive (player and team) metrics.
    pub offense_window: u8,
    /// Games averaged for the opponent's defensive metrics.
    pub defense_window: u8,
    /// Deepest running-back depth-chart rank that gets a training row.
    pub max_depth_rank: usize,
    /// Games at or below this snap share are dropped before assembly.
    pub min_snap_share: f64,
    /// A receiver needs more targets per game than this to count toward league maxima.
    pub wr_min_targets_for_league_average: f64,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            offense_window: 6,
            defense_window: 8,
            max_depth_rank: 2,
            min_snap_share: 0.05,
            wr_min_targets_for_league_average: 2.0,
        }
    }
}

/// Fantasy scoring rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub points_per_reception: f64,
    pub points_per_rush_yard: f64,
    pub points_per_rush_td: f64,
    pub points_per_rec_yard: f64,
    pub points_per_rec_td: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_reception: 1.0,
            points_per_rush_yard: 0.1,
            points_per_rush_td: 6.0,
            points_per_rec_yard: 0.1,
            points_per_rec_td: 6.0,
        }
    }
}

/// Yardage cutoffs for "explosive" and "big" plays.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub explosive_run: f64,
    pub explosive_reception: f64,
    pub big_play_air_yards: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            explosive_run: 10.0,
            explosive_reception: 12.0,
            big_play_air_yards: 20.0,
        }
    }
}

/// Hyperparameters for the tree-ensemble regressor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub n_trees: u16,
    pub max_depth: Option<u16>,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    /// Fraction of rows held out for evaluation.
    pub test_size: f32,
    pub seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: Some(8),
            min_samples_leaf: 5,
            min_samples_split: 2,
            test_size: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Directory holding the per-season source tables.
    pub data_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dataset_dir: PathBuf::from("datasets"),
            model_dir: PathBuf::from("models"),
        }
    }
}

/// Command-line overrides for the values most often varied between runs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Overrides {
    /// Games averaged for offensive metrics.
    #[cfg_attr(feature = "clap", arg(long))]
    pub offense_window: Option<u8>,
    /// Games averaged for defensive metrics.
    #[cfg_attr(feature = "clap", arg(long))]
    pub defense_window: Option<u8>,
    /// Points per reception.
    #[cfg_attr(feature = "clap", arg(long))]
    pub ppr: Option<f64>,
}

impl Config {
    /// Applies any overrides that were actually given.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(window) = overrides.offense_window {
            self.features.offense_window = window;
        }
        if let Some(window) = overrides.defense_window {
            self.features.defense_window = window;
        }
        if let Some(ppr) = overrides.ppr {
            self.scoring.points_per_reception = ppr;
        }
    }
}
