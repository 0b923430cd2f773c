//! # Gridiron ML Features
//!
//! The temporal feature engine. Everything here turns the timeline store's
//! per-game and per-play records into features for one anchor game without
//! ever looking at that game or anything after it.
//!
//! ## Architectural Principles
//!
//! - **Pure Functions:** selectors, rolling means, scorers and composers take
//!   records and parameters and return values. Only the league caches hold
//!   state, and they are injected by the caller.
//! - **One Aggregation, Many Variants:** rushing and receiving, offense and
//!   defense metrics are `MetricDefinition` values run through the same code.
//! - **Explicit Absence:** a window without enough history yields no value,
//!   never a partial average. Ratios with an empty denominator are zero.
//!
//! ## Public API
//!
//! - `select_window`, `window_weeks`: the trailing-window rule with spillover.
//! - `rolling_stat`, `rolling_features`, `RollingWindow`: season-scoped means.
//! - `CapitalizationStats`, `DefenseMetrics`, `rushing_opportunity`,
//!   `receiving_opportunity`: play and game scorers.
//! - `SeasonCache`, `BoundsCache`, `MaximaCache`: per-season league normalizers.
//! - `compose_running_back`, `compose_receiver`: offense-versus-defense columns.
//! - `select_at_rank`: depth-chart selection.
//! - `rb`, `wr`: position-specific metrics over the store.

// Declare the modules that make up this crate.
pub mod bounds;
pub mod capitalization;
pub mod depth_chart;
pub mod differential;
pub mod error;
pub mod metric;
pub mod opportunity;
pub mod rb;
pub mod rolling;
pub mod window;
pub mod wr;

// Re-export the key components to provide a clean public API.
pub use bounds::{SeasonCache, SeasonScoped, StatFamily};
pub use capitalization::{CapitalizationStats, DefenseMetrics, TouchSummary, capitalization_score};
pub use depth_chart::{DepthEntry, rank, rank_of, select_at_rank};
pub use differential::{compose_receiver, compose_running_back, expected_points, expected_points_differential};
pub use error::FeatureError;
pub use metric::{MetricDefinition, TouchdownCredit, adjusted_fantasy_points, red_zone_weight, volume_weight};
pub use opportunity::{
    BoundsCache, PercentileBounds, receiving_opportunity, rushing_opportunity, season_bounds,
    with_opportunity_scores,
};
pub use rolling::{RollingWindow, rolling_features, rolling_stat, season_groups, window_mean};
pub use window::{clamp_game_amt, select_window, window_weeks};
pub use wr::{LeagueMaxima, MaximaCache};
