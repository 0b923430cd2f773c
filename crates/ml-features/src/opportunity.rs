//! Normalized opportunity scores for running backs.
//!
//! Each sub-metric is divided by its league-wide 99th percentile for the
//! season, then combined with fixed weights. Scores are not clamped, so a
//! workload above the 99th percentile scores above 1 on that component.

use crate::bounds::{SeasonCache, SeasonScoped, StatFamily};
use crate::error::FeatureError;
use core_types::{GameRecord, Stat, fill_missing_as_zero, safe_ratio};
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Snap share is already a fraction; its upper bound is fixed.
pub const SNAP_SHARE_BOUND: f64 = 1.0;

const SNAP_WEIGHT: f64 = 0.30;
const VOLUME_WEIGHT: f64 = 0.25;
const YARDS_WEIGHT: f64 = 0.20;
const TOUCHDOWN_WEIGHT: f64 = 0.15;
const FIRST_DOWN_WEIGHT: f64 = 0.10;

/// Statistics that get league percentile bounds.
pub const BOUNDED_STATS: [Stat; 9] = [
    Stat::Carries,
    Stat::Targets,
    Stat::RushYardsGainedExp,
    Stat::RushTouchdownExp,
    Stat::RushFirstDownExp,
    Stat::RecYardsGainedExp,
    Stat::RecTouchdownExp,
    Stat::RecFirstDownExp,
    Stat::ReceptionsExp,
];

/// 1st and 99th percentile of a per-game statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

/// League percentile bounds of one season.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileBounds {
    pub season: i32,
    bounds: HashMap<Stat, Bound>,
}

impl SeasonScoped for PercentileBounds {
    fn season(&self) -> i32 {
        self.season
    }
}

impl PercentileBounds {
    pub fn new(season: i32, bounds: HashMap<Stat, Bound>) -> Self {
        Self { season, bounds }
    }

    /// Computes bounds from every running-back game of `season` in `games`.
    ///
    /// Games where a statistic is missing do not count toward its quantiles.
    pub fn from_games<'a>(season: i32, games: impl IntoIterator<Item = &'a GameRecord>) -> Result<Self, FeatureError> {
        let games: Vec<&GameRecord> = games
            .into_iter()
            .filter(|g| g.season == season && g.position.as_deref() == Some("RB"))
            .collect();

        let mut bounds = HashMap::with_capacity(BOUNDED_STATS.len());
        for stat in BOUNDED_STATS {
            let values: Vec<f64> = games.iter().filter_map(|g| g.stat(stat)).filter(|v| !v.is_nan()).collect();
            let lower = quantile(&values, 0.01).map_err(|e| bounds_error(season, e))?;
            let upper = quantile(&values, 0.99).map_err(|e| bounds_error(season, e))?;
            if let (Some(lower), Some(upper)) = (lower, upper) {
                bounds.insert(stat, Bound { lower, upper });
            }
        }
        Ok(Self { season, bounds })
    }

    pub fn get(&self, stat: Stat) -> Option<Bound> {
        self.bounds.get(&stat).copied()
    }

    /// 99th percentile, or zero when the season had no values (scores then use zero).
    pub fn upper(&self, stat: Stat) -> f64 {
        self.get(stat).map(|b| b.upper).unwrap_or(0.0)
    }
}

fn quantile(values: &[f64], q: f64) -> PolarsResult<Option<f64>> {
    Float64Chunked::from_vec("value", values.to_vec()).quantile(q, QuantileInterpolOptions::Nearest)
}

fn bounds_error(season: i32, err: PolarsError) -> FeatureError {
    FeatureError::BoundsComputation { season, reason: err.to_string() }
}

pub type BoundsCache = SeasonCache<PercentileBounds>;

/// Bounds for `season` from the cache, computing them from `games` if needed.
pub fn season_bounds<'a>(
    cache: &BoundsCache,
    season: i32,
    games: impl IntoIterator<Item = &'a GameRecord>,
) -> Result<Arc<PercentileBounds>, FeatureError> {
    cache.get_or_compute(season, StatFamily::RunningBackOpportunity, || {
        PercentileBounds::from_games(season, games)
    })
}

fn normalized(game: &GameRecord, stat: Stat, bounds: &PercentileBounds) -> f64 {
    safe_ratio(fill_missing_as_zero(game.stat(stat)), bounds.upper(stat))
}

fn snap_share(game: &GameRecord) -> f64 {
    fill_missing_as_zero(game.stat(Stat::OffensePct)) / SNAP_SHARE_BOUND
}

/// Bounds must belong to the game's season.
fn check_season(game: &GameRecord, bounds: &PercentileBounds) -> Result<(), FeatureError> {
    if game.season == bounds.season {
        Ok(())
    } else {
        Err(FeatureError::StaleBounds { season: game.season, family: StatFamily::RunningBackOpportunity })
    }
}

/// Composite of snap share, carries and expected rushing production.
pub fn rushing_opportunity(game: &GameRecord, bounds: &PercentileBounds) -> Result<f64, FeatureError> {
    check_season(game, bounds)?;
    Ok(SNAP_WEIGHT * snap_share(game)
        + VOLUME_WEIGHT * normalized(game, Stat::Carries, bounds)
        + YARDS_WEIGHT * normalized(game, Stat::RushYardsGainedExp, bounds)
        + TOUCHDOWN_WEIGHT * normalized(game, Stat::RushTouchdownExp, bounds)
        + FIRST_DOWN_WEIGHT * normalized(game, Stat::RushFirstDownExp, bounds))
}

/// Composite of snap share, targets and expected receiving production.
pub fn receiving_opportunity(game: &GameRecord, bounds: &PercentileBounds) -> Result<f64, FeatureError> {
    check_season(game, bounds)?;
    Ok(SNAP_WEIGHT * snap_share(game)
        + VOLUME_WEIGHT * normalized(game, Stat::Targets, bounds)
        + YARDS_WEIGHT * normalized(game, Stat::RecYardsGainedExp, bounds)
        + TOUCHDOWN_WEIGHT * normalized(game, Stat::RecTouchdownExp, bounds)
        + FIRST_DOWN_WEIGHT * normalized(game, Stat::RecFirstDownExp, bounds))
}

/// Copies of a timeline with both opportunity scores attached as stats, so
/// they can be rolled like any other column.
pub fn with_opportunity_scores(timeline: &[GameRecord], bounds: &BoundsCache) -> Result<Vec<GameRecord>, FeatureError> {
    timeline
        .iter()
        .map(|game| {
            let season_bounds = bounds.get(game.season, StatFamily::RunningBackOpportunity)?;
            let mut scored = game.clone();
            scored.stats.insert(Stat::RushingOpportunity, rushing_opportunity(game, &season_bounds)?);
            scored.stats.insert(Stat::ReceivingOpportunity, receiving_opportunity(game, &season_bounds)?);
            Ok(scored)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Side;
    use std::collections::BTreeMap;

    fn rb_game(season: i32, week: u8, stats: &[(Stat, f64)]) -> GameRecord {
        GameRecord {
            entity_id: format!("rb{week}"),
            player_name: None,
            position: Some("RB".into()),
            side: Side::Offense,
            season,
            week,
            team: "DAL".into(),
            opponent_team: "NYG".into(),
            stats: stats.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    fn flat_bounds(season: i32) -> PercentileBounds {
        let bounds = BOUNDED_STATS
            .iter()
            .map(|s| (*s, Bound { lower: 0.0, upper: 10.0 }))
            .collect();
        PercentileBounds::new(season, bounds)
    }

    #[test]
    fn weights_sum_to_one_at_the_bounds() {
        let game = rb_game(
            2023,
            1,
            &[
                (Stat::OffensePct, 1.0),
                (Stat::Carries, 10.0),
                (Stat::RushYardsGainedExp, 10.0),
                (Stat::RushTouchdownExp, 10.0),
                (Stat::RushFirstDownExp, 10.0),
            ],
        );
        let score = rushing_opportunity(&game, &flat_bounds(2023)).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scores_are_not_clamped() {
        let game = rb_game(2023, 1, &[(Stat::Targets, 20.0)]);
        let score = receiving_opportunity(&game, &flat_bounds(2023)).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bounds_from_another_season_are_rejected() {
        let game = rb_game(2023, 1, &[(Stat::Carries, 5.0)]);
        assert!(matches!(
            rushing_opportunity(&game, &flat_bounds(2022)),
            Err(FeatureError::StaleBounds { season: 2023, .. })
        ));
    }

    #[test]
    fn percentiles_come_from_the_requested_season_only() {
        let mut games: Vec<_> = (1..=100u8)
            .map(|w| rb_game(2023, w, &[(Stat::Carries, w as f64)]))
            .collect();
        games.push(rb_game(2022, 1, &[(Stat::Carries, 500.0)]));

        let bounds = PercentileBounds::from_games(2023, &games).unwrap();
        let carries = bounds.get(Stat::Carries).unwrap();
        assert!(carries.upper >= 98.0 && carries.upper <= 100.0);
        assert!(carries.lower >= 1.0 && carries.lower <= 3.0);
        assert_eq!(bounds.get(Stat::ReceptionsExp), None);
        assert_eq!(bounds.upper(Stat::ReceptionsExp), 0.0);
    }

    #[test]
    fn scored_timeline_needs_warmed_bounds() {
        let cache = BoundsCache::new();
        let timeline = vec![rb_game(2023, 1, &[(Stat::Carries, 12.0)])];
        assert!(with_opportunity_scores(&timeline, &cache).is_err());

        season_bounds(&cache, 2023, &timeline).unwrap();
        let scored = with_opportunity_scores(&timeline, &cache).unwrap();
        assert!(scored[0].stat(Stat::RushingOpportunity).is_some());
    }
}
