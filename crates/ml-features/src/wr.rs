//! Wide-receiver metrics: play-derived per-game stats, what defenses allowed
//! through the air, league maxima, and the per-window ratios built on them.

use crate::bounds::{SeasonCache, SeasonScoped, StatFamily};
use crate::error::FeatureError;
use crate::rolling::{RollingWindow, rolling_features};
use configuration::Thresholds;
use core_types::{
    AggregationMode, DerivedMetric, FeatureKey, GameRecord, PlayRecord, Side, Stat, WindowKind,
    fill_missing_as_zero, safe_ratio,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use timeline_store::TimelineStore;

pub const WIDE_RECEIVER: &str = "WR";

/// Statistics rolled over every offensive window.
pub const OFFENSE_STATS: [Stat; 20] = [
    Stat::Receptions,
    Stat::Targets,
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
    Stat::RedzoneTargets,
    Stat::BigPlayAttempts,
    Stat::YacEpa,
    Stat::RedzoneTouchdowns,
    Stat::BigPlayConversions,
    Stat::AirYardsTargeted,
    Stat::OffensePct,
    Stat::FantasyPointsPpr,
];

/// What a defense allowed, rolled over the medium and season windows.
pub const DEFENSE_STATS: [Stat; 13] = [
    Stat::Targets,
    Stat::Receptions,
    Stat::ReceivingYards,
    Stat::ReceivingTds,
    Stat::ReceivingEpa,
    Stat::Racr,
    Stat::YardsAfterCatch,
    Stat::AirYards,
    Stat::YacEpa,
    Stat::RedzoneTargets,
    Stat::BigPlayAttempts,
    Stat::RedzoneTouchdowns,
    Stat::BigPlayConversions,
];

/// Weekly box-score columns summed per defense.
const DEFENSE_WEEKLY_STATS: [Stat; 6] = [
    Stat::Targets,
    Stat::Receptions,
    Stat::ReceivingYards,
    Stat::ReceivingTds,
    Stat::ReceivingEpa,
    Stat::Racr,
];

/// Rolled offensive stats that are model features in all three windows.
const OFFENSE_FEATURES: [Stat; 13] = [
    Stat::ReceivingYards,
    Stat::ReceivingAirYards,
    Stat::ReceivingYardsAfterCatch,
    Stat::ReceivingEpa,
    Stat::Racr,
    Stat::TargetShare,
    Stat::AirYardsShare,
    Stat::Wopr,
    Stat::ReceivingFirstDowns,
    Stat::YacEpa,
    Stat::FantasyPointsPpr,
    Stat::RedzoneTargets,
    Stat::OffensePct,
];

const DERIVED_FEATURES: [DerivedMetric; 7] = [
    DerivedMetric::AvgDepthOfTarget,
    DerivedMetric::ReceiverQualityScore,
    DerivedMetric::BigPlayConversionRate,
    DerivedMetric::BoomScore,
    DerivedMetric::WeightedTargetScore,
    DerivedMetric::TargetValueAdded,
    DerivedMetric::YardsPerTarget,
];

pub const OFFENSE_WINDOWS: [RollingWindow; 3] = [RollingWindow::SHORT, RollingWindow::MEDIUM, RollingWindow::SEASON];

/// Defensive medium windows emit from the first game on.
pub fn defense_windows() -> [RollingWindow; 2] {
    [RollingWindow::MEDIUM.with_min_periods(1), RollingWindow::SEASON]
}

/// The receiver feature columns, in schema order.
pub fn feature_schema() -> Vec<FeatureKey> {
    let mut keys = Vec::new();
    for window in WindowKind::ALL {
        keys.extend(OFFENSE_FEATURES.iter().map(|s| FeatureKey::rolling(*s, Side::Offense, window)));
        keys.extend(DERIVED_FEATURES.iter().map(|m| FeatureKey::derived(*m, window)));
    }
    for window in [WindowKind::Medium, WindowKind::Season] {
        keys.extend(DEFENSE_STATS.iter().map(|s| FeatureKey::rolling(*s, Side::Defense, window)));
        keys.push(FeatureKey::derived(DerivedMetric::RacrDifferential, window));
        keys.push(FeatureKey::derived(DerivedMetric::RecEpaDifferential, window));
    }
    keys.push(FeatureKey::rolling(Stat::Targets, Side::Offense, WindowKind::Season));
    keys.push(FeatureKey::rolling(Stat::Receptions, Side::Offense, WindowKind::Season));
    keys
}

#[derive(Debug, Default, Clone, Copy)]
struct PassTotals {
    redzone_targets: f64,
    big_play_attempts: f64,
    redzone_touchdowns: f64,
    big_play_conversions: f64,
    air_yards: f64,
    yards_after_catch: f64,
    yac_epa: f64,
}

impl PassTotals {
    fn add(&mut self, play: &PlayRecord, thresholds: &Thresholds) {
        let red_zone = play.yardline_100.is_some_and(|yl| yl <= 20.0);
        let air_yards = fill_missing_as_zero(play.air_yards);
        let big_play = air_yards >= thresholds.big_play_air_yards;
        self.redzone_targets += f64::from(red_zone);
        self.big_play_attempts += f64::from(big_play);
        self.redzone_touchdowns += f64::from(red_zone && play.pass_touchdown);
        self.big_play_conversions += f64::from(big_play && play.complete_pass);
        self.air_yards += air_yards;
        self.yards_after_catch += fill_missing_as_zero(play.yards_after_catch);
        self.yac_epa += fill_missing_as_zero(play.yac_epa);
    }
}

/// Per-game totals from a receiver's targets in one game.
///
/// YAC EPA only counts completions.
pub fn receiver_game_stats<'a>(
    plays: impl IntoIterator<Item = &'a PlayRecord>,
    player_id: &str,
    thresholds: &Thresholds,
) -> BTreeMap<Stat, f64> {
    let mut totals = PassTotals::default();
    for play in plays {
        if play.pass_attempt && play.receiver_player_id.as_deref() == Some(player_id) {
            let mut counted = play.clone();
            if !play.complete_pass {
                counted.yac_epa = None;
            }
            totals.add(&counted, thresholds);
        }
    }
    BTreeMap::from([
        (Stat::RedzoneTargets, totals.redzone_targets),
        (Stat::BigPlayAttempts, totals.big_play_attempts),
        (Stat::RedzoneTouchdowns, totals.redzone_touchdowns),
        (Stat::BigPlayConversions, totals.big_play_conversions),
        (Stat::AirYardsTargeted, totals.air_yards),
        (Stat::YacEpa, totals.yac_epa),
    ])
}

/// Copies of a receiver's timeline with the play-derived stats attached.
pub fn with_receiver_play_stats(store: &TimelineStore, timeline: &[GameRecord], thresholds: &Thresholds) -> Vec<GameRecord> {
    timeline
        .iter()
        .map(|game| {
            let plays = store
                .player_plays(&game.entity_id)
                .filter(|p| p.season == game.season && p.week == game.week);
            let mut enriched = game.clone();
            enriched.stats.extend(receiver_game_stats(plays, &game.entity_id, thresholds));
            enriched
        })
        .collect()
}

/// Every defense's per-game totals allowed, keyed by the defending team.
///
/// Weekly totals sum all players facing the defense; pass-play totals come
/// from the defense's play-by-play. Each timeline is ascending by game.
pub fn defense_timelines(store: &TimelineStore, thresholds: &Thresholds) -> HashMap<String, Vec<GameRecord>> {
    let mut weekly: HashMap<(String, i32, u8), (String, BTreeMap<Stat, f64>)> = HashMap::new();
    for game in store.all_games() {
        let (_, stats) = weekly
            .entry((game.opponent_team.clone(), game.season, game.week))
            .or_insert_with(|| (game.team.clone(), BTreeMap::new()));
        for stat in DEFENSE_WEEKLY_STATS {
            *stats.entry(stat).or_insert(0.0) += fill_missing_as_zero(game.stat(stat));
        }
    }

    let mut passing: HashMap<(&str, i32, u8), PassTotals> = HashMap::new();
    for play in store.plays().iter().filter(|p| p.pass_attempt) {
        passing
            .entry((play.defteam.as_str(), play.season, play.week))
            .or_default()
            .add(play, thresholds);
    }

    let mut timelines: HashMap<String, Vec<GameRecord>> = HashMap::new();
    for ((defense, season, week), (offense, mut stats)) in weekly {
        let totals = passing
            .get(&(defense.as_str(), season, week))
            .copied()
            .unwrap_or_default();
        stats.insert(Stat::YardsAfterCatch, totals.yards_after_catch);
        stats.insert(Stat::AirYards, totals.air_yards);
        stats.insert(Stat::YacEpa, totals.yac_epa);
        stats.insert(Stat::RedzoneTargets, totals.redzone_targets);
        stats.insert(Stat::BigPlayAttempts, totals.big_play_attempts);
        stats.insert(Stat::RedzoneTouchdowns, totals.redzone_touchdowns);
        stats.insert(Stat::BigPlayConversions, totals.big_play_conversions);
        timelines.entry(defense.clone()).or_default().push(GameRecord {
            entity_id: defense.clone(),
            player_name: None,
            position: None,
            side: Side::Defense,
            season,
            week,
            team: defense,
            opponent_team: offense,
            stats,
        });
    }
    for timeline in timelines.values_mut() {
        timeline.sort_by_key(|g| (g.season, g.week));
    }
    timelines
}

/// Per-game league maxima among receivers with real volume, for one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeagueMaxima {
    pub season: i32,
    pub max_depth_of_target: f64,
    pub max_receptions_per_game: f64,
}

impl SeasonScoped for LeagueMaxima {
    fn season(&self) -> i32 {
        self.season
    }
}

impl LeagueMaxima {
    /// Receivers averaging more than `min_targets_per_game` targets count.
    pub fn from_games<'a>(
        season: i32,
        games: impl IntoIterator<Item = &'a GameRecord>,
        min_targets_per_game: f64,
    ) -> Self {
        let mut per_player: HashMap<&str, (f64, f64, f64, f64)> = HashMap::new();
        for game in games
            .into_iter()
            .filter(|g| g.season == season && g.position.as_deref() == Some(WIDE_RECEIVER))
        {
            let entry = per_player.entry(game.entity_id.as_str()).or_default();
            entry.0 += fill_missing_as_zero(game.stat(Stat::Receptions));
            entry.1 += fill_missing_as_zero(game.stat(Stat::ReceivingAirYards));
            entry.2 += fill_missing_as_zero(game.stat(Stat::Targets));
            entry.3 += 1.0;
        }

        let mut maxima = Self { season, max_depth_of_target: 0.0, max_receptions_per_game: 0.0 };
        for (receptions, air_yards, targets, games) in per_player.into_values() {
            if targets / games <= min_targets_per_game {
                continue;
            }
            maxima.max_receptions_per_game = maxima.max_receptions_per_game.max(receptions / games);
            maxima.max_depth_of_target = maxima.max_depth_of_target.max(safe_ratio(air_yards, targets));
        }
        maxima
    }
}

pub type MaximaCache = SeasonCache<LeagueMaxima>;

pub fn season_maxima<'a>(
    cache: &MaximaCache,
    season: i32,
    games: impl IntoIterator<Item = &'a GameRecord>,
    min_targets_per_game: f64,
) -> Result<Arc<LeagueMaxima>, FeatureError> {
    cache.get_or_compute(season, StatFamily::ReceiverMaxima, || {
        Ok(LeagueMaxima::from_games(season, games, min_targets_per_game))
    })
}

fn offense(features: &BTreeMap<FeatureKey, f64>, stat: Stat, window: WindowKind) -> f64 {
    fill_missing_as_zero(features.get(&FeatureKey::rolling(stat, Side::Offense, window)).copied())
}

/// Per-window receiver ratios computed from already-rolled offensive stats.
pub fn receiver_derived(
    features: &BTreeMap<FeatureKey, f64>,
    window: WindowKind,
    maxima: &LeagueMaxima,
) -> BTreeMap<FeatureKey, f64> {
    let targets = offense(features, Stat::Targets, window);
    let adot = safe_ratio(offense(features, Stat::AirYardsTargeted, window), targets);
    let bpcr = safe_ratio(
        offense(features, Stat::BigPlayConversions, window),
        offense(features, Stat::BigPlayAttempts, window),
    );
    let quality = safe_ratio(adot, maxima.max_depth_of_target)
        + safe_ratio(offense(features, Stat::Receptions, window), maxima.max_receptions_per_game);
    let boom = offense(features, Stat::ReceivingTds, window) * 4.0
        + offense(features, Stat::RedzoneTargets, window)
        + bpcr * 3.0;
    let weighted_targets =
        (offense(features, Stat::TargetShare, window) + offense(features, Stat::AirYardsShare, window)) * 1.5;

    BTreeMap::from([
        (FeatureKey::derived(DerivedMetric::AvgDepthOfTarget, window), adot),
        (FeatureKey::derived(DerivedMetric::BigPlayConversionRate, window), bpcr),
        (
            FeatureKey::derived(DerivedMetric::YardsPerTarget, window),
            safe_ratio(offense(features, Stat::ReceivingYards, window), targets),
        ),
        (FeatureKey::derived(DerivedMetric::ReceiverQualityScore, window), quality),
        (FeatureKey::derived(DerivedMetric::BoomScore, window), boom),
        (FeatureKey::derived(DerivedMetric::WeightedTargetScore, window), weighted_targets),
        (
            FeatureKey::derived(DerivedMetric::TargetValueAdded, window),
            safe_ratio(offense(features, Stat::ReceivingEpa, window), targets),
        ),
    ])
}

/// Rolled offensive stats plus the derived ratios for one anchor.
///
/// `None` when the receiver has no usable history at the anchor.
pub fn receiver_offense_features(
    season_games: &[GameRecord],
    anchor_index: usize,
    mode: AggregationMode,
    maxima: &LeagueMaxima,
) -> Option<BTreeMap<FeatureKey, f64>> {
    let mut features = rolling_features(season_games, &OFFENSE_STATS, &OFFENSE_WINDOWS, Side::Offense, anchor_index, mode);
    if features.is_empty() {
        return None;
    }
    for window in WindowKind::ALL {
        let derived = receiver_derived(&features, window, maxima);
        features.extend(derived);
    }
    Some(features)
}

/// Rolled defensive stats for one anchor of a defense's season timeline.
pub fn receiver_defense_features(
    season_games: &[GameRecord],
    anchor_index: usize,
    mode: AggregationMode,
) -> BTreeMap<FeatureKey, f64> {
    rolling_features(season_games, &DEFENSE_STATS, &defense_windows(), Side::Defense, anchor_index, mode)
}
