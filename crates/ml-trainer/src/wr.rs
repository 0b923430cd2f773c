//! Wide-receiver table assembly.

use crate::error::TrainerError;
use crate::table::{
    AssemblyParams, Exclusion, LeagueCaches, Outcome, TrainingTable, history_before, latest_game, progress_bar,
    row_for,
};
use core_types::{
    AggregationMode, FeatureKey, FeatureRow, GameKey, GameRecord, Position, Stat, TimelineRecord, WindowKind,
};
use ml_features::wr::{self as metrics, LeagueMaxima, WIDE_RECEIVER};
use ml_features::{FeatureError, StatFamily, adjusted_fantasy_points, compose_receiver, season_groups};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use timeline_store::TimelineStore;
use tracing::{debug, info};

/// Windows the offense-versus-defense differentials exist for.
const DIFFERENTIAL_WINDOWS: [WindowKind; 2] = [WindowKind::Medium, WindowKind::Season];

pub fn schema() -> Vec<FeatureKey> {
    metrics::feature_schema()
}

fn above_snap_floor(game: &GameRecord, params: &AssemblyParams) -> bool {
    game.position.as_deref() == Some(WIDE_RECEIVER)
        && game.stat(Stat::OffensePct).is_some_and(|share| share > params.min_snap_share)
}

/// A receiver's kept games of `seasons` with the play-derived stats attached.
fn receiver_timeline(
    store: &TimelineStore,
    player_id: &str,
    keep: impl Fn(&GameRecord) -> bool,
    params: &AssemblyParams,
) -> Vec<GameRecord> {
    let games: Vec<GameRecord> = store
        .player_games(player_id)
        .iter()
        .filter(|g| keep(*g) && above_snap_floor(g, params))
        .cloned()
        .collect();
    metrics::with_receiver_play_stats(store, &games, &params.thresholds)
}

/// The defense's rolled aggregate for the game it played at `anchor`.
///
/// `None` when the defense has no record for that game.
fn defense_at(
    defenses: &HashMap<String, Vec<GameRecord>>,
    defense: &str,
    anchor: GameKey,
) -> Option<BTreeMap<FeatureKey, f64>> {
    let timeline = defenses.get(defense)?;
    let season_games = season_groups(timeline).find(|s| s.first().is_some_and(|g| g.season == anchor.season))?;
    let index = season_games.iter().position(|g| g.week == anchor.week)?;
    Some(metrics::receiver_defense_features(season_games, index, AggregationMode::Training))
}

fn training_row(
    defenses: &HashMap<String, Vec<GameRecord>>,
    params: &AssemblyParams,
    schema: &BTreeSet<FeatureKey>,
    season_games: &[GameRecord],
    index: usize,
    maxima: &LeagueMaxima,
) -> Outcome {
    let game = &season_games[index];
    let Some(offense) = metrics::receiver_offense_features(season_games, index, AggregationMode::Training, maxima)
    else {
        return Outcome::Excluded(Exclusion::EmptyOffenseWindow);
    };
    let Some(defense) = defense_at(defenses, &game.opponent_team, game.game_key()) else {
        return Outcome::Excluded(Exclusion::EmptyDefenseWindow);
    };
    let Some(target) = adjusted_fantasy_points(game, params.points_per_reception()) else {
        return Outcome::Excluded(Exclusion::MissingTarget);
    };

    let mut row = row_for(game, None, Some(target));
    row.features.extend(offense);
    row.features.extend(defense);
    compose_receiver(&mut row, &DIFFERENTIAL_WINDOWS);
    row.features.retain(|key, _| schema.contains(key));
    Outcome::Row(Box::new(row))
}

/// Every candidate game of one receiver across `seasons`.
fn receiver_rows(
    store: &TimelineStore,
    caches: &LeagueCaches,
    params: &AssemblyParams,
    defenses: &HashMap<String, Vec<GameRecord>>,
    schema: &BTreeSet<FeatureKey>,
    seasons: &[i32],
    player_id: &str,
) -> Result<Vec<Outcome>, TrainerError> {
    let timeline = receiver_timeline(store, player_id, |g| seasons.contains(&g.season), params);
    let mut outcomes = Vec::with_capacity(timeline.len());
    for season_games in season_groups(&timeline) {
        let Some(season) = season_games.first().map(|g| g.season) else { continue };
        let maxima = caches.maxima.get(season, StatFamily::ReceiverMaxima)?;
        for index in 0..season_games.len() {
            outcomes.push(training_row(defenses, params, schema, season_games, index, &maxima));
        }
    }
    Ok(outcomes)
}

/// Builds the wide-receiver training table for `seasons`.
pub fn build_training_table(
    store: &TimelineStore,
    caches: &LeagueCaches,
    seasons: &[i32],
    params: &AssemblyParams,
) -> Result<TrainingTable, TrainerError> {
    if seasons.is_empty() {
        return Err(TrainerError::NoSeasons);
    }
    for &season in seasons {
        if caches.maxima.contains(season, StatFamily::ReceiverMaxima) {
            debug!(season, "Receiver maxima already cached");
            continue;
        }
        metrics::season_maxima(&caches.maxima, season, store.all_games(), params.wr_min_targets)?;
    }

    let receivers: Vec<&str> = store
        .all_games()
        .filter(|g| seasons.contains(&g.season) && g.position.as_deref() == Some(WIDE_RECEIVER))
        .map(|g| g.entity_id.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let defenses = metrics::defense_timelines(store, &params.thresholds);
    let schema = schema();
    let schema_keys: BTreeSet<FeatureKey> = schema.iter().copied().collect();
    info!(
        receivers = receivers.len(),
        defenses = defenses.len(),
        ?seasons,
        ppr = params.points_per_reception(),
        "Assembling wide-receiver training table"
    );

    let progress_bar = progress_bar(receivers.len())?;
    let outcomes: Vec<Vec<Outcome>> = receivers
        .par_iter()
        .map(|id| {
            let outcomes = receiver_rows(store, caches, params, &defenses, &schema_keys, seasons, id);
            progress_bar.inc(1);
            outcomes
        })
        .collect::<Result<_, _>>()?;
    progress_bar.finish_with_message("Wide-receiver rows assembled.");

    let table = TrainingTable::from_outcomes(Position::WideReceiver, schema, outcomes.into_iter().flatten().collect());
    info!(
        rows = table.len(),
        empty_offense_window = table.exclusions.empty_offense_window,
        empty_defense_window = table.exclusions.empty_defense_window,
        missing_target = table.exclusions.missing_target,
        "Wide-receiver training table built"
    );
    Ok(table)
}

/// Features for a receiver's upcoming game at `(season, week)`.
///
/// Offensive and defensive windows both end with the last game before `week`.
pub fn build_projection_features(
    store: &TimelineStore,
    caches: &LeagueCaches,
    params: &AssemblyParams,
    player_id: &str,
    season: i32,
    week: u8,
) -> Result<FeatureRow, TrainerError> {
    let anchor = GameKey::new(season, week);
    let latest = latest_game(store, player_id, anchor)?;
    let team = latest.team.as_str();
    let opponent = store.opponent(team, anchor).ok_or_else(|| FeatureError::NoOpponent {
        team: team.to_string(),
        season,
        week,
    })?;
    let maxima = metrics::season_maxima(&caches.maxima, season, store.all_games(), params.wr_min_targets)?;

    let mut row = FeatureRow {
        entity_id: player_id.to_string(),
        player_name: latest.player_name.clone(),
        team: team.to_string(),
        opponent_team: opponent.to_string(),
        season,
        week,
        depth_chart_position: None,
        features: BTreeMap::new(),
        target: None,
    };

    let timeline = receiver_timeline(store, player_id, |g| g.game_key() < anchor, params);
    let history = history_before(&timeline, anchor);
    if let Some(offense) = metrics::receiver_offense_features(
        history,
        history.len().saturating_sub(1),
        AggregationMode::Projection,
        &maxima,
    ) {
        row.features.extend(offense);
    }

    let defenses = metrics::defense_timelines(store, &params.thresholds);
    if let Some(timeline) = defenses.get(opponent) {
        let history = history_before(timeline, anchor);
        row.features.extend(metrics::receiver_defense_features(
            history,
            history.len().saturating_sub(1),
            AggregationMode::Projection,
        ));
    }
    debug!(player_id, team, opponent, features = row.features.len(), "Projecting wide receiver");

    compose_receiver(&mut row, &DIFFERENTIAL_WINDOWS);
    let schema = schema();
    let schema_keys: BTreeSet<FeatureKey> = schema.iter().copied().collect();
    row.features.retain(|key, _| schema_keys.contains(key));
    for key in schema {
        row.features.entry(key).or_insert(0.0);
    }
    Ok(row)
}
