//! Running-back table assembly.
//!
//! Candidates are the backs a team actually leaned on: games above the snap
//! share floor, ranked per team-game by trailing snap share, down to the
//! configured depth. Each candidate gets player, team and opponent metrics
//! over its trailing windows plus rolled weekly efficiency and opportunity.

use crate::error::TrainerError;
use crate::table::{
    AssemblyParams, Exclusion, LeagueCaches, Outcome, TrainingTable, history_before, latest_game, progress_bar,
    row_for,
};
use core_types::{
    AggregationMode, FeatureKey, FeatureRow, GameKey, GameRecord, Metric, Position, Side, Stat,
    TimelineRecord,
};
use ml_features::rb::{self as metrics, Efficiency, RUNNING_BACK, TeamOpportunities};
use ml_features::{
    CapitalizationStats, DefenseMetrics, DepthEntry, FeatureError, RollingWindow, adjusted_fantasy_points,
    StatFamily, compose_running_back, rank, rank_of, rolling_features, season_bounds, season_groups,
    with_opportunity_scores,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use timeline_store::TimelineStore;
use tracing::{debug, info};

/// Window-independent metrics, in column order.
const METRICS: [Metric; 24] = [
    Metric::YardsPerCarry,
    Metric::YardsPerTarget,
    Metric::FpointsPerCarry,
    Metric::FpointsPerTarget,
    Metric::RushingCapitalizationScore,
    Metric::ReceivingCapitalizationScore,
    Metric::OpportunitiesPerGame,
    Metric::RushesPerGame,
    Metric::TargetsPerGame,
    Metric::WeightedTargetsPerGame,
    Metric::WeightedRushesPerGame,
    Metric::FpointsPerGame,
    Metric::EpaPerCarryAgainst,
    Metric::EpaPerTargetAgainst,
    Metric::FpointsPerCarryAgainst,
    Metric::FpointsPerTargetAgainst,
    Metric::RushingCapitalizationScoreAgainst,
    Metric::ReceivingCapitalizationScoreAgainst,
    Metric::WeightedRushingCapitalizationScore,
    Metric::WeightedReceivingCapitalizationScore,
    Metric::ExpectedFpointsScored,
    Metric::ExpectedFpointsAllowed,
    Metric::ExpectedFpointsDifferential,
    Metric::FpointsPerOpportunity,
];

const ROLLED_WINDOWS: [RollingWindow; 2] = [RollingWindow::SHORT, RollingWindow::SEASON];

const OPPORTUNITY_STATS: [Stat; 2] = [Stat::RushingOpportunity, Stat::ReceivingOpportunity];

/// The running-back feature columns, in schema order.
pub fn schema() -> Vec<FeatureKey> {
    let mut keys: Vec<FeatureKey> = METRICS.iter().map(|m| FeatureKey::Metric(*m)).collect();
    for window in ROLLED_WINDOWS {
        keys.extend(Efficiency::METRICS.iter().map(|m| FeatureKey::derived(*m, window.kind)));
        keys.extend(OPPORTUNITY_STATS.iter().map(|s| FeatureKey::rolling(*s, Side::Offense, window.kind)));
    }
    keys
}

/// One back's game that may become a row.
struct Candidate<'a> {
    season_games: &'a [GameRecord],
    index: usize,
    depth: usize,
}

impl Candidate<'_> {
    fn game(&self) -> &GameRecord {
        &self.season_games[self.index]
    }
}

/// The trailing-window metrics of one (back, team, opponent, depth) at an anchor.
struct WindowMetrics {
    capitalization: Option<CapitalizationStats>,
    opportunities: Option<TeamOpportunities>,
    defense: Option<DefenseMetrics>,
}

impl WindowMetrics {
    fn collect(
        store: &TimelineStore,
        params: &AssemblyParams,
        player_id: &str,
        team: &str,
        opponent: &str,
        depth: usize,
        anchor: GameKey,
    ) -> Self {
        let GameKey { season, week } = anchor;
        Self {
            capitalization: metrics::player_capitalization(
                store,
                player_id,
                season,
                week,
                params.offense_window,
                &params.scoring,
            ),
            opportunities: metrics::team_opportunities_provided(
                store,
                team,
                depth,
                season,
                week,
                params.offense_window,
            ),
            defense: metrics::rb_defense_metrics(store, opponent, season, week, params.defense_window, &params.scoring),
        }
    }

    fn write_to(&self, row: &mut FeatureRow) {
        self.capitalization.unwrap_or_default().write_to(row);
        self.opportunities.unwrap_or_default().write_to(row);
        self.defense.unwrap_or_default().write_to(row);
        compose_running_back(row);
    }
}

/// Rolled efficiency and opportunity scores for the game at `anchor_index`.
fn rolled_features(
    store: &TimelineStore,
    caches: &LeagueCaches,
    params: &AssemblyParams,
    season_games: &[GameRecord],
    anchor_index: usize,
    mode: AggregationMode,
) -> Result<BTreeMap<FeatureKey, f64>, FeatureError> {
    let weekly = metrics::efficiency_timeline(store, season_games, &params.scoring, &params.thresholds);
    let mut features = metrics::efficiency_features(&weekly, &ROLLED_WINDOWS, anchor_index, mode);

    let scored = with_opportunity_scores(season_games, &caches.bounds)?;
    features.extend(rolling_features(
        &scored,
        &OPPORTUNITY_STATS,
        &ROLLED_WINDOWS,
        Side::Offense,
        anchor_index,
        mode,
    ));
    Ok(features)
}

/// Backs above the snap floor, ranked per team-game, down to `max_depth_rank`.
fn candidates<'a>(store: &'a TimelineStore, seasons: &[i32], params: &AssemblyParams) -> Vec<Candidate<'a>> {
    let backs: BTreeSet<&str> = store
        .all_games()
        .filter(|g| seasons.contains(&g.season) && g.position.as_deref() == Some(RUNNING_BACK))
        .map(|g| g.entity_id.as_str())
        .collect();

    let mut slots: HashMap<(&str, GameKey), (&[GameRecord], usize)> = HashMap::new();
    let mut team_games: BTreeMap<(GameKey, &str, &str), Vec<DepthEntry<&str>>> = BTreeMap::new();
    for id in backs {
        for season_games in season_groups(store.player_games(id)) {
            if !season_games.first().is_some_and(|g| seasons.contains(&g.season)) {
                continue;
            }
            for (index, game) in season_games.iter().enumerate() {
                if game.position.as_deref() != Some(RUNNING_BACK) {
                    continue;
                }
                // Games without a snap count never made the snap join.
                let Some(snap_share) = game.stat(Stat::OffensePct) else { continue };
                if snap_share <= params.min_snap_share {
                    continue;
                }
                let trailing = metrics::trailing_snap_share(season_games, index, AggregationMode::Training);
                slots.insert((id, game.game_key()), (season_games, index));
                team_games
                    .entry((game.game_key(), game.team.as_str(), game.opponent_team.as_str()))
                    .or_default()
                    .push(DepthEntry::new(id, trailing));
            }
        }
    }

    let mut out = Vec::new();
    for ((key, team, _), mut entries) in team_games {
        rank(&mut entries);
        debug!(team, %key, backs = entries.len(), "Ranked team-game depth chart");
        for (i, entry) in entries.into_iter().take(params.max_depth_rank).enumerate() {
            if let Some(&(season_games, index)) = slots.get(&(entry.entity, key)) {
                out.push(Candidate { season_games, index, depth: i + 1 });
            }
        }
    }
    out
}

fn training_row(
    store: &TimelineStore,
    caches: &LeagueCaches,
    params: &AssemblyParams,
    candidate: &Candidate<'_>,
) -> Result<Outcome, TrainerError> {
    let game = candidate.game();
    let window = WindowMetrics::collect(
        store,
        params,
        &game.entity_id,
        &game.team,
        &game.opponent_team,
        candidate.depth,
        game.game_key(),
    );
    if window.capitalization.is_none() || window.opportunities.is_none() {
        return Ok(Outcome::Excluded(Exclusion::EmptyOffenseWindow));
    }
    if window.defense.is_none() {
        return Ok(Outcome::Excluded(Exclusion::EmptyDefenseWindow));
    }
    let Some(target) = adjusted_fantasy_points(game, params.points_per_reception()) else {
        return Ok(Outcome::Excluded(Exclusion::MissingTarget));
    };

    let depth = u8::try_from(candidate.depth).ok();
    let mut row = row_for(game, depth, Some(target));
    window.write_to(&mut row);
    row.features.extend(rolled_features(
        store,
        caches,
        params,
        candidate.season_games,
        candidate.index,
        AggregationMode::Training,
    )?);
    Ok(Outcome::Row(Box::new(row)))
}

/// Builds the running-back training table for `seasons`.
///
/// Percentile bounds for every season are computed before any row is
/// assembled; rows are then built in parallel and only read the cache.
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
        if caches.bounds.contains(season, StatFamily::RunningBackOpportunity) {
            debug!(season, "Running-back bounds already cached");
            continue;
        }
        season_bounds(&caches.bounds, season, store.all_games())?;
    }

    let candidates = candidates(store, seasons, params);
    info!(
        candidates = candidates.len(),
        ?seasons,
        offense_window = params.offense_window,
        defense_window = params.defense_window,
        ppr = params.points_per_reception(),
        "Assembling running-back training table"
    );

    let progress_bar = progress_bar(candidates.len())?;
    let outcomes = candidates
        .par_iter()
        .map(|candidate| {
            let outcome = training_row(store, caches, params, candidate);
            progress_bar.inc(1);
            outcome
        })
        .collect::<Result<Vec<_>, _>>()?;
    progress_bar.finish_with_message("Running-back rows assembled.");

    let table = TrainingTable::from_outcomes(Position::RunningBack, schema(), outcomes);
    info!(
        rows = table.len(),
        empty_offense_window = table.exclusions.empty_offense_window,
        empty_defense_window = table.exclusions.empty_defense_window,
        missing_target = table.exclusions.missing_target,
        "Running-back training table built"
    );
    Ok(table)
}

/// Where the player sits among the team's backs going into `anchor`.
fn projected_depth(store: &TimelineStore, team: &str, player_id: &str, anchor: GameKey) -> usize {
    let mut backs: BTreeSet<&str> = store
        .season_games(anchor.season)
        .filter(|g| g.team == team && g.week < anchor.week && g.position.as_deref() == Some(RUNNING_BACK))
        .map(|g| g.entity_id.as_str())
        .collect();
    backs.insert(player_id);

    let mut entries: Vec<DepthEntry<&str>> = backs
        .into_iter()
        .map(|id| {
            let history = history_before(store.player_games(id), anchor);
            let share = metrics::trailing_snap_share(
                history,
                history.len().saturating_sub(1),
                AggregationMode::Projection,
            );
            DepthEntry::new(id, share)
        })
        .collect();
    rank_of(&mut entries, &player_id).unwrap_or(1)
}

/// Features for a back's upcoming game at `(season, week)`.
///
/// Every window ends before `week`; windows with no history read as zero.
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
    season_bounds(&caches.bounds, season, store.all_games())?;

    let depth = projected_depth(store, team, player_id, anchor);
    debug!(player_id, team, opponent, depth, "Projecting running back");

    let mut row = FeatureRow {
        entity_id: player_id.to_string(),
        player_name: latest.player_name.clone(),
        team: team.to_string(),
        opponent_team: opponent.to_string(),
        season,
        week,
        depth_chart_position: u8::try_from(depth).ok(),
        features: BTreeMap::new(),
        target: None,
    };
    WindowMetrics::collect(store, params, player_id, team, opponent, depth, anchor).write_to(&mut row);

    let history = history_before(store.player_games(player_id), anchor);
    row.features.extend(rolled_features(
        store,
        caches,
        params,
        history,
        history.len().saturating_sub(1),
        AggregationMode::Projection,
    )?);
    for key in schema() {
        row.features.entry(key).or_insert(0.0);
    }
    Ok(row)
}
