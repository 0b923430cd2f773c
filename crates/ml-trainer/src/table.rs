use crate::error::TrainerError;
use configuration::{Config, ScoringSettings, Thresholds};
use core_types::{FeatureKey, FeatureRow, GameKey, GameRecord, Position, TimelineRecord};
use indicatif::{ProgressBar, ProgressStyle};
use ml_features::{BoundsCache, FeatureError, MaximaCache, clamp_game_amt};
use timeline_store::TimelineStore;

/// Numeric inputs of one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyParams {
    /// Games averaged for offensive metrics, already clamped to a season.
    pub offense_window: u8,
    /// Games averaged for the opponent's defensive metrics.
    pub defense_window: u8,
    pub max_depth_rank: usize,
    pub min_snap_share: f64,
    pub wr_min_targets: f64,
    /// Scoring rules; `points_per_reception` also sets the target's PPR.
    pub scoring: ScoringSettings,
    pub thresholds: Thresholds,
}

impl AssemblyParams {
    /// Defaults with the three values that name a dataset overridden.
    pub fn new(offense_window: i64, defense_window: i64, points_per_reception: f64) -> Self {
        let mut params = Self::from_config(&Config::default());
        params.offense_window = clamp_game_amt(offense_window);
        params.defense_window = clamp_game_amt(defense_window);
        params.scoring.points_per_reception = points_per_reception;
        params
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            offense_window: clamp_game_amt(i64::from(config.features.offense_window)),
            defense_window: clamp_game_amt(i64::from(config.features.defense_window)),
            max_depth_rank: config.features.max_depth_rank,
            min_snap_share: config.features.min_snap_share,
            wr_min_targets: config.features.wr_min_targets_for_league_average,
            scoring: config.scoring.clone(),
            thresholds: config.thresholds.clone(),
        }
    }

    pub fn points_per_reception(&self) -> f64 {
        self.scoring.points_per_reception
    }
}

/// The per-season caches shared by every assembly run over one store.
#[derive(Debug, Default)]
pub struct LeagueCaches {
    pub bounds: BoundsCache,
    pub maxima: MaximaCache,
}

impl LeagueCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything, e.g. after the underlying store was rebuilt.
    pub fn reset(&self) {
        self.bounds.reset();
        self.maxima.reset();
    }
}

/// Why a candidate game did not become a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    EmptyOffenseWindow,
    EmptyDefenseWindow,
    MissingTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exclusions {
    pub empty_offense_window: usize,
    pub empty_defense_window: usize,
    pub missing_target: usize,
}

impl Exclusions {
    pub fn record(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::EmptyOffenseWindow => self.empty_offense_window += 1,
            Exclusion::EmptyDefenseWindow => self.empty_defense_window += 1,
            Exclusion::MissingTarget => self.missing_target += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.empty_offense_window + self.empty_defense_window + self.missing_target
    }
}

/// What one candidate turned into.
#[derive(Debug)]
pub(crate) enum Outcome {
    Row(Box<FeatureRow>),
    Excluded(Exclusion),
}

/// A training table: one row per candidate game that had enough history.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub position: Position,
    /// Feature columns, in column order.
    pub schema: Vec<FeatureKey>,
    pub rows: Vec<FeatureRow>,
    /// Candidate games considered, kept or not.
    pub candidates: usize,
    pub exclusions: Exclusions,
}

impl TrainingTable {
    pub(crate) fn from_outcomes(position: Position, schema: Vec<FeatureKey>, outcomes: Vec<Outcome>) -> Self {
        let candidates = outcomes.len();
        let mut rows = Vec::with_capacity(candidates);
        let mut exclusions = Exclusions::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Row(row) => rows.push(*row),
                Outcome::Excluded(reason) => exclusions.record(reason),
            }
        }
        rows.sort_by(|a, b| (a.season, a.week, &a.entity_id).cmp(&(b.season, b.week, &b.entity_id)));
        Self { position, schema, rows, candidates, exclusions }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An empty row for `game`, identified the same way in training and projection.
pub(crate) fn row_for(game: &GameRecord, depth_chart_position: Option<u8>, target: Option<f64>) -> FeatureRow {
    FeatureRow {
        entity_id: game.entity_id.clone(),
        player_name: game.player_name.clone(),
        team: game.team.clone(),
        opponent_team: game.opponent_team.clone(),
        season: game.season,
        week: game.week,
        depth_chart_position,
        features: Default::default(),
        target,
    }
}

/// An entity's games of the anchor season strictly before the anchor week.
pub(crate) fn history_before(games: &[GameRecord], anchor: GameKey) -> &[GameRecord] {
    let end = games.partition_point(|g| g.game_key() < anchor);
    let start = games[..end].partition_point(|g| g.season < anchor.season);
    &games[start..end]
}

/// The player's most recent game before the anchor, else their latest game.
pub(crate) fn latest_game<'a>(store: &'a TimelineStore, player_id: &str, anchor: GameKey) -> Result<&'a GameRecord, FeatureError> {
    let games = store.player_games(player_id);
    games
        .iter()
        .rev()
        .find(|g| g.game_key() < anchor)
        .or_else(|| games.last())
        .ok_or_else(|| FeatureError::UnknownPlayer(player_id.to_string()))
}

pub(crate) fn progress_bar(len: usize) -> Result<ProgressBar, TrainerError> {
    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map_err(|e| TrainerError::ProgressBarTemplate(e.to_string()))?
            .progress_chars("=>-"),
    );
    Ok(progress_bar)
}
