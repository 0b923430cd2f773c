//! Running-back metrics read from the timeline store.
//!
//! Every function here is anchored at `(season, week)` and only looks at the
//! trailing window before it.

use crate::capitalization::{CapitalizationStats, DefenseMetrics};
use crate::depth_chart::{DepthEntry, select_at_rank};
use crate::metric::volume_weight;
use crate::rolling::{RollingWindow, window_mean};
use crate::window::select_window;
use configuration::{ScoringSettings, Thresholds};
use core_types::{
    AggregationMode, DerivedMetric, EntityKey, FeatureKey, FeatureRow, GameKey, GameRecord, Metric,
    PlayRecord, Stat, TimelineRecord, fill_missing_as_zero, safe_ratio,
};
use std::collections::{BTreeMap, HashMap};
use timeline_store::TimelineStore;
use tracing::debug;

pub const RUNNING_BACK: &str = "RB";

/// A player's own production per touch over the offense window.
///
/// `None` when the player touched the ball in none of the window's games.
pub fn player_capitalization(
    store: &TimelineStore,
    player_id: &str,
    season: i32,
    week: u8,
    game_amt: u8,
    scoring: &ScoringSettings,
) -> Option<CapitalizationStats> {
    let plays = select_window(
        store.player_plays(player_id),
        &EntityKey::Player(player_id.to_string()),
        season,
        week,
        game_amt as i64,
    );
    if plays.is_empty() {
        return None;
    }
    Some(CapitalizationStats::for_player(&plays, player_id, scoring))
}

/// Per-game volume a team gave the back at one depth rank.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamOpportunities {
    pub opportunities_per_game: f64,
    pub rushes_per_game: f64,
    pub targets_per_game: f64,
    pub weighted_rushes_per_game: f64,
    pub weighted_targets_per_game: f64,
    pub fpoints_per_game: f64,
}

impl TeamOpportunities {
    pub fn write_to(&self, row: &mut FeatureRow) {
        row.set(Metric::OpportunitiesPerGame, self.opportunities_per_game);
        row.set(Metric::RushesPerGame, self.rushes_per_game);
        row.set(Metric::TargetsPerGame, self.targets_per_game);
        row.set(Metric::WeightedRushesPerGame, self.weighted_rushes_per_game);
        row.set(Metric::WeightedTargetsPerGame, self.weighted_targets_per_game);
        row.set(Metric::FpointsPerGame, self.fpoints_per_game);
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BackGame {
    touches: f64,
    rushes: f64,
    targets: f64,
    rush_weight: f64,
    target_weight: f64,
}

/// What a team's offense gave its running back at `depth_rank` per game.
///
/// In each game of the window the team's backs are ranked by touches and the
/// back at `depth_rank` contributes. Games where fewer backs touched the ball
/// are skipped. `None` when no game contributed.
pub fn team_opportunities_provided(
    store: &TimelineStore,
    team: &str,
    depth_rank: usize,
    season: i32,
    week: u8,
    game_amt: u8,
) -> Option<TeamOpportunities> {
    let plays = select_window(
        store.offense_plays(team),
        &EntityKey::Offense(team.to_string()),
        season,
        week,
        game_amt as i64,
    );

    let mut per_game: BTreeMap<GameKey, HashMap<&str, BackGame>> = BTreeMap::new();
    for play in plays {
        let Some(carrier) = play.ball_carrier() else { continue };
        if !store.is_position(carrier, RUNNING_BACK) {
            continue;
        }
        let entry = per_game.entry(play.game_key()).or_default().entry(carrier).or_default();
        entry.touches += 1.0;
        if play.rush_attempt {
            entry.rushes += 1.0;
            entry.rush_weight += volume_weight(play);
        } else {
            entry.targets += 1.0;
            entry.target_weight += volume_weight(play);
        }
    }

    let mut selected: Vec<(BackGame, f64)> = Vec::new();
    for (key, backs) in per_game {
        let entries: Vec<DepthEntry<&str>> =
            backs.iter().map(|(id, game)| DepthEntry::new(*id, game.touches)).collect();
        let Some(pick) = select_at_rank(entries, depth_rank) else {
            debug!(team, %key, depth_rank, "No back at depth rank, game skipped");
            continue;
        };
        let fantasy_points = store
            .player_games(pick.entity)
            .iter()
            .find(|g| g.game_key() == key)
            .map(|g| fill_missing_as_zero(g.stat(Stat::FantasyPointsPpr)))
            .unwrap_or(0.0);
        if let Some(game) = backs.get(pick.entity) {
            selected.push((*game, fantasy_points));
        }
    }

    if selected.is_empty() {
        return None;
    }
    let n = selected.len() as f64;
    let mean = |f: fn(&(BackGame, f64)) -> f64| selected.iter().map(f).sum::<f64>() / n;
    Some(TeamOpportunities {
        opportunities_per_game: mean(|(g, _)| g.touches),
        rushes_per_game: mean(|(g, _)| g.rushes),
        targets_per_game: mean(|(g, _)| g.targets),
        weighted_rushes_per_game: mean(|(g, _)| g.rush_weight),
        weighted_targets_per_game: mean(|(g, _)| g.target_weight),
        fpoints_per_game: mean(|(_, p)| *p),
    })
}

/// What `defense` allowed to opposing running backs over the defense window.
///
/// `None` when no opposing back touched the ball in the window.
pub fn rb_defense_metrics(
    store: &TimelineStore,
    defense: &str,
    season: i32,
    week: u8,
    game_amt: u8,
    scoring: &ScoringSettings,
) -> Option<DefenseMetrics> {
    let plays: Vec<&PlayRecord> = select_window(
        store.defense_plays(defense),
        &EntityKey::Defense(defense.to_string()),
        season,
        week,
        game_amt as i64,
    )
    .into_iter()
    .filter(|p| p.ball_carrier().is_some_and(|id| store.is_position(id, RUNNING_BACK)))
    .collect();
    DefenseMetrics::from_plays(&plays, scoring)
}

/// Per-game efficiency ratios of one running back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Efficiency {
    pub redzone_carry_efficiency: f64,
    pub redzone_target_efficiency: f64,
    pub yards_per_carry: f64,
    pub yards_per_target: f64,
    pub successful_carry_rate: f64,
    pub successful_target_rate: f64,
    pub explosive_carry_rate: f64,
    pub explosive_reception_rate: f64,
    pub fpoints_per_carry: f64,
    pub fpoints_per_target: f64,
}

impl Efficiency {
    pub const METRICS: [DerivedMetric; 10] = [
        DerivedMetric::RedzoneCarryEfficiency,
        DerivedMetric::RedzoneTargetEfficiency,
        DerivedMetric::YardsPerCarry,
        DerivedMetric::YardsPerTarget,
        DerivedMetric::SuccessfulCarryRate,
        DerivedMetric::SuccessfulTargetRate,
        DerivedMetric::ExplosiveCarryRate,
        DerivedMetric::ExplosiveReceptionRate,
        DerivedMetric::FpointsPerCarry,
        DerivedMetric::FpointsPerTarget,
    ];

    /// Ratios for one game: box-score volume from `game`, play detail from `plays`.
    ///
    /// Plays are the player's plays of that game. Touchdown flags count for
    /// any scorer, as the box score does.
    pub fn for_game<'a>(
        game: &GameRecord,
        plays: impl IntoIterator<Item = &'a PlayRecord>,
        scoring: &ScoringSettings,
        thresholds: &Thresholds,
    ) -> Self {
        let id = game.entity_id.as_str();
        let carries = fill_missing_as_zero(game.stat(Stat::Carries));
        let targets = fill_missing_as_zero(game.stat(Stat::Targets));

        let mut rz_carries = 0.0;
        let mut rz_carry_tds = 0.0;
        let mut rz_targets = 0.0;
        let mut rz_target_tds = 0.0;
        let mut successful_carries = 0.0;
        let mut successful_targets = 0.0;
        let mut explosive_carries = 0.0;
        let mut explosive_receptions = 0.0;
        let mut rush_points = 0.0;
        let mut rec_points = 0.0;

        for play in plays {
            let red_zone = play.yardline_100.is_some_and(|yl| yl <= 20.0);
            if play.rush_attempt && play.rusher_player_id.as_deref() == Some(id) {
                rz_carries += f64::from(red_zone);
                rz_carry_tds += f64::from(red_zone && play.rush_touchdown);
                successful_carries += f64::from(play.success);
                explosive_carries += f64::from(play.yards_gained >= thresholds.explosive_run);
                rush_points += play.yards_gained * scoring.points_per_rush_yard
                    + f64::from(play.rush_touchdown) * scoring.points_per_rush_td;
            } else if play.pass_attempt && play.receiver_player_id.as_deref() == Some(id) {
                rz_targets += f64::from(red_zone);
                rz_target_tds += f64::from(red_zone && play.pass_touchdown);
                successful_targets += f64::from(play.success);
                explosive_receptions += f64::from(play.yards_gained >= thresholds.explosive_reception);
                if play.complete_pass {
                    rec_points += scoring.points_per_reception
                        + play.yards_gained * scoring.points_per_rec_yard
                        + f64::from(play.pass_touchdown) * scoring.points_per_rec_td;
                }
            }
        }

        Self {
            redzone_carry_efficiency: safe_ratio(rz_carry_tds, rz_carries),
            redzone_target_efficiency: safe_ratio(rz_target_tds, rz_targets),
            yards_per_carry: safe_ratio(fill_missing_as_zero(game.stat(Stat::RushingYards)), carries),
            yards_per_target: safe_ratio(fill_missing_as_zero(game.stat(Stat::ReceivingYards)), targets),
            successful_carry_rate: safe_ratio(successful_carries, carries),
            successful_target_rate: safe_ratio(successful_targets, targets),
            explosive_carry_rate: safe_ratio(explosive_carries, carries),
            explosive_reception_rate: safe_ratio(explosive_receptions, targets),
            fpoints_per_carry: safe_ratio(rush_points, carries),
            fpoints_per_target: safe_ratio(rec_points, targets),
        }
    }

    /// The per-game value of one of `METRICS`; `None` for receiver metrics.
    pub fn value(&self, metric: DerivedMetric) -> Option<f64> {
        let value = match metric {
            DerivedMetric::RedzoneCarryEfficiency => self.redzone_carry_efficiency,
            DerivedMetric::RedzoneTargetEfficiency => self.redzone_target_efficiency,
            DerivedMetric::YardsPerCarry => self.yards_per_carry,
            DerivedMetric::YardsPerTarget => self.yards_per_target,
            DerivedMetric::SuccessfulCarryRate => self.successful_carry_rate,
            DerivedMetric::SuccessfulTargetRate => self.successful_target_rate,
            DerivedMetric::ExplosiveCarryRate => self.explosive_carry_rate,
            DerivedMetric::ExplosiveReceptionRate => self.explosive_reception_rate,
            DerivedMetric::FpointsPerCarry => self.fpoints_per_carry,
            DerivedMetric::FpointsPerTarget => self.fpoints_per_target,
            DerivedMetric::AvgDepthOfTarget
            | DerivedMetric::BigPlayConversionRate
            | DerivedMetric::ReceiverQualityScore
            | DerivedMetric::BoomScore
            | DerivedMetric::WeightedTargetScore
            | DerivedMetric::TargetValueAdded
            | DerivedMetric::RacrDifferential
            | DerivedMetric::RecEpaDifferential => return None,
        };
        Some(value)
    }
}

/// Weekly efficiency for every game of a season timeline, in timeline order.
pub fn efficiency_timeline(
    store: &TimelineStore,
    season_games: &[GameRecord],
    scoring: &ScoringSettings,
    thresholds: &Thresholds,
) -> Vec<Efficiency> {
    season_games
        .iter()
        .map(|game| {
            let key = game.game_key();
            let plays = store.player_plays(&game.entity_id).filter(move |p| p.game_key() == key);
            Efficiency::for_game(game, plays, scoring, thresholds)
        })
        .collect()
}

/// Rolls weekly efficiency over the given windows for one anchor.
pub fn efficiency_features(
    weekly: &[Efficiency],
    windows: &[RollingWindow],
    anchor_index: usize,
    mode: AggregationMode,
) -> BTreeMap<FeatureKey, f64> {
    let mut out = BTreeMap::new();
    for metric in Efficiency::METRICS {
        let Some(values) = weekly.iter().map(|e| e.value(metric)).collect::<Option<Vec<f64>>>() else {
            continue;
        };
        for window in windows {
            if let Some(mean) = window_mean(&values, *window, anchor_index, mode) {
                out.insert(FeatureKey::derived(metric, window.kind), mean);
            }
        }
    }
    out
}

/// Trailing short-window snap share used to rank backs before a game.
///
/// No history counts as zero so first games still get a rank.
pub fn trailing_snap_share(season_games: &[GameRecord], anchor_index: usize, mode: AggregationMode) -> f64 {
    let values: Vec<f64> = season_games
        .iter()
        .map(|g| fill_missing_as_zero(g.stat(Stat::OffensePct)))
        .collect();
    window_mean(&values, RollingWindow::SHORT, anchor_index, mode).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Side;
    use timeline_store::{PlayerInfo, SourceTables, WeeklyStatRecord};

    fn weekly(id: &str, team: &str, opponent: &str, season: i32, week: u8, stats: &[(Stat, f64)]) -> WeeklyStatRecord {
        WeeklyStatRecord {
            player_id: id.into(),
            player_name: Some(id.to_uppercase()),
            position: Some("RB".into()),
            team: team.into(),
            opponent_team: opponent.into(),
            season,
            week,
            stats: stats.iter().copied().collect(),
        }
    }

    fn rush(id: &str, team: &str, defense: &str, week: u8, yardline: f64, yards: f64, td: bool) -> PlayRecord {
        PlayRecord {
            season: 2023,
            week,
            posteam: team.into(),
            defteam: defense.into(),
            rush_attempt: true,
            rusher_player_id: Some(id.into()),
            td_player_id: td.then(|| id.to_string()),
            yardline_100: Some(yardline),
            yards_gained: yards,
            rushing_yards: Some(yards),
            touchdown: td,
            rush_touchdown: td,
            epa: Some(0.1),
            success: yards > 3.0,
            ..Default::default()
        }
    }

    fn target(id: &str, team: &str, defense: &str, week: u8, yards: f64) -> PlayRecord {
        PlayRecord {
            season: 2023,
            week,
            posteam: team.into(),
            defteam: defense.into(),
            pass_attempt: true,
            complete_pass: yards > 0.0,
            receiver_player_id: Some(id.into()),
            yardline_100: Some(50.0),
            yards_gained: yards,
            receiving_yards: (yards > 0.0).then_some(yards),
            epa: Some(0.2),
            success: yards > 5.0,
            ..Default::default()
        }
    }

    fn player(id: &str, position: &str) -> PlayerInfo {
        PlayerInfo { gsis_id: id.into(), pfr_id: None, name: None, position: Some(position.into()) }
    }

    fn store() -> TimelineStore {
        let plays = vec![
            // Week 1: lead has 3 touches, backup 1, receiver 2 (not a back).
            rush("lead", "DET", "KC", 1, 5.0, 5.0, true),
            rush("lead", "DET", "KC", 1, 40.0, 12.0, false),
            target("lead", "DET", "KC", 1, 8.0),
            rush("backup", "DET", "KC", 1, 30.0, 2.0, false),
            target("wr", "DET", "KC", 1, 20.0),
            target("wr", "DET", "KC", 1, 0.0),
            // Week 2: only the lead back touches the ball.
            rush("lead", "DET", "SEA", 2, 60.0, 4.0, false),
            rush("lead", "DET", "SEA", 2, 60.0, 6.0, false),
            // Backs against SEA from another offense.
            rush("other", "LAR", "SEA", 1, 10.0, 3.0, true),
        ];
        TimelineStore::from_tables(SourceTables {
            plays,
            weekly: vec![
                weekly("lead", "DET", "KC", 2023, 1, &[(Stat::FantasyPointsPpr, 20.0), (Stat::Carries, 2.0), (Stat::Targets, 1.0), (Stat::RushingYards, 17.0), (Stat::ReceivingYards, 8.0), (Stat::OffensePct, 0.8)]),
                weekly("lead", "DET", "SEA", 2023, 2, &[(Stat::FantasyPointsPpr, 10.0), (Stat::Carries, 2.0), (Stat::OffensePct, 0.6)]),
                weekly("backup", "DET", "KC", 2023, 1, &[(Stat::FantasyPointsPpr, 2.0), (Stat::Carries, 1.0)]),
            ],
            players: vec![player("lead", "RB"), player("backup", "RB"), player("other", "RB"), player("wr", "WR")],
            ..Default::default()
        })
    }

    #[test]
    fn team_opportunities_average_the_back_at_rank() {
        let store = store();
        let lead = team_opportunities_provided(&store, "DET", 1, 2023, 3, 6).unwrap();
        assert_eq!(lead.opportunities_per_game, 2.5);
        assert_eq!(lead.rushes_per_game, 2.0);
        assert_eq!(lead.targets_per_game, 0.5);
        // Week 1: 20/5 + 1 rush weight; week 2: 1 + 1.
        assert_eq!(lead.weighted_rushes_per_game, 3.5);
        assert_eq!(lead.fpoints_per_game, 15.0);

        // Only week 1 had a second back.
        let backup = team_opportunities_provided(&store, "DET", 2, 2023, 3, 6).unwrap();
        assert_eq!(backup.opportunities_per_game, 1.0);
        assert_eq!(backup.fpoints_per_game, 2.0);

        assert!(team_opportunities_provided(&store, "DET", 3, 2023, 3, 6).is_none());
    }

    #[test]
    fn capitalization_needs_plays_in_the_window() {
        let store = store();
        let scoring = ScoringSettings::default();
        assert!(player_capitalization(&store, "lead", 2023, 1, 6, &scoring).is_none());

        let stats = player_capitalization(&store, "lead", 2023, 2, 6, &scoring).unwrap();
        assert_eq!(stats.yards_per_carry, 8.5);
        assert_eq!(stats.rushing_capitalization_score, 0.25);
    }

    #[test]
    fn defense_metrics_only_count_opposing_backs() {
        let store = store();
        let scoring = ScoringSettings::default();
        let sea = rb_defense_metrics(&store, "SEA", 2023, 2, 8, &scoring).unwrap();
        assert_eq!(sea.epa_per_carry_against, 0.1);
        assert_eq!(sea.rushing_capitalization_score_against, 0.5);

        let kc = rb_defense_metrics(&store, "KC", 2023, 2, 8, &scoring).unwrap();
        // The receiver's targets are not a back's touches.
        assert_eq!(kc.epa_per_target_against, 0.2);
        assert!(rb_defense_metrics(&store, "KC", 2023, 1, 8, &scoring).is_none());
    }

    #[test]
    fn weekly_efficiency_guards_empty_denominators() {
        let store = store();
        let games = store.player_games("lead");
        let weekly = efficiency_timeline(&store, games, &ScoringSettings::default(), &Thresholds::default());

        assert_eq!(weekly[0].redzone_carry_efficiency, 1.0);
        assert_eq!(weekly[0].yards_per_carry, 8.5);
        assert_eq!(weekly[0].explosive_carry_rate, 0.5);
        assert_eq!(weekly[1].yards_per_target, 0.0);
        assert_eq!(weekly[1].redzone_target_efficiency, 0.0);

        let rolled = efficiency_features(&weekly, &[RollingWindow::SHORT], 2, AggregationMode::Training);
        let key = FeatureKey::derived(DerivedMetric::YardsPerCarry, core_types::WindowKind::Short);
        assert_eq!(rolled.get(&key), Some(&((8.5 + 0.0) / 2.0)));
    }

    #[test]
    fn efficiency_only_answers_for_its_own_metrics() {
        let store = store();
        let weekly = efficiency_timeline(&store, store.player_games("lead"), &ScoringSettings::default(), &Thresholds::default());

        assert_eq!(weekly[0].value(DerivedMetric::YardsPerCarry), Some(8.5));
        assert!(Efficiency::METRICS.iter().all(|m| weekly[0].value(*m).is_some()));
        assert_eq!(weekly[0].value(DerivedMetric::AvgDepthOfTarget), None);
        assert_eq!(weekly[0].value(DerivedMetric::BoomScore), None);
    }

    #[test]
    fn snap_share_rank_input_is_zero_without_history() {
        let store = store();
        let games = store.player_games("lead");
        assert_eq!(trailing_snap_share(games, 0, AggregationMode::Training), 0.0);
        assert!((trailing_snap_share(games, 2, AggregationMode::Training) - 0.7).abs() < 1e-12);
        assert_eq!(games[0].side, Side::Offense);
    }
}
