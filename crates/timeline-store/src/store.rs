use crate::source::{PlayerInfo, ScheduleRecord, SourceTables};
use core_types::{GameKey, GameRecord, PlayRecord, Side, Stat};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// The in-memory, read-only view the feature engine works from.
///
/// Player games are joined and sorted once at construction; plays are indexed
/// by every entity that can ask for them. Nothing is mutated afterwards, so a
/// `&TimelineStore` can be shared freely across worker threads.
#[derive(Debug, Default)]
pub struct TimelineStore {
    games: HashMap<String, Vec<GameRecord>>,
    plays: Vec<PlayRecord>,
    plays_by_player: HashMap<String, Vec<usize>>,
    plays_by_offense: HashMap<String, Vec<usize>>,
    plays_by_defense: HashMap<String, Vec<usize>>,
    players: HashMap<String, PlayerInfo>,
    schedules: HashMap<GameKey, Vec<ScheduleRecord>>,
    seasons: BTreeSet<i32>,
}

impl TimelineStore {
    /// Builds the store from raw tables.
    ///
    /// Weekly stats are the spine: snap share and expected-opportunity stats are
    /// left-joined onto them by (player, season, week). A weekly row with no
    /// matching snap or expected row simply lacks those stats.
    pub fn from_tables(tables: SourceTables) -> Self {
        let SourceTables { plays, weekly, snaps, opportunity, players, schedules } = tables;

        let snap_index: HashMap<(&str, i32, u8), f64> = snaps
            .iter()
            .map(|s| ((s.player_id.as_str(), s.season, s.week), s.offense_pct))
            .collect();
        let opportunity_index: HashMap<(&str, i32, u8), &_> = opportunity
            .iter()
            .map(|o| ((o.player_id.as_str(), o.season, o.week), &o.stats))
            .collect();

        let mut seasons = BTreeSet::new();
        let mut games: HashMap<String, Vec<GameRecord>> = HashMap::new();
        for row in weekly {
            let key = (row.player_id.as_str(), row.season, row.week);
            let mut stats = row.stats;
            if let Some(pct) = snap_index.get(&key) {
                stats.insert(Stat::OffensePct, *pct);
            }
            if let Some(expected) = opportunity_index.get(&key) {
                stats.extend(expected.iter().map(|(k, v)| (*k, *v)));
            }
            seasons.insert(row.season);
            games.entry(row.player_id.clone()).or_default().push(GameRecord {
                entity_id: row.player_id,
                player_name: row.player_name,
                position: row.position,
                side: Side::Offense,
                season: row.season,
                week: row.week,
                team: row.team,
                opponent_team: row.opponent_team,
                stats,
            });
        }
        for timeline in games.values_mut() {
            timeline.sort_by_key(|g| (g.season, g.week));
            timeline.dedup_by_key(|g| (g.season, g.week));
        }

        let mut plays = plays;
        plays.sort_by_key(|p| (p.season, p.week));
        let mut plays_by_player: HashMap<String, Vec<usize>> = HashMap::new();
        let mut plays_by_offense: HashMap<String, Vec<usize>> = HashMap::new();
        let mut plays_by_defense: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, play) in plays.iter().enumerate() {
            if let Some(id) = &play.rusher_player_id {
                plays_by_player.entry(id.clone()).or_default().push(i);
            }
            if let Some(id) = &play.receiver_player_id {
                if play.rusher_player_id.as_ref() != Some(id) {
                    plays_by_player.entry(id.clone()).or_default().push(i);
                }
            }
            plays_by_offense.entry(play.posteam.clone()).or_default().push(i);
            plays_by_defense.entry(play.defteam.clone()).or_default().push(i);
        }

        let mut by_week: HashMap<GameKey, Vec<ScheduleRecord>> = HashMap::new();
        for game in schedules {
            by_week.entry(GameKey::new(game.season, game.week)).or_default().push(game);
        }

        let players = players.into_iter().map(|p| (p.gsis_id.clone(), p)).collect();

        let store = Self {
            games,
            plays,
            plays_by_player,
            plays_by_offense,
            plays_by_defense,
            players,
            schedules: by_week,
            seasons,
        };
        info!(
            players = store.games.len(),
            plays = store.plays.len(),
            seasons = ?store.seasons,
            "Timeline store built"
        );
        store
    }

    pub fn seasons(&self) -> impl Iterator<Item = i32> + '_ {
        self.seasons.iter().copied()
    }

    /// Every game a player appears in, ascending by (season, week).
    pub fn player_games(&self, player_id: &str) -> &[GameRecord] {
        self.games.get(player_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All player games of one season, in no particular order.
    pub fn season_games(&self, season: i32) -> impl Iterator<Item = &GameRecord> + '_ {
        self.games
            .values()
            .flat_map(|timeline| timeline.iter())
            .filter(move |g| g.season == season)
    }

    /// All player games across the store.
    pub fn all_games(&self) -> impl Iterator<Item = &GameRecord> + '_ {
        self.games.values().flat_map(|timeline| timeline.iter())
    }

    /// Plays where the player ran the ball or was targeted.
    pub fn player_plays<'a>(&'a self, player_id: &str) -> impl Iterator<Item = &'a PlayRecord> + use<'a> {
        self.indexed(self.plays_by_player.get(player_id))
    }

    /// Plays the team ran on offense.
    pub fn offense_plays<'a>(&'a self, team: &str) -> impl Iterator<Item = &'a PlayRecord> + use<'a> {
        self.indexed(self.plays_by_offense.get(team))
    }

    /// Plays the team defended.
    pub fn defense_plays<'a>(&'a self, team: &str) -> impl Iterator<Item = &'a PlayRecord> + use<'a> {
        self.indexed(self.plays_by_defense.get(team))
    }

    pub fn plays(&self) -> &[PlayRecord] {
        &self.plays
    }

    fn indexed<'a>(&'a self, idx: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a PlayRecord> + 'a {
        idx.into_iter().flatten().map(move |&i| &self.plays[i])
    }

    /// The team `team` faces in the given week, from the schedule.
    pub fn opponent(&self, team: &str, key: GameKey) -> Option<&str> {
        self.schedules.get(&key)?.iter().find_map(|game| game.opponent_of(team))
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerInfo> {
        self.players.get(player_id)
    }

    /// A player's position: the roster table first, then the most recent weekly row.
    pub fn position_of(&self, player_id: &str) -> Option<&str> {
        self.players
            .get(player_id)
            .and_then(|p| p.position.as_deref())
            .or_else(|| {
                self.player_games(player_id)
                    .last()
                    .and_then(|g| g.position.as_deref())
            })
    }

    pub fn is_position(&self, player_id: &str, abbreviation: &str) -> bool {
        self.position_of(player_id) == Some(abbreviation)
    }
}
