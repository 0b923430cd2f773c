use crate::error::StoreError;
use crate::source::{
    DataSource, OpportunityRecord, PlayerInfo, ScheduleRecord, SnapCountRecord, WeeklyStatRecord,
};
use core_types::{PlayRecord, Stat};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads the source tables from a directory of Parquet files.
///
/// Expected layout:
/// - `pbp_{season}.parquet`
/// - `player_stats_{season}.parquet`
/// - `snap_counts_{season}.parquet`
/// - `ff_opportunity_{season}.parquet`
/// - `players.parquet`
/// - `schedules.parquet`
#[derive(Debug, Clone)]
pub struct ParquetDataSource {
    data_dir: PathBuf,
}

impl ParquetDataSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn seasonal_path(&self, stem: &str, season: i32) -> PathBuf {
        self.data_dir.join(format!("{stem}_{season}.parquet"))
    }

    fn read_seasonal<T>(
        &self,
        stem: &str,
        seasons: &[i32],
        parse: impl Fn(&DataFrame) -> Result<Vec<T>, StoreError>,
    ) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        for &season in seasons {
            let df = read_table(&self.seasonal_path(stem, season))?;
            let parsed = parse(&df)?;
            debug!(table = stem, season, rows = parsed.len(), "Loaded source table");
            rows.extend(parsed);
        }
        Ok(rows)
    }
}

fn read_table(path: &Path) -> Result<DataFrame, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::MissingTable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Typed column access over one table.
struct Columns<'a> {
    table: &'static str,
    df: &'a DataFrame,
}

impl<'a> Columns<'a> {
    fn new(table: &'static str, df: &'a DataFrame) -> Self {
        Self { table, df }
    }

    fn series(&self, name: &str) -> Result<&Series, StoreError> {
        self.df.column(name).map_err(|_| StoreError::MissingColumn {
            table: self.table,
            column: name.to_string(),
        })
    }

    fn has(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    fn f64(&self, name: &str) -> Result<Vec<Option<f64>>, StoreError> {
        let cast = self.series(name)?.cast(&DataType::Float64)?;
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Like `f64`, but a column the provider did not ship reads as all-null.
    fn f64_or_null(&self, name: &str) -> Result<Vec<Option<f64>>, StoreError> {
        if self.has(name) {
            self.f64(name)
        } else {
            Ok(vec![None; self.df.height()])
        }
    }

    fn int(&self, name: &str) -> Result<Vec<Option<i64>>, StoreError> {
        let cast = self.series(name)?.cast(&DataType::Int64)?;
        Ok(cast.i64()?.into_iter().collect())
    }

    fn flag(&self, name: &str) -> Result<Vec<bool>, StoreError> {
        Ok(self.f64_or_null(name)?.into_iter().map(|v| v == Some(1.0)).collect())
    }

    fn string(&self, name: &str) -> Result<Vec<Option<String>>, StoreError> {
        let cast = self.series(name)?.cast(&DataType::String)?;
        Ok(cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    fn string_or_null(&self, name: &str) -> Result<Vec<Option<String>>, StoreError> {
        if self.has(name) {
            self.string(name)
        } else {
            Ok(vec![None; self.df.height()])
        }
    }

    /// Season and week for every row; rows missing either come back as `None`.
    fn game_keys(&self) -> Result<Vec<Option<(i32, u8)>>, StoreError> {
        let seasons = self.int("season")?;
        let weeks = self.int("week")?;
        Ok(seasons
            .into_iter()
            .zip(weeks)
            .map(|(season, week)| {
                let season = i32::try_from(season?).ok()?;
                let week = u8::try_from(week?).ok()?;
                Some((season, week))
            })
            .collect())
    }

    fn stat_columns(&self, stats: &[Stat]) -> Result<Vec<(Stat, Vec<Option<f64>>)>, StoreError> {
        stats
            .iter()
            .map(|stat| Ok((*stat, self.f64_or_null(stat.as_str())?)))
            .collect()
    }
}

fn stats_at(columns: &[(Stat, Vec<Option<f64>>)], row: usize) -> BTreeMap<Stat, f64> {
    columns
        .iter()
        .filter_map(|(stat, values)| values[row].map(|v| (*stat, v)))
        .collect()
}

fn parse_plays(df: &DataFrame) -> Result<Vec<PlayRecord>, StoreError> {
    let c = Columns::new("pbp", df);
    let keys = c.game_keys()?;
    let posteam = c.string("posteam")?;
    let defteam = c.string("defteam")?;
    let rush_attempt = c.flag("rush_attempt")?;
    let pass_attempt = c.flag("pass_attempt")?;
    let complete_pass = c.flag("complete_pass")?;
    let rusher = c.string_or_null("rusher_player_id")?;
    let receiver = c.string_or_null("receiver_player_id")?;
    let td_player = c.string_or_null("td_player_id")?;
    let yardline = c.f64_or_null("yardline_100")?;
    let yards_gained = c.f64_or_null("yards_gained")?;
    let rushing_yards = c.f64_or_null("rushing_yards")?;
    let receiving_yards = c.f64_or_null("receiving_yards")?;
    let touchdown = c.flag("touchdown")?;
    let rush_touchdown = c.flag("rush_touchdown")?;
    let pass_touchdown = c.flag("pass_touchdown")?;
    let epa = c.f64_or_null("epa")?;
    let success = c.flag("success")?;
    let air_yards = c.f64_or_null("air_yards")?;
    let yards_after_catch = c.f64_or_null("yards_after_catch")?;
    let yac_epa = c.f64_or_null("yac_epa")?;

    let mut plays = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        // Only snaps where the ball went to someone matter to any metric.
        if !rush_attempt[i] && !pass_attempt[i] {
            continue;
        }
        let (Some((season, week)), Some(pos), Some(def)) = (keys[i], &posteam[i], &defteam[i]) else {
            continue;
        };
        plays.push(PlayRecord {
            season,
            week,
            posteam: pos.clone(),
            defteam: def.clone(),
            rush_attempt: rush_attempt[i],
            pass_attempt: pass_attempt[i],
            complete_pass: complete_pass[i],
            rusher_player_id: rusher[i].clone(),
            receiver_player_id: receiver[i].clone(),
            td_player_id: td_player[i].clone(),
            yardline_100: yardline[i],
            yards_gained: yards_gained[i].unwrap_or(0.0),
            rushing_yards: rushing_yards[i],
            receiving_yards: receiving_yards[i],
            touchdown: touchdown[i],
            rush_touchdown: rush_touchdown[i],
            pass_touchdown: pass_touchdown[i],
            epa: epa[i],
            success: success[i],
            air_yards: air_yards[i],
            yards_after_catch: yards_after_catch[i],
            yac_epa: yac_epa[i],
        });
    }
    Ok(plays)
}

fn parse_weekly(df: &DataFrame) -> Result<Vec<WeeklyStatRecord>, StoreError> {
    let c = Columns::new("player_stats", df);
    let keys = c.game_keys()?;
    let player_id = c.string("player_id")?;
    let player_name = c.string_or_null("player_name")?;
    let position = c.string_or_null("position")?;
    // Older releases of the table call the column `recent_team`.
    let teams = if c.has("team") { c.string("team")? } else { c.string("recent_team")? };
    let opponents = c.string("opponent_team")?;
    let stat_columns = c.stat_columns(&Stat::WEEKLY)?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some((season, week)), Some(id), Some(team), Some(opp)) =
            (keys[i], &player_id[i], &teams[i], &opponents[i])
        else {
            continue;
        };
        rows.push(WeeklyStatRecord {
            player_id: id.clone(),
            player_name: player_name[i].clone(),
            position: position[i].clone(),
            team: team.clone(),
            opponent_team: opp.clone(),
            season,
            week,
            stats: stats_at(&stat_columns, i),
        });
    }
    Ok(rows)
}

fn parse_opportunity(df: &DataFrame) -> Result<Vec<OpportunityRecord>, StoreError> {
    let c = Columns::new("ff_opportunity", df);
    let keys = c.game_keys()?;
    let player_id = c.string("player_id")?;
    let stat_columns = c.stat_columns(&Stat::EXPECTED)?;

    Ok((0..df.height())
        .filter_map(|i| {
            let (season, week) = keys[i]?;
            Some(OpportunityRecord {
                player_id: player_id[i].clone()?,
                season,
                week,
                stats: stats_at(&stat_columns, i),
            })
        })
        .collect())
}

fn parse_schedules(df: &DataFrame) -> Result<Vec<ScheduleRecord>, StoreError> {
    let c = Columns::new("schedules", df);
    let keys = c.game_keys()?;
    let home = c.string("home_team")?;
    let away = c.string("away_team")?;

    Ok((0..df.height())
        .filter_map(|i| {
            let (season, week) = keys[i]?;
            Some(ScheduleRecord {
                season,
                week,
                home_team: home[i].clone()?,
                away_team: away[i].clone()?,
            })
        })
        .collect())
}

impl DataSource for ParquetDataSource {
    fn plays(&self, seasons: &[i32]) -> Result<Vec<PlayRecord>, StoreError> {
        self.read_seasonal("pbp", seasons, parse_plays)
    }

    fn weekly_stats(&self, seasons: &[i32]) -> Result<Vec<WeeklyStatRecord>, StoreError> {
        self.read_seasonal("player_stats", seasons, parse_weekly)
    }

    /// Snap counts are keyed by the reference site's id; rows whose id has no
    /// gsis mapping in `players.parquet` are dropped.
    fn snap_counts(&self, seasons: &[i32]) -> Result<Vec<SnapCountRecord>, StoreError> {
        let id_map: HashMap<String, String> = self
            .players()?
            .into_iter()
            .filter_map(|p| Some((p.pfr_id?, p.gsis_id)))
            .collect();

        self.read_seasonal("snap_counts", seasons, |df| {
            let c = Columns::new("snap_counts", df);
            let keys = c.game_keys()?;
            let pfr_ids = c.string("pfr_player_id")?;
            let offense_pct = c.f64("offense_pct")?;

            let mut unmapped = 0usize;
            let mut rows = Vec::with_capacity(df.height());
            for i in 0..df.height() {
                let (Some((season, week)), Some(pfr)) = (keys[i], &pfr_ids[i]) else {
                    continue;
                };
                let Some(gsis) = id_map.get(pfr) else {
                    unmapped += 1;
                    continue;
                };
                rows.push(SnapCountRecord {
                    player_id: gsis.clone(),
                    season,
                    week,
                    offense_pct: offense_pct[i].unwrap_or(0.0),
                });
            }
            if unmapped > 0 {
                debug!(unmapped, "Dropped snap rows with no gsis id");
            }
            Ok(rows)
        })
    }

    fn expected_opportunity(&self, seasons: &[i32]) -> Result<Vec<OpportunityRecord>, StoreError> {
        self.read_seasonal("ff_opportunity", seasons, parse_opportunity)
    }

    fn players(&self) -> Result<Vec<PlayerInfo>, StoreError> {
        let df = read_table(&self.data_dir.join("players.parquet"))?;
        let c = Columns::new("players", &df);
        let gsis = c.string("gsis_id")?;
        let pfr = c.string_or_null("pfr_id")?;
        let name = c.string_or_null("display_name")?;
        let position = c.string_or_null("position")?;

        Ok((0..df.height())
            .filter_map(|i| {
                Some(PlayerInfo {
                    gsis_id: gsis[i].clone()?,
                    pfr_id: pfr[i].clone(),
                    name: name[i].clone(),
                    position: position[i].clone(),
                })
            })
            .collect())
    }

    fn schedules(&self, seasons: &[i32]) -> Result<Vec<ScheduleRecord>, StoreError> {
        let df = read_table(&self.data_dir.join("schedules.parquet"))?;
        let mut rows = parse_schedules(&df)?;
        rows.retain(|r| seasons.contains(&r.season));
        info!(games = rows.len(), "Loaded schedules");
        Ok(rows)
    }
}
