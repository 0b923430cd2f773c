//! A three-week slice of one season, small enough to count rows by hand.
//!
//! DET: backs `lead` and `backup`, receiver `wr1`. LAR: back `other`.
//!
//! | week | DET vs | LAR vs |
//! |------|--------|--------|
//! | 1    | KC     | SEA    |
//! | 2    | SEA    | KC     |
//! | 3    | CHI    | bye    |
//! | 4    | GB     | bye    |
//!
//! CHI's defense never faced a back before week 3. `backup` falls under the
//! snap floor in week 3. `other` has no fantasy points in week 2 and `wr1`
//! none in week 3.
//!
//! `two_seasons` adds `lead`'s last two games of the previous season, one
//! 100-yard carry each against NYJ.
#![allow(dead_code)]

use core_types::{PlayRecord, Stat};
use timeline_store::{PlayerInfo, ScheduleRecord, SnapCountRecord, SourceTables, TimelineStore, WeeklyStatRecord};

pub const SEASON: i32 = 2023;
pub const PREVIOUS_SEASON: i32 = SEASON - 1;

fn weekly(id: &str, position: &str, team: &str, opponent: &str, week: u8, stats: &[(Stat, f64)]) -> WeeklyStatRecord {
    WeeklyStatRecord {
        player_id: id.into(),
        player_name: Some(id.to_uppercase()),
        position: Some(position.into()),
        team: team.into(),
        opponent_team: opponent.into(),
        season: SEASON,
        week,
        stats: stats.iter().copied().collect(),
    }
}

fn snap(id: &str, week: u8, offense_pct: f64) -> SnapCountRecord {
    SnapCountRecord { player_id: id.into(), season: SEASON, week, offense_pct }
}

fn rush(id: &str, team: &str, defense: &str, week: u8, yardline: f64, yards: f64, td: bool) -> PlayRecord {
    PlayRecord {
        season: SEASON,
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

fn target(id: &str, team: &str, defense: &str, week: u8, air_yards: f64, yards: f64) -> PlayRecord {
    PlayRecord {
        season: SEASON,
        week,
        posteam: team.into(),
        defteam: defense.into(),
        pass_attempt: true,
        complete_pass: yards > 0.0,
        receiver_player_id: Some(id.into()),
        yardline_100: Some(45.0),
        yards_gained: yards,
        receiving_yards: (yards > 0.0).then_some(yards),
        air_yards: Some(air_yards),
        yards_after_catch: (yards > 0.0).then_some((yards - air_yards).max(0.0)),
        epa: Some(0.3),
        yac_epa: Some(0.2),
        success: yards > 5.0,
        ..Default::default()
    }
}

fn player(id: &str, position: &str) -> PlayerInfo {
    PlayerInfo { gsis_id: id.into(), pfr_id: None, name: Some(id.to_uppercase()), position: Some(position.into()) }
}

fn game(week: u8, home: &str, away: &str) -> ScheduleRecord {
    ScheduleRecord { season: SEASON, week, home_team: home.into(), away_team: away.into() }
}

pub fn tables() -> SourceTables {
    let plays = vec![
        rush("lead", "DET", "KC", 1, 5.0, 5.0, true),
        rush("lead", "DET", "KC", 1, 40.0, 12.0, false),
        target("lead", "DET", "KC", 1, 2.0, 8.0),
        rush("backup", "DET", "KC", 1, 30.0, 2.0, false),
        target("wr1", "DET", "KC", 1, 25.0, 30.0),
        target("wr1", "DET", "KC", 1, 8.0, 0.0),
        rush("other", "LAR", "SEA", 1, 60.0, 7.0, false),
        rush("other", "LAR", "SEA", 1, 10.0, 10.0, true),
        rush("lead", "DET", "SEA", 2, 60.0, 4.0, false),
        rush("lead", "DET", "SEA", 2, 55.0, 6.0, false),
        rush("backup", "DET", "SEA", 2, 50.0, 3.0, false),
        target("wr1", "DET", "SEA", 2, 12.0, 15.0),
        rush("other", "LAR", "KC", 2, 70.0, 1.0, false),
        rush("lead", "DET", "CHI", 3, 35.0, 9.0, false),
        target("wr1", "DET", "CHI", 3, 6.0, 9.0),
    ];

    let weekly = vec![
        weekly("lead", "RB", "DET", "KC", 1, &[(Stat::FantasyPointsPpr, 19.5), (Stat::Carries, 2.0), (Stat::Targets, 1.0), (Stat::Receptions, 1.0), (Stat::RushingYards, 17.0), (Stat::ReceivingYards, 8.0)]),
        weekly("lead", "RB", "DET", "SEA", 2, &[(Stat::FantasyPointsPpr, 1.0), (Stat::Carries, 2.0), (Stat::RushingYards, 10.0)]),
        weekly("lead", "RB", "DET", "CHI", 3, &[(Stat::FantasyPointsPpr, 0.9), (Stat::Carries, 1.0), (Stat::RushingYards, 9.0)]),
        weekly("backup", "RB", "DET", "KC", 1, &[(Stat::FantasyPointsPpr, 0.2), (Stat::Carries, 1.0), (Stat::RushingYards, 2.0)]),
        weekly("backup", "RB", "DET", "SEA", 2, &[(Stat::FantasyPointsPpr, 0.3), (Stat::Carries, 1.0), (Stat::RushingYards, 3.0)]),
        weekly("backup", "RB", "DET", "CHI", 3, &[(Stat::FantasyPointsPpr, 0.0)]),
        weekly("other", "RB", "LAR", "SEA", 1, &[(Stat::FantasyPointsPpr, 7.7), (Stat::Carries, 2.0), (Stat::RushingYards, 17.0)]),
        weekly("other", "RB", "LAR", "KC", 2, &[(Stat::Carries, 1.0), (Stat::RushingYards, 1.0)]),
        weekly("wr1", "WR", "DET", "KC", 1, &[(Stat::FantasyPointsPpr, 4.0), (Stat::Targets, 2.0), (Stat::Receptions, 1.0), (Stat::ReceivingYards, 30.0), (Stat::ReceivingAirYards, 33.0), (Stat::Racr, 0.9), (Stat::ReceivingEpa, 0.6)]),
        weekly("wr1", "WR", "DET", "SEA", 2, &[(Stat::FantasyPointsPpr, 2.5), (Stat::Targets, 1.0), (Stat::Receptions, 1.0), (Stat::ReceivingYards, 15.0), (Stat::ReceivingAirYards, 12.0), (Stat::Racr, 1.25), (Stat::ReceivingEpa, 0.3)]),
        weekly("wr1", "WR", "DET", "CHI", 3, &[(Stat::Targets, 1.0), (Stat::Receptions, 1.0), (Stat::ReceivingYards, 9.0)]),
    ];

    let snaps = vec![
        snap("lead", 1, 0.8),
        snap("lead", 2, 0.7),
        snap("lead", 3, 0.75),
        snap("backup", 1, 0.2),
        snap("backup", 2, 0.3),
        snap("backup", 3, 0.04),
        snap("other", 1, 0.9),
        snap("other", 2, 0.9),
        snap("wr1", 1, 0.85),
        snap("wr1", 2, 0.9),
        snap("wr1", 3, 0.88),
    ];

    SourceTables {
        plays,
        weekly,
        snaps,
        players: vec![player("lead", "RB"), player("backup", "RB"), player("other", "RB"), player("wr1", "WR")],
        schedules: vec![
            game(1, "DET", "KC"),
            game(1, "SEA", "LAR"),
            game(2, "SEA", "DET"),
            game(2, "LAR", "KC"),
            game(3, "CHI", "DET"),
            game(4, "DET", "GB"),
        ],
        ..Default::default()
    }
}

pub fn league() -> TimelineStore {
    TimelineStore::from_tables(tables())
}

pub fn two_seasons() -> SourceTables {
    let mut tables = tables();
    for week in [16, 17] {
        let mut play = rush("lead", "DET", "NYJ", week, 70.0, 100.0, false);
        play.season = PREVIOUS_SEASON;
        tables.plays.push(play);

        let mut row = weekly("lead", "RB", "DET", "NYJ", week, &[(Stat::FantasyPointsPpr, 10.0), (Stat::Carries, 1.0), (Stat::RushingYards, 100.0)]);
        row.season = PREVIOUS_SEASON;
        tables.weekly.push(row);

        let mut share = snap("lead", week, 0.8);
        share.season = PREVIOUS_SEASON;
        tables.snaps.push(share);

        let mut fixture = game(week, "DET", "NYJ");
        fixture.season = PREVIOUS_SEASON;
        tables.schedules.push(fixture);
    }
    tables
}
