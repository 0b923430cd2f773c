//! Trailing-window selection.
//!
//! A window for anchor `(season, start_week)` of `game_amt` games covers weeks
//! `start_week - 1` down to `max(1, start_week - game_amt)` of the anchor season.
//! When `start_week - game_amt < 1` the window spills into the previous season,
//! taking weeks `17, 16, ...` for the `game_amt - start_week` games left over.
//! Spillover weeks come first in the result, then the anchor season's weeks,
//! each part descending by week. The anchor week itself is never part of its
//! own window.

use core_types::{EntityKey, GameKey, TimelineRecord};
use tracing::warn;

/// Smallest window the selector honours.
pub const MIN_GAMES: u8 = 1;
/// Largest window the selector honours; also the week a spillover starts from.
pub const SEASON_LENGTH: u8 = 17;

/// Clamps a requested window size into `[MIN_GAMES, SEASON_LENGTH]`.
///
/// Out-of-range sizes are corrected, not rejected.
pub fn clamp_game_amt(game_amt: i64) -> u8 {
    if game_amt > SEASON_LENGTH as i64 {
        warn!(game_amt, "Game amount out of bounds, set to {}", SEASON_LENGTH);
        SEASON_LENGTH
    } else if game_amt < MIN_GAMES as i64 {
        warn!(game_amt, "Game amount out of bounds, set to {}", MIN_GAMES);
        MIN_GAMES
    } else {
        game_amt as u8
    }
}

/// The ordered weeks a window covers.
///
/// # Arguments
///
/// * `season` - Season of the anchor game.
/// * `start_week` - Week of the anchor game (excluded).
/// * `game_amt` - Requested window size; clamped to `[1, 17]`.
pub fn window_weeks(season: i32, start_week: u8, game_amt: i64) -> Vec<GameKey> {
    let game_amt = clamp_game_amt(game_amt) as i32;
    let start = start_week as i32;
    let mut keys = Vec::with_capacity(game_amt as usize);

    // 1. Spillover from the previous season, if the window reaches before week 1.
    if start - game_amt < 1 {
        let leftover = game_amt - start;
        let last = SEASON_LENGTH as i32;
        for week in ((last - leftover + 1)..=last).rev() {
            keys.push(GameKey::new(season - 1, week as u8));
        }
    }

    // 2. The anchor season's weeks, most recent first.
    let end_week = (start - game_amt).max(1);
    for week in (end_week..start).rev() {
        keys.push(GameKey::new(season, week as u8));
    }

    keys
}

/// Selects the records of `entity` that fall inside the window, in window order.
///
/// Records sharing a week keep their input order. Weeks the entity did not
/// play (byes) are simply absent, so the result may be shorter than requested
/// and may be empty.
pub fn select_window<'a, T, I>(
    records: I,
    entity: &EntityKey,
    season: i32,
    start_week: u8,
    game_amt: i64,
) -> Vec<&'a T>
where
    T: TimelineRecord + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let weeks = window_weeks(season, start_week, game_amt);
    let mut selected: Vec<(usize, &'a T)> = records
        .into_iter()
        .filter(|r| r.involves(entity))
        .filter_map(|r| {
            let key = r.game_key();
            weeks.iter().position(|w| *w == key).map(|slot| (slot, r))
        })
        .collect();
    // Stable, so plays inside one game stay in feed order.
    selected.sort_by_key(|(slot, _)| *slot);
    selected.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{GameRecord, Side};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn game(season: i32, week: u8) -> GameRecord {
        GameRecord {
            entity_id: "p1".into(),
            player_name: None,
            position: Some("RB".into()),
            side: Side::Offense,
            season,
            week,
            team: "BUF".into(),
            opponent_team: "MIA".into(),
            stats: BTreeMap::new(),
        }
    }

    fn full_history() -> Vec<GameRecord> {
        (2021..=2023)
            .flat_map(|season| (1..=18).map(move |week| game(season, week)))
            .collect()
    }

    fn player() -> EntityKey {
        EntityKey::Player("p1".into())
    }

    #[test]
    fn spills_into_previous_season_first() {
        let history = full_history();
        let window = select_window(&history, &player(), 2023, 3, 6);
        let keys: Vec<_> = window.iter().map(|g| (g.season, g.week)).collect();

        assert_eq!(keys, vec![(2022, 17), (2022, 16), (2022, 15), (2023, 2), (2023, 1)]);
    }

    #[test]
    fn mid_season_window_stays_in_season() {
        let keys = window_weeks(2023, 10, 6);
        let weeks: Vec<_> = keys.iter().map(|k| (k.season, k.week)).collect();
        assert_eq!(weeks, vec![(2023, 9), (2023, 8), (2023, 7), (2023, 6), (2023, 5), (2023, 4)]);
    }

    #[test]
    fn sizes_are_clamped_not_rejected() {
        assert_eq!(clamp_game_amt(40), 17);
        assert_eq!(clamp_game_amt(0), 1);
        assert_eq!(clamp_game_amt(-3), 1);
        assert_eq!(window_weeks(2023, 18, 40).len(), 17);
    }

    #[test]
    fn byes_shorten_the_window() {
        let history: Vec<_> = full_history().into_iter().filter(|g| g.week != 8).collect();
        let window = select_window(&history, &player(), 2023, 10, 3);
        let weeks: Vec<_> = window.iter().map(|g| g.week).collect();
        assert_eq!(weeks, vec![9, 7]);
    }

    #[test]
    fn other_entities_are_ignored() {
        let history = full_history();
        let window = select_window(&history, &EntityKey::Player("p2".into()), 2023, 10, 6);
        assert!(window.is_empty());
    }

    proptest! {
        #[test]
        fn window_never_exceeds_size_or_leaks_the_anchor(start_week in 1u8..=18, game_amt in 1i64..=17) {
            let history = full_history();
            let window = select_window(&history, &player(), 2023, start_week, game_amt);

            prop_assert!(window.len() <= game_amt as usize);
            prop_assert!(window.iter().all(|g| !(g.season == 2023 && g.week == start_week)));
            prop_assert!(window.iter().all(|g| g.season == 2023 || g.season == 2022));
            prop_assert!(window.iter().all(|g| g.season < 2023 || g.week < start_week));
        }

        #[test]
        fn out_of_range_sizes_match_their_clamp(start_week in 1u8..=18, game_amt in -50i64..80) {
            let clamped = clamp_game_amt(game_amt) as i64;
            prop_assert_eq!(window_weeks(2023, start_week, game_amt), window_weeks(2023, start_week, clamped));
        }
    }
}
