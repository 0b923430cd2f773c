//! Trailing rolling means over per-season game timelines.

use core_types::{
    AggregationMode, FeatureKey, GameRecord, Side, Stat, WindowKind, fill_missing_as_zero,
};
use std::collections::BTreeMap;

/// A window kind plus the number of games it needs before it emits a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    pub kind: WindowKind,
    pub min_periods: usize,
}

impl RollingWindow {
    /// Short: 3 games, at least 1.
    pub const SHORT: Self = Self { kind: WindowKind::Short, min_periods: 1 };
    /// Medium: 6 games, at least 4.
    pub const MEDIUM: Self = Self { kind: WindowKind::Medium, min_periods: 4 };
    /// Season to date: every game so far, at least 1.
    pub const SEASON: Self = Self { kind: WindowKind::Season, min_periods: 1 };

    pub fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }
}

impl From<WindowKind> for RollingWindow {
    fn from(kind: WindowKind) -> Self {
        match kind {
            WindowKind::Short => Self::SHORT,
            WindowKind::Medium => Self::MEDIUM,
            WindowKind::Season => Self::SEASON,
        }
    }
}

/// Exclusive end of the slice a statistic anchored at `anchor_index` may see.
fn visible_end(anchor_index: usize, mode: AggregationMode) -> usize {
    match mode {
        AggregationMode::Training => anchor_index,
        AggregationMode::Projection => anchor_index + 1,
    }
}

/// Trailing mean of already zero-filled values.
///
/// Returns `None` when fewer than `window.min_periods` values are visible,
/// which is an explicit "not enough history", never a partial average.
pub fn window_mean(values: &[f64], window: RollingWindow, anchor_index: usize, mode: AggregationMode) -> Option<f64> {
    let end = visible_end(anchor_index, mode).min(values.len());
    let start = match window.kind.size() {
        Some(size) => end.saturating_sub(size),
        // Cumulative: sum of everything so far over the count so far.
        None => 0,
    };
    let visible = &values[start..end];
    if visible.is_empty() || visible.len() < window.min_periods {
        return None;
    }
    Some(visible.iter().sum::<f64>() / visible.len() as f64)
}

/// A statistic's trailing mean over one (entity, season) timeline.
///
/// # Arguments
///
/// * `timeline` - Games of one entity in one season, ascending by week.
/// * `stat` - Column to aggregate; missing values count as zero.
/// * `window` - Window kind and minimum game count.
/// * `anchor_index` - Position of the game the value is for. In training mode
///   this game is excluded and may equal `timeline.len()`.
/// * `mode` - Whether the anchor game itself is visible.
pub fn rolling_stat(
    timeline: &[GameRecord],
    stat: Stat,
    window: RollingWindow,
    anchor_index: usize,
    mode: AggregationMode,
) -> Option<f64> {
    let values: Vec<f64> = timeline
        .iter()
        .map(|g| fill_missing_as_zero(g.stat(stat)))
        .collect();
    window_mean(&values, window, anchor_index, mode)
}

/// Splits an ascending timeline into per-season slices.
///
/// Rolling state never crosses a season boundary, so every aggregation runs
/// on one of these slices.
pub fn season_groups(timeline: &[GameRecord]) -> impl Iterator<Item = &[GameRecord]> {
    timeline.chunk_by(|a, b| a.season == b.season)
}

/// Rolls several statistics over several windows for one anchor.
///
/// Windows without enough history are left out of the map.
pub fn rolling_features(
    timeline: &[GameRecord],
    stats: &[Stat],
    windows: &[RollingWindow],
    side: Side,
    anchor_index: usize,
    mode: AggregationMode,
) -> BTreeMap<FeatureKey, f64> {
    let mut out = BTreeMap::new();
    for &stat in stats {
        let values: Vec<f64> = timeline
            .iter()
            .map(|g| fill_missing_as_zero(g.stat(stat)))
            .collect();
        for window in windows {
            if let Some(mean) = window_mean(&values, *window, anchor_index, mode) {
                out.insert(FeatureKey::rolling(stat, side, window.kind), mean);
            }
        }
    }
    out
}
