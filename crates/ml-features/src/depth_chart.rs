//! Ranking entities by volume within a team-game.

use std::cmp::Ordering;

/// One entity's volume in a team-game.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthEntry<K> {
    pub entity: K,
    pub volume: f64,
}

impl<K> DepthEntry<K> {
    pub fn new(entity: K, volume: f64) -> Self {
        Self { entity, volume }
    }
}

/// Sorts entries into depth order: highest volume first, ties by entity.
pub fn rank<K: Ord>(entries: &mut [DepthEntry<K>]) {
    entries.sort_by(|a, b| match b.volume.total_cmp(&a.volume) {
        Ordering::Equal => a.entity.cmp(&b.entity),
        other => other,
    });
}

/// The entity at a 1-based depth rank.
///
/// `None` when the team-game has fewer entities than `rank`; callers skip
/// that team-game rather than zero-filling it.
pub fn select_at_rank<K: Ord>(mut entries: Vec<DepthEntry<K>>, rank_index: usize) -> Option<DepthEntry<K>> {
    if rank_index == 0 {
        return None;
    }
    rank(&mut entries);
    entries.into_iter().nth(rank_index - 1)
}

/// 1-based rank of `entity`, if it is among the entries.
pub fn rank_of<K: Ord>(entries: &mut [DepthEntry<K>], entity: &K) -> Option<usize> {
    rank(entries);
    entries.iter().position(|e| &e.entity == entity).map(|i| i + 1)
}
