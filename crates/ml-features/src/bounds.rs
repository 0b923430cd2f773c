//! Per-season memoization of league-wide normalizers.
//!
//! Values are computed once per `(season, family)` key and shared as `Arc`s.
//! Batch code warms the cache up front and only reads it from worker threads.

use crate::error::FeatureError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Which group of league statistics a cached value normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatFamily {
    /// Percentile bounds of running-back volume and expected stats.
    RunningBackOpportunity,
    /// Per-game maxima of receiver depth and receptions.
    ReceiverMaxima,
}

impl fmt::Display for StatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatFamily::RunningBackOpportunity => f.write_str("running-back opportunity"),
            StatFamily::ReceiverMaxima => f.write_str("receiver maxima"),
        }
    }
}

/// A value computed for exactly one season.
pub trait SeasonScoped {
    fn season(&self) -> i32;
}

/// Injectable cache keyed by `(season, StatFamily)`.
#[derive(Debug)]
pub struct SeasonCache<V> {
    entries: RwLock<HashMap<(i32, StatFamily), Arc<V>>>,
}

impl<V> Default for SeasonCache<V> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<V: SeasonScoped> SeasonCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value, computing and storing it on first request.
    ///
    /// `compute` runs without the lock held; if two callers race, the first
    /// stored value wins and both get it.
    pub fn get_or_compute<F>(&self, season: i32, family: StatFamily, compute: F) -> Result<Arc<V>, FeatureError>
    where
        F: FnOnce() -> Result<V, FeatureError>,
    {
        if let Ok(value) = self.get(season, family) {
            return Ok(value);
        }
        let value = compute()?;
        if value.season() != season {
            return Err(FeatureError::StaleBounds { season, family });
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let stored = entries.entry((season, family)).or_insert_with(|| Arc::new(value));
        info!(season, %family, "League bounds computed");
        Ok(Arc::clone(stored))
    }

    /// Returns a value that must already be cached.
    ///
    /// Asking for a season that was never computed, or finding a value that
    /// belongs to another season, is an error: bounds are never substituted.
    pub fn get(&self, season: i32, family: StatFamily) -> Result<Arc<V>, FeatureError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(&(season, family)) {
            Some(value) if value.season() == season => Ok(Arc::clone(value)),
            _ => Err(FeatureError::StaleBounds { season, family }),
        }
    }

    pub fn contains(&self, season: i32, family: StatFamily) -> bool {
        self.get(season, family).is_ok()
    }

    /// Drops one entry so the next `get_or_compute` recomputes it.
    pub fn invalidate(&self, season: i32, family: StatFamily) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(&(season, family)).is_some() {
            debug!(season, %family, "Bounds invalidated");
        }
    }

    /// Drops every entry.
    pub fn reset(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        debug!("Bounds cache reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Scoped(i32);

    impl SeasonScoped for Scoped {
        fn season(&self) -> i32 {
            self.0
        }
    }

    #[test]
    fn computes_once_per_key() {
        let cache = SeasonCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Scoped(2023))
        };

        cache.get_or_compute(2023, StatFamily::RunningBackOpportunity, compute).unwrap();
        cache.get_or_compute(2023, StatFamily::RunningBackOpportunity, compute).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uncomputed_season_is_an_error() {
        let cache = SeasonCache::<Scoped>::new();
        cache
            .get_or_compute(2023, StatFamily::RunningBackOpportunity, || Ok(Scoped(2023)))
            .unwrap();

        assert!(matches!(
            cache.get(2022, StatFamily::RunningBackOpportunity),
            Err(FeatureError::StaleBounds { season: 2022, .. })
        ));
        assert!(cache.get(2023, StatFamily::ReceiverMaxima).is_err());
    }

    #[test]
    fn value_for_another_season_is_rejected() {
        let cache = SeasonCache::new();
        let result = cache.get_or_compute(2023, StatFamily::ReceiverMaxima, || Ok(Scoped(2022)));
        assert!(matches!(result, Err(FeatureError::StaleBounds { .. })));
        assert!(!cache.contains(2023, StatFamily::ReceiverMaxima));
    }

    #[test]
    fn invalidate_and_reset_drop_entries() {
        let cache = SeasonCache::new();
        for season in [2022, 2023] {
            cache
                .get_or_compute(season, StatFamily::ReceiverMaxima, || Ok(Scoped(season)))
                .unwrap();
        }

        cache.invalidate(2022, StatFamily::ReceiverMaxima);
        assert!(!cache.contains(2022, StatFamily::ReceiverMaxima));
        assert!(cache.contains(2023, StatFamily::ReceiverMaxima));

        cache.reset();
        assert!(!cache.contains(2023, StatFamily::ReceiverMaxima));
    }
}
