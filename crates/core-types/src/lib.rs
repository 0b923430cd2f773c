//! # Gridiron Core Types
//!
//! The shared vocabulary of the workspace: the records the timeline store holds,
//! the statistic and window enums the feature engine is keyed by, and the
//! structured feature names the assemblers emit.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** Depends on nothing else in the workspace. Every other crate
//!   depends on this one.
//! - **Structured Names:** Feature columns are `FeatureKey` values internally and
//!   only become strings via `FeatureKey::column_name` at the Parquet boundary.
//!
//! ## Public API
//!
//! - `GameRecord`, `PlayRecord`: immutable per-game and per-play rows.
//! - `EntityKey`, `TimelineRecord`: what a timeline belongs to and how records are matched.
//! - `Stat`, `WindowKind`, `Side`, `AggregationMode`: the axes features are keyed on.
//! - `FeatureKey`, `FeatureRow`: one assembled row of a training or projection table.
//! - `fill_missing_as_zero`, `safe_ratio`: the null and division policy.

pub mod enums;
pub mod error;
pub mod features;
pub mod policy;
pub mod stat;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{AggregationMode, Position, Side, TouchKind, WindowKind};
pub use error::CoreError;
pub use features::{DerivedMetric, FeatureKey, FeatureRow, Metric};
pub use policy::{fill_missing_as_zero, safe_ratio};
pub use stat::Stat;
pub use structs::{EntityKey, GameKey, GameRecord, PlayRecord, TimelineRecord};
