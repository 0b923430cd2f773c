//! # Gridiron Timeline Store
//!
//! This crate is the boundary between the outside world's tables and the
//! feature engine's records.
//!
//! ## Architectural Principles
//!
//! - **Adapter at the Edge:** `DataSource` hides where tables come from. The
//!   bundled `ParquetDataSource` reads a directory of per-season Parquet files
//!   with `polars`; tests and callers that already hold the data pass
//!   `SourceTables` directly.
//! - **Load Once, Read Many:** `TimelineStore` is built once per run and is
//!   immutable afterwards. The engine does no I/O of its own.
//!
//! ## Public API
//!
//! - `DataSource`, `SourceTables`: the raw-table interface, including the
//!   history-aware load that brings in the season before the earliest requested.
//! - `ParquetDataSource`: the file-backed implementation.
//! - `TimelineStore`: joined, sorted, indexed records.
//! - `StoreError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod parquet;
pub mod source;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use error::StoreError;
pub use parquet::ParquetDataSource;
pub use source::{
    DataSource, OpportunityRecord, PlayerInfo, ScheduleRecord, SnapCountRecord, SourceTables,
    WeeklyStatRecord, with_previous_season,
};
pub use store::TimelineStore;
