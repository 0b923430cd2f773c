//! # Gridiron Configuration
//!
//! Typed settings for dataset assembly, fantasy scoring, and model training.
//!
//! ## Architectural Principles
//!
//! - **Layered Sources:** built-in defaults, then `config.toml`, then
//!   `GRIDIRON__SECTION__KEY` environment variables, then command-line `Overrides`.
//! - **Validated Once:** `load_config` rejects nonsensical values up front so the
//!   feature engine never has to.
//!
//! ## Public API
//!
//! - `load_config`, `load_config_from`: build a `Config`.
//! - `Config` and its sections, plus `Overrides` for the CLI.

use crate::error::ConfigError;
use std::path::Path;
use tracing::{debug, warn};

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, FeatureSettings, ModelSettings, Overrides, Paths, ScoringSettings, Thresholds,
};

const ENV_PREFIX: &str = "GRIDIRON";

/// Loads the application configuration from `config.toml` in the working directory.
///
/// A missing file is not an error; defaults and environment variables still apply.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads configuration from an explicit file path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
    }

    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        // e.g. GRIDIRON__FEATURES__OFFENSE_WINDOW=4
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    debug!(?config, "Configuration loaded");

    Ok(config)
}

/// Checks the invariants the rest of the workspace relies on.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.features.max_depth_rank == 0 {
        return Err(ConfigError::ValidationError(
            "features.max_depth_rank must be at least 1".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&config.features.min_snap_share) {
        return Err(ConfigError::ValidationError(format!(
            "features.min_snap_share must be in [0, 1), got {}",
            config.features.min_snap_share
        )));
    }
    if !(config.model.test_size > 0.0 && config.model.test_size < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "model.test_size must be in (0, 1), got {}",
            config.model.test_size
        )));
    }
    if config.model.n_trees == 0 {
        return Err(ConfigError::ValidationError(
            "model.n_trees must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.features.offense_window, 6);
        assert_eq!(config.features.defense_window, 8);
        assert_eq!(config.scoring.points_per_reception, 1.0);
        assert_eq!(config.thresholds.big_play_air_yards, 20.0);
    }

    #[test]
    fn file_values_override_defaults_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[features]\noffense_window = 4\n\n[scoring]\npoints_per_reception = 0.5").unwrap();

        let config = load_config_from(&path).unwrap();

        assert_eq!(config.features.offense_window, 4);
        assert_eq!(config.features.defense_window, 8);
        assert_eq!(config.scoring.points_per_reception, 0.5);
    }

    #[test]
    fn zero_depth_rank_is_rejected() {
        let mut config = Config::default();
        config.features.max_depth_rank = 0;
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn overrides_only_touch_given_fields() {
        let mut config = Config::default();
        config.apply(&Overrides { offense_window: Some(3), defense_window: None, ppr: Some(0.0) });

        assert_eq!(config.features.offense_window, 3);
        assert_eq!(config.features.defense_window, 8);
        assert_eq!(config.scoring.points_per_reception, 0.0);
    }
}
