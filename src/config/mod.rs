//! Configuration module for closure-diff.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.closure-diff.yaml` file in the current directory, the repository
//! root, or `~/.config/closure-diff/`:
//!
//! ```yaml
//! diff:
//!   max_level: 1
//! behavior:
//!   quiet: true
//! filtering:
//!   ignore_patterns: [".patch"]
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CURRENT_SYSTEM, DEFAULT_MAX_LEVEL, DEFAULT_NIX_STORE,
    DEFAULT_REBUILD_COMMAND,
};
pub use types::{
    AppConfig, AppConfigBuilder, BehaviorConfig, DiffSettings, FilterConfig, OutputConfig,
    RootsConfig, StoreConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    CONFIG_FILE_NAMES, ConfigFileError, config_search_dirs, discover_config_file,
    generate_full_example_config, load_config_file, load_or_default,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// Editors can use it to validate and complete `.closure-diff.yaml` files.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
