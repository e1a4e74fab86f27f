//! Configuration types for closure-diff.

use super::defaults::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CURRENT_SYSTEM, DEFAULT_MAX_LEVEL, DEFAULT_NIX_STORE,
    DEFAULT_REBUILD_COMMAND,
};
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over file settings with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Diff engine settings
    pub diff: DiffSettings,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
    /// Store query backend
    pub store: StoreConfig,
    /// Where the default old and new roots come from
    pub roots: RootsConfig,
    /// Reference filtering
    pub filtering: FilterConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the expansion cutoff level.
    pub const fn max_level(mut self, level: u32) -> Self {
        self.config.diff.max_level = level;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Set the store query executable.
    pub fn nix_store(mut self, program: impl Into<String>) -> Self {
        self.config.store.nix_store = program.into();
        self
    }

    /// Enable or disable the persistent query cache.
    pub const fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.store.cache_enabled = enabled;
        self
    }

    /// Set the reference ignore patterns.
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.filtering.ignore_patterns = patterns;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Section types
// ============================================================================

/// Diff engine settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiffSettings {
    /// Depth past which version bumps and fixed-output rebuilds are reported
    /// without expanding their references
    pub max_level: u32,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Hide fixed-output rebuilds and everything below them
    pub quiet: bool,
}

/// Store query backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StoreConfig {
    /// Store query executable
    pub nix_store: String,
    /// Persist query answers between runs
    pub cache_enabled: bool,
    /// Cache directory (defaults to the platform cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Lifetime of a cached answer in seconds
    #[schemars(range(min = 1))]
    pub cache_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            nix_store: DEFAULT_NIX_STORE.to_string(),
            cache_enabled: true,
            cache_dir: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Default root resolution
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RootsConfig {
    /// Symlink to the running system, used when no old root is given
    pub current_system: PathBuf,
    /// Dry-run rebuild command, scraped for the pending system recipe
    /// when no new root is given
    pub rebuild_command: Vec<String>,
}

impl Default for RootsConfig {
    fn default() -> Self {
        Self {
            current_system: PathBuf::from(DEFAULT_CURRENT_SYSTEM),
            rebuild_command: DEFAULT_REBUILD_COMMAND
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Reference filtering
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FilterConfig {
    /// References whose path contains any of these substrings are ignored
    pub ignore_patterns: Vec<String>,
}
