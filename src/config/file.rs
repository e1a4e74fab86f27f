//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::defaults::DEFAULT_MAX_LEVEL;
use super::types::{AppConfig, RootsConfig, StoreConfig};
use crate::reports::ReportFormat;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".closure-diff.yaml",
    ".closure-diff.yml",
    "closure-diff.yaml",
    "closure-diff.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. The directories from [`config_search_dirs`], in order
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    config_search_dirs()
        .iter()
        .find_map(|dir| find_config_in_dir(dir))
}

/// Directories searched for a config file, in lookup order:
/// 1. Current directory
/// 2. Git repository root (if in a repo)
/// 3. User config directory (~/.config/closure-diff/)
/// 4. Home directory
#[must_use]
pub fn config_search_dirs() -> Vec<PathBuf> {
    [
        std::env::current_dir().ok(),
        find_git_root(),
        dirs::config_dir().map(|dir| dir.join("closure-diff")),
        dirs::home_dir(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// File not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml_ng::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Only values that differ from the defaults override, so a CLI config
    /// built from unset flags leaves file settings alone.
    pub fn merge(&mut self, other: &Self) {
        if other.diff.max_level != DEFAULT_MAX_LEVEL {
            self.diff.max_level = other.diff.max_level;
        }

        if other.output.format != ReportFormat::Tree {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.no_color {
            self.output.no_color = true;
        }

        if other.behavior.quiet {
            self.behavior.quiet = true;
        }

        let default_store = StoreConfig::default();
        if other.store.nix_store != default_store.nix_store {
            self.store.nix_store.clone_from(&other.store.nix_store);
        }
        if !other.store.cache_enabled {
            self.store.cache_enabled = false;
        }
        if other.store.cache_dir.is_some() {
            self.store.cache_dir.clone_from(&other.store.cache_dir);
        }
        if other.store.cache_ttl_secs != default_store.cache_ttl_secs {
            self.store.cache_ttl_secs = other.store.cache_ttl_secs;
        }

        let default_roots = RootsConfig::default();
        if other.roots.current_system != default_roots.current_system {
            self.roots.current_system.clone_from(&other.roots.current_system);
        }
        if other.roots.rebuild_command != default_roots.rebuild_command {
            self.roots.rebuild_command.clone_from(&other.roots.rebuild_command);
        }

        if !other.filtering.ignore_patterns.is_empty() {
            self.filtering
                .ignore_patterns
                .extend(other.filtering.ignore_patterns.iter().cloned());
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# closure-diff configuration file
# ================================
#
# Place it at:
#   - .closure-diff.yaml in the current directory or repository root
#   - ~/.config/closure-diff/closure-diff.yaml for global config
#
# CLI arguments always override file settings.

# Diff engine
diff:
  # Version bumps and fixed-output rebuilds deeper than this level are
  # reported without walking their references
  max_level: 0

# Output configuration
output:
  # Format: tree, json
  format: tree
  # Output file path (omit for stdout)
  # file: closure-diff.json
  # Disable colored output
  no_color: false

# Behavior flags
behavior:
  # Hide fixed-output rebuilds and everything below them
  quiet: false

# Store query backend
store:
  nix_store: nix-store
  # Persist query answers between runs
  cache_enabled: true
  # cache_dir: ~/.cache/closure-diff/store-queries
  cache_ttl_secs: 3600

# Default roots
roots:
  current_system: /run/current-system
  rebuild_command: [nixos-rebuild, dry-build]

# Reference filtering
filtering:
  # References whose path contains any of these are ignored
  ignore_patterns: []
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Validatable;
    use tempfile::TempDir;

    #[test]
    fn test_search_dirs_follow_lookup_order() {
        let searched = config_search_dirs();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(searched.first(), Some(&cwd));

        // The git root, when there is one, is searched right after the cwd
        if let Some(git_root) = find_git_root() {
            assert_eq!(searched.get(1), Some(&git_root));
        }
        if let Some(home) = dirs::home_dir() {
            assert_eq!(searched.last(), Some(&home));
        }
    }

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".closure-diff.yaml");
        std::fs::write(&config_path, "diff:\n  max_level: 2\n").unwrap();

        let found = find_config_in_dir(tmp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
diff:
  max_level: 3
output:
  format: json
behavior:
  quiet: true
store:
  nix_store: /opt/nix/bin/nix-store
filtering:
  ignore_patterns: ['.patch']
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.diff.max_level, 3);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert!(config.behavior.quiet);
        assert_eq!(config.store.nix_store, "/opt/nix/bin/nix-store");
        assert!(config.store.cache_enabled);
        assert_eq!(config.filtering.ignore_patterns, vec![".patch"]);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("broken.yaml");
        std::fs::write(&config_path, "diff: [not, a, map").unwrap();

        let (config, loaded_from) = load_or_default(Some(&config_path));
        assert!(loaded_from.is_none());
        assert_eq!(config.diff.max_level, DEFAULT_MAX_LEVEL);
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::default();
        base.diff.max_level = 2;
        base.filtering.ignore_patterns = vec![".patch".to_string()];

        let overrides = AppConfig::builder()
            .quiet(true)
            .output_format(ReportFormat::Json)
            .cache_enabled(false)
            .ignore_patterns(vec![".tar.".to_string()])
            .build();
        base.merge(&overrides);

        assert_eq!(base.diff.max_level, 2);
        assert!(base.behavior.quiet);
        assert_eq!(base.output.format, ReportFormat::Json);
        assert!(!base.store.cache_enabled);
        assert_eq!(base.filtering.ignore_patterns, vec![".patch", ".tar."]);
    }

    #[test]
    fn test_generated_example_parses() {
        let full: AppConfig = serde_yaml_ng::from_str(&generate_full_example_config()).unwrap();
        assert!(full.is_valid());
        assert_eq!(full.roots.rebuild_command, vec!["nixos-rebuild", "dry-build"]);
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "behavior:\n  quiet: true\n").unwrap();

        let discovered = discover_config_file(Some(&config_path));
        assert_eq!(discovered, Some(config_path));
    }
}
