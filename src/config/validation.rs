//! Configuration validation for closure-diff.

use super::types::{
    AppConfig, BehaviorConfig, DiffSettings, FilterConfig, OutputConfig, RootsConfig, StoreConfig,
};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.diff.validate());
        errors.extend(self.output.validate());
        errors.extend(self.behavior.validate());
        errors.extend(self.store.validate());
        errors.extend(self.roots.validate());
        errors.extend(self.filtering.validate());
        errors
    }
}

impl Validatable for DiffSettings {
    fn validate(&self) -> Vec<ConfigError> {
        // Any level is meaningful; deeper levels only expand more of the graph.
        Vec::new()
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(parent) = self.file.as_ref().and_then(|f| f.parent())
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ConfigError {
                field: "output.file".to_string(),
                message: format!("Parent directory does not exist: {}", parent.display()),
            });
        }

        errors
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        Vec::new()
    }
}

impl Validatable for StoreConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.nix_store.trim().is_empty() {
            errors.push(ConfigError {
                field: "store.nix_store".to_string(),
                message: "Store query executable must not be empty".to_string(),
            });
        }

        if self.cache_enabled && self.cache_ttl_secs == 0 {
            errors.push(ConfigError {
                field: "store.cache_ttl_secs".to_string(),
                message: "Cache TTL must be at least 1 second when caching is enabled"
                    .to_string(),
            });
        }

        errors
    }
}

impl Validatable for RootsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.current_system.as_os_str().is_empty() {
            errors.push(ConfigError {
                field: "roots.current_system".to_string(),
                message: "Current system path must not be empty".to_string(),
            });
        }

        if self.rebuild_command.first().is_none_or(|c| c.trim().is_empty()) {
            errors.push(ConfigError {
                field: "roots.rebuild_command".to_string(),
                message: "Rebuild command must name an executable".to_string(),
            });
        }

        errors
    }
}

impl Validatable for FilterConfig {
    fn validate(&self) -> Vec<ConfigError> {
        self.ignore_patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_empty())
            .map(|(i, _)| ConfigError {
                field: format!("filtering.ignore_patterns[{i}]"),
                message: "Empty pattern would ignore every reference".to_string(),
            })
            .collect()
    }
}
