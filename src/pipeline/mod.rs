//! Pipeline orchestration for closure diffs.
//!
//! Shared resolve → diff → report logic used by the CLI command handlers.

mod diff_stage;
mod output;
mod report_stage;
mod roots;

pub use diff_stage::{build_oracle, compute_diff};
pub use output::{OutputTarget, should_use_color, write_output};
pub use report_stage::output_report;
pub use roots::{RootResolver, scrape_system_drv};

/// Process exit codes
pub mod exit_codes {
    /// The diff completed, or there was nothing to compare
    pub const SUCCESS: i32 = 0;
    /// An error occurred
    pub const ERROR: i32 = 1;
}

/// Platform-specific cache directory utilities
pub mod dirs {
    use std::path::PathBuf;

    /// Get the default store query cache directory
    #[must_use]
    pub fn query_cache_dir() -> PathBuf {
        ::dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("closure-diff")
            .join("store-queries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_cache_dir_path() {
        let path = dirs::query_cache_dir();
        assert!(path.ends_with("closure-diff/store-queries"));
    }
}
