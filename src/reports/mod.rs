//! Report generation for diff results.
//!
//! Two output formats are available:
//! - Tree: indented, depth-first explanation of every change for the terminal
//! - JSON: the classified node map for programmatic consumers

mod json;
mod tree;
mod types;

pub use json::JsonReporter;
pub use tree::TreeReporter;
pub use types::{ReportConfig, ReportFormat, ReportMetadata};

use crate::diff::DiffTree;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report from a diff tree
    fn generate_diff_report(
        &self,
        tree: &DiffTree,
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Tree => Box::new(TreeReporter::new()),
        ReportFormat::Json => Box::new(JsonReporter::new()),
    }
}
