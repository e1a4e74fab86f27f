//! Report output stage.

use super::{OutputTarget, should_use_color, write_output};
use crate::config::AppConfig;
use crate::diff::DiffTree;
use crate::reports::{ReportConfig, ReportMetadata, create_reporter};
use anyhow::Result;

/// Render a diff report and write it to the configured destination.
pub fn output_report(config: &AppConfig, tree: &DiffTree, metadata: ReportMetadata) -> Result<()> {
    let target = OutputTarget::from_option(config.output.file.clone());

    let report_config = ReportConfig {
        quiet: config.behavior.quiet,
        colored: should_use_color(config.output.no_color, &target),
        metadata,
    };

    let reporter = create_reporter(config.output.format);
    let report = reporter.generate_diff_report(tree, &report_config)?;
    write_output(&report, &target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use crate::model::StorePath;
    use crate::reports::ReportFormat;
    use crate::store::MemoryOracle;
    use tempfile::TempDir;

    #[test]
    fn test_report_written_to_file_without_color() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tree.txt");
        let new = StorePath::parse("/nix/store/00000000000000000000000000000000-foo-1.0.drv");
        let oracle = MemoryOracle::new();
        let tree = DiffEngine::new(&oracle).diff(None, &new).unwrap();

        let config = AppConfig::builder()
            .output_format(ReportFormat::Tree)
            .output_file(Some(path.clone()))
            .build();
        output_report(&config, &tree, ReportMetadata::new()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format!("{new}: seems to be new\n"));
    }
}
