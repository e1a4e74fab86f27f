//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{DiffNode, DiffSummary, DiffTree};
use crate::model::StorePath;
use chrono::Utc;
use serde::Serialize;
use std::borrow::Cow;

/// JSON report generator
///
/// Under `quiet`, nodes and counts cover only what the tree report would
/// print: `Fixed` nodes and anything reachable only through them are left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_diff_report(
        &self,
        tree: &DiffTree,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let tree = if config.quiet {
            Cow::Owned(tree.without_fixed())
        } else {
            Cow::Borrowed(tree)
        };
        let report = JsonDiffReport {
            metadata: JsonReportMetadata {
                tool: ToolInfo {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: config.metadata.tool_version.clone(),
                },
                generated_at: Utc::now().to_rfc3339(),
                old_root: config.metadata.old_root.as_deref(),
                new_root: config.metadata.new_root.as_deref(),
            },
            root: tree.root(),
            summary: tree.summary(),
            nodes: tree
                .iter()
                .map(|(path, node)| JsonNode { path, node })
                .collect(),
        };

        serde_json::to_string_pretty(&report)
            .map_err(|e| ReportError::SerializationError(e.to_string()))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

#[derive(Serialize)]
struct JsonDiffReport<'a> {
    metadata: JsonReportMetadata<'a>,
    root: &'a StorePath,
    summary: DiffSummary,
    nodes: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonReportMetadata<'a> {
    tool: ToolInfo,
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_root: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_root: Option<&'a str>,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    path: &'a StorePath,
    #[serde(flatten)]
    node: &'a DiffNode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use crate::store::MemoryOracle;

    const OLD: &str = "/nix/store/00000000000000000000000000000000-app-1.0.drv";
    const NEW: &str = "/nix/store/11111111111111111111111111111111-app-1.0.drv";
    const LIB_OLD: &str = "/nix/store/22222222222222222222222222222222-lib-1.0.drv";
    const LIB_NEW: &str = "/nix/store/33333333333333333333333333333333-lib-1.1.drv";

    #[test]
    fn test_json_report_structure() {
        let oracle = MemoryOracle::new()
            .with_artifact(OLD, [LIB_OLD], ["/nix/store/o-app"])
            .with_artifact(NEW, [LIB_NEW], ["/nix/store/n-app"]);
        let tree = DiffEngine::new(&oracle)
            .diff(Some(&StorePath::parse(OLD)), &StorePath::parse(NEW))
            .unwrap();

        let json = JsonReporter::new()
            .generate_diff_report(&tree, &ReportConfig::plain())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["root"], NEW);
        assert_eq!(value["summary"]["total_nodes"], 2);
        assert_eq!(value["summary"]["version"], 1);
        assert!(value["metadata"]["generated_at"].is_string());

        let nodes = value["nodes"].as_array().unwrap();
        let root = nodes.iter().find(|n| n["path"] == NEW).unwrap();
        assert_eq!(root["shape"], "expanded");
        assert_eq!(root["change"], "normal");
        assert_eq!(root["previous"], OLD);
        assert_eq!(root["added"][0]["path"], LIB_NEW);
        assert_eq!(root["added"][0]["match"], "version");

        let lib = nodes.iter().find(|n| n["path"] == LIB_NEW).unwrap();
        assert_eq!(lib["shape"], "leaf");
        assert_eq!(lib["previous"], LIB_OLD);
    }
}
