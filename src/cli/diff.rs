//! Diff command handler.
//!
//! Resolves the two roots, diffs them, and writes the report.

use crate::config::{AppConfig, Validatable};
use crate::pipeline::{
    OutputTarget, RootResolver, build_oracle, compute_diff, exit_codes, output_report,
    write_output,
};
use crate::reports::ReportMetadata;
use crate::store::ClosureOracle;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

/// Printed when no rebuild is pending.
pub const NO_UPDATES: &str = "No system updates";

/// Everything the diff command needs.
#[derive(Debug, Clone, Default)]
pub struct DiffRequest {
    /// Old root (defaults to the running system)
    pub old: Option<PathBuf>,
    /// New root (defaults to the pending rebuild)
    pub new: Option<PathBuf>,
    /// Effective configuration (file merged with flags)
    pub config: AppConfig,
}

/// Run the diff command against the local store, returning the exit code.
pub fn run_diff(request: &DiffRequest) -> Result<i32> {
    let oracle = build_oracle(&request.config.store);
    let exit_code = run_diff_with(&oracle, request)?;
    tracing::debug!(queries = oracle.memoized_queries(), "Store queries answered");
    Ok(exit_code)
}

/// Run the diff command against any oracle.
pub fn run_diff_with(oracle: &dyn ClosureOracle, request: &DiffRequest) -> Result<i32> {
    validate(&request.config)?;
    let config = &request.config;
    let resolver = RootResolver::new(oracle, &config.roots);

    let Some(new) = resolver
        .resolve_new(request.new.as_deref())
        .context("Failed to resolve the new root")?
    else {
        let target = OutputTarget::from_option(config.output.file.clone());
        write_output(NO_UPDATES, &target)?;
        return Ok(exit_codes::SUCCESS);
    };
    let old = resolver
        .resolve_old(request.old.as_deref())
        .context("Failed to resolve the old root")?;

    let tree = compute_diff(oracle, config, &old, &new)?;

    let metadata = ReportMetadata {
        old_root: Some(old.to_string()),
        new_root: Some(new.to_string()),
        ..ReportMetadata::new()
    };
    output_report(config, &tree, metadata)?;

    Ok(exit_codes::SUCCESS)
}

fn validate(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    bail!("Invalid configuration:\n  {}", details.join("\n  "))
}
