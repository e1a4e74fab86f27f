//! Root resolution: which two system recipes to compare.

use crate::config::RootsConfig;
use crate::error::{ClosureDiffError, ErrorContext, QueryErrorKind, Result};
use crate::model::{RECIPE_SUFFIX, StorePath};
use crate::store::ClosureOracle;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Instant;

/// Store prefix of every artifact path.
const STORE_DIR: &str = "/nix/store/";

/// A system recipe path as printed by a dry-run rebuild.
static SYSTEM_DRV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/nix/store/[0-9a-z]{32}-nixos-system-[^\s'\x22]*\.drv").expect("static regex")
});

/// Find the first system recipe mentioned in rebuild output.
#[must_use]
pub fn scrape_system_drv(output: &str) -> Option<StorePath> {
    SYSTEM_DRV
        .find(output)
        .map(|m| StorePath::parse(m.as_str()))
}

/// Resolves the old and new roots of a diff.
pub struct RootResolver<'a> {
    oracle: &'a dyn ClosureOracle,
    roots: &'a RootsConfig,
}

impl<'a> RootResolver<'a> {
    pub fn new(oracle: &'a dyn ClosureOracle, roots: &'a RootsConfig) -> Self {
        Self { oracle, roots }
    }

    /// The explicit old root, or the recipe of the running system.
    pub fn resolve_old(&self, explicit: Option<&Path>) -> Result<StorePath> {
        let root = self.resolve_path(explicit.unwrap_or(self.roots.current_system.as_path()))?;
        tracing::info!(root = root.as_str(), "Resolved old root");
        Ok(root)
    }

    /// The explicit new root, or the system recipe a rebuild would produce.
    ///
    /// `None` means there is nothing pending to compare against.
    pub fn resolve_new(&self, explicit: Option<&Path>) -> Result<Option<StorePath>> {
        let root = match explicit {
            Some(path) => Some(self.resolve_path(path)?),
            None => self.pending_system()?,
        };
        if let Some(root) = &root {
            tracing::info!(root = root.as_str(), "Resolved new root");
        }
        Ok(root)
    }

    /// A recipe path is used as-is; anything else is followed to the
    /// recipe that produced it.
    pub fn resolve_path(&self, path: &Path) -> Result<StorePath> {
        if let Some(s) = path.to_str()
            && s.starts_with(STORE_DIR)
            && s.ends_with(RECIPE_SUFFIX)
        {
            return Ok(StorePath::parse(s));
        }

        let resolved = path
            .canonicalize()
            .map_err(|e| ClosureDiffError::io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            resolved = %resolved.display(),
            "Resolving deriver"
        );
        self.oracle
            .deriver(&resolved)
            .with_context(|| format!("resolving {}", path.display()))
    }

    fn pending_system(&self) -> Result<Option<StorePath>> {
        let Some((program, args)) = self.roots.rebuild_command.split_first() else {
            return Err(ClosureDiffError::config("roots.rebuild_command is empty"));
        };
        let command = self.roots.rebuild_command.join(" ");

        let start = Instant::now();
        let output = Command::new(program).args(args).output().map_err(|e| {
            ClosureDiffError::query(
                "finding the pending system",
                QueryErrorKind::ToolUnavailable {
                    tool: program.clone(),
                    reason: e.to_string(),
                },
            )
        })?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = %output.status,
            "{command}"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClosureDiffError::query(
                "finding the pending system",
                QueryErrorKind::ToolFailed {
                    command,
                    status: output.status.to_string(),
                    stderr: stderr.trim().lines().next().unwrap_or_default().to_string(),
                },
            ));
        }

        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(scrape_system_drv(&combined))
    }
}
