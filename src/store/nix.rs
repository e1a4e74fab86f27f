//! Oracle backed by the `nix-store --query` command.

use super::cache::{CacheKey, FileCache, QueryKind};
use super::traits::ClosureOracle;
use crate::error::{ClosureDiffError, QueryErrorKind, Result};
use crate::model::StorePath;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Answer printed by `--deriver` when the store has no record.
const UNKNOWN_DERIVER: &str = "unknown-deriver";

/// Queries the local store through the `nix-store` executable.
///
/// Every answer is memoized in memory for the lifetime of the oracle, and
/// optionally persisted to a [`FileCache`] across runs.
pub struct NixStoreOracle {
    program: String,
    file_cache: Option<FileCache>,
    memo: Mutex<HashMap<CacheKey, Vec<String>>>,
}

impl NixStoreOracle {
    /// Create an oracle that runs `program` (usually `nix-store`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            file_cache: None,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Persist answers in `cache` between runs.
    #[must_use]
    pub fn with_file_cache(mut self, cache: FileCache) -> Self {
        self.file_cache = Some(cache);
        self
    }

    /// Number of distinct queries answered during this run.
    pub fn memoized_queries(&self) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn query(&self, kind: QueryKind, path: &str) -> Result<Vec<String>> {
        let key = CacheKey::new(kind, path);

        if let Some(lines) = self
            .memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(lines.clone());
        }

        let lines = match self.file_cache.as_ref().and_then(|c| c.get(&key)) {
            Some(lines) => lines,
            None => {
                let lines = self.run(kind, path)?;
                if let Some(cache) = &self.file_cache
                    && let Err(e) = cache.set(&key, &lines)
                {
                    tracing::warn!("Failed to cache {kind} answer for {path}: {e}");
                }
                lines
            }
        };

        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, lines.clone());
        Ok(lines)
    }

    fn run(&self, kind: QueryKind, path: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(["--query", kind.flag(), path])
            .output()
            .map_err(|e| {
                ClosureDiffError::query(
                    format!("{kind} {path}"),
                    QueryErrorKind::ToolUnavailable {
                        tool: self.program.clone(),
                        reason: e.to_string(),
                    },
                )
            })?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            stdout_bytes = output.stdout.len(),
            "{} --query {kind} {path}",
            self.program
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClosureDiffError::query(
                format!("{kind} {path}"),
                QueryErrorKind::ToolFailed {
                    command: format!("{} --query {kind} {path}", self.program),
                    status: output.status.to_string(),
                    stderr: stderr.trim().lines().next().unwrap_or_default().to_string(),
                },
            ));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            ClosureDiffError::query(
                format!("{kind} {path}"),
                QueryErrorKind::InvalidOutput(e.to_string()),
            )
        })?;
        Ok(parse_lines(&stdout))
    }
}

/// Split newline-delimited query output into non-empty, trimmed lines.
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl ClosureOracle for NixStoreOracle {
    fn deriver(&self, path: &Path) -> Result<StorePath> {
        let display = path.display().to_string();
        let lines = self.query(QueryKind::Deriver, &display)?;
        match lines.first().map(String::as_str) {
            Some(UNKNOWN_DERIVER) | None => Err(ClosureDiffError::query(
                format!("resolving deriver of {display}"),
                QueryErrorKind::NoDeriver(display),
            )),
            Some(drv) => Ok(StorePath::parse(drv)),
        }
    }

    fn references(&self, artifact: &StorePath) -> Result<BTreeSet<StorePath>> {
        Ok(self
            .query(QueryKind::References, artifact.as_str())?
            .into_iter()
            .map(StorePath::parse)
            .collect())
    }

    fn outputs(&self, artifact: &StorePath) -> Result<BTreeSet<String>> {
        Ok(self
            .query(QueryKind::Outputs, artifact.as_str())?
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
