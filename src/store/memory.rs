//! In-memory oracle over a hand-built artifact graph.

use super::traits::ClosureOracle;
use crate::error::{ClosureDiffError, QueryErrorKind, Result};
use crate::model::StorePath;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed artifact graph held in memory.
///
/// Artifacts must be registered before they are queried; asking about an
/// unknown artifact is an error, the same way the real store rejects paths
/// it does not have.
///
/// ```
/// use closure_diff::store::{ClosureOracle, MemoryOracle};
/// use closure_diff::model::StorePath;
///
/// let oracle = MemoryOracle::new()
///     .with_artifact("/nix/store/00000000000000000000000000000000-app-1.0.drv",
///         ["/nix/store/11111111111111111111111111111111-lib-2.0.drv"],
///         ["/nix/store/22222222222222222222222222222222-app-1.0"]);
///
/// let app = StorePath::parse("/nix/store/00000000000000000000000000000000-app-1.0.drv");
/// assert_eq!(oracle.references(&app).unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryOracle {
    references: HashMap<StorePath, BTreeSet<StorePath>>,
    outputs: HashMap<StorePath, BTreeSet<String>>,
    derivers: HashMap<PathBuf, StorePath>,
    queries: AtomicUsize,
}

impl MemoryOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact with its direct references and declared outputs.
    #[must_use]
    pub fn with_artifact<R, O>(mut self, path: &str, references: R, outputs: O) -> Self
    where
        R: IntoIterator,
        R::Item: Into<StorePath>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        self.insert(path, references, outputs);
        self
    }

    /// Register a filesystem path as produced by `drv`.
    #[must_use]
    pub fn with_deriver(mut self, path: impl Into<PathBuf>, drv: &str) -> Self {
        self.derivers.insert(path.into(), StorePath::parse(drv));
        self
    }

    /// Non-consuming form of [`with_artifact`](Self::with_artifact).
    pub fn insert<R, O>(&mut self, path: &str, references: R, outputs: O)
    where
        R: IntoIterator,
        R::Item: Into<StorePath>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let artifact = StorePath::parse(path);
        self.references.insert(
            artifact.clone(),
            references.into_iter().map(Into::into).collect(),
        );
        self.outputs
            .insert(artifact, outputs.into_iter().map(Into::into).collect());
    }

    /// Number of reference/output queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Number of registered artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl ClosureOracle for MemoryOracle {
    fn deriver(&self, path: &Path) -> Result<StorePath> {
        self.derivers.get(path).cloned().ok_or_else(|| {
            ClosureDiffError::query(
                format!("resolving deriver of {}", path.display()),
                QueryErrorKind::NoDeriver(path.display().to_string()),
            )
        })
    }

    fn references(&self, artifact: &StorePath) -> Result<BTreeSet<StorePath>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.references
            .get(artifact)
            .cloned()
            .ok_or_else(|| ClosureDiffError::unknown_artifact(artifact.as_str()))
    }

    fn outputs(&self, artifact: &StorePath) -> Result<BTreeSet<String>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.outputs
            .get(artifact)
            .cloned()
            .ok_or_else(|| ClosureDiffError::unknown_artifact(artifact.as_str()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
