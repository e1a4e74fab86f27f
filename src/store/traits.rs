//! The query interface the diff engine consumes.

use crate::error::Result;
use crate::model::StorePath;
use std::collections::BTreeSet;
use std::path::Path;

/// Answers reference and output questions about store artifacts.
///
/// Answers for a given artifact must be stable for the duration of one diff
/// run. Implementations are free to memoize; the engine calls these freely
/// and relies on the oracle to avoid repeated work for shared dependencies.
pub trait ClosureOracle {
    /// Resolve a live filesystem path to the recipe that produced it.
    fn deriver(&self, path: &Path) -> Result<StorePath>;

    /// Direct, one-hop references of an artifact.
    fn references(&self, artifact: &StorePath) -> Result<BTreeSet<StorePath>>;

    /// Output paths declared by a recipe.
    fn outputs(&self, artifact: &StorePath) -> Result<BTreeSet<String>>;

    /// Name of this oracle for logging/debugging.
    fn name(&self) -> &str;
}
