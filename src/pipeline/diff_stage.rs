//! Diff computation stage.
//!
//! Builds the store oracle from configuration and runs the engine between
//! two resolved roots.

use super::dirs;
use crate::config::{AppConfig, StoreConfig};
use crate::diff::{DiffEngine, DiffTree};
use crate::model::StorePath;
use crate::store::{ClosureOracle, FileCache, NixStoreOracle};
use anyhow::{Context, Result};
use std::time::Duration;

/// Build the store-backed oracle, with the persistent cache when enabled.
///
/// A cache directory that cannot be created only disables caching.
pub fn build_oracle(store: &StoreConfig) -> NixStoreOracle {
    let oracle = NixStoreOracle::new(&store.nix_store);
    if !store.cache_enabled {
        return oracle;
    }

    let cache_dir = store
        .cache_dir
        .clone()
        .unwrap_or_else(dirs::query_cache_dir);
    match FileCache::new(cache_dir, Duration::from_secs(store.cache_ttl_secs)) {
        Ok(cache) => oracle.with_file_cache(cache),
        Err(e) => {
            tracing::warn!("Store query cache disabled: {e}");
            oracle
        }
    }
}

/// Run the diff engine between `old` and `new` with the configured options.
pub fn compute_diff(
    oracle: &dyn ClosureOracle,
    config: &AppConfig,
    old: &StorePath,
    new: &StorePath,
) -> Result<DiffTree> {
    let tree = DiffEngine::new(oracle)
        .with_max_level(config.diff.max_level)
        .with_ignore_patterns(config.filtering.ignore_patterns.clone())
        .diff(Some(old), new)
        .context("Failed to compute closure diff")?;

    let summary = tree.summary();
    tracing::info!(
        nodes = summary.total_nodes,
        new = summary.new,
        version = summary.version,
        expression = summary.expression,
        fixed = summary.fixed,
        removed = summary.removed,
        "Diff summary"
    );
    Ok(tree)
}
