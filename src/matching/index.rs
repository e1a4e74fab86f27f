//! Predecessor index over the references an artifact lost.
//!
//! When a recipe's reference set changes, most "removed" references are
//! really older builds of "added" ones: the same package at a new hash, or
//! the same package at a bumped version. The index pairs them up so the
//! report can say `openssl 3.0.12 → 3.0.13` instead of listing one removal
//! and one addition.

use super::traits::{MatchTier, PredecessorMatch};
use crate::model::StorePath;
use crate::utils::compare_versions;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Versioned artifacts are only compared within a (name, has-extension) bucket,
/// so `foo-1.2.tar.gz` never pairs with `foo-1.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    name: String,
    has_extension: bool,
}

impl BucketKey {
    fn of(path: &StorePath) -> Self {
        Self {
            name: path.name().to_string(),
            has_extension: path.extension().is_some(),
        }
    }
}

/// Index of unmatched candidates.
///
/// A candidate leaves every structure as soon as it is matched, so it can
/// be matched at most once and never shows up in [`into_remaining`](Self::into_remaining).
#[derive(Debug, Default)]
pub struct PredecessorIndex {
    /// Full name -> candidates, in path order
    by_full_name: HashMap<String, Vec<StorePath>>,
    /// Bucket -> versioned candidates, in version order
    by_bucket: HashMap<BucketKey, Vec<StorePath>>,
    /// All candidates not yet matched
    remaining: BTreeSet<StorePath>,
}

impl PredecessorIndex {
    /// Build an index from the candidates an artifact no longer references.
    pub fn build(candidates: BTreeSet<StorePath>) -> Self {
        let mut by_full_name: HashMap<String, Vec<StorePath>> = HashMap::new();
        let mut by_bucket: HashMap<BucketKey, Vec<StorePath>> = HashMap::new();

        // BTreeSet iteration keeps every bucket in path order before sorting
        for path in &candidates {
            by_full_name
                .entry(path.full_name().to_string())
                .or_default()
                .push(path.clone());

            if path.version().is_some() {
                by_bucket
                    .entry(BucketKey::of(path))
                    .or_default()
                    .push(path.clone());
            }
        }

        for bucket in by_bucket.values_mut() {
            bucket.sort_by(|a, b| version_order(a, b).then_with(|| a.cmp(b)));
        }

        Self {
            by_full_name,
            by_bucket,
            remaining: candidates,
        }
    }

    /// Find and claim the most plausible predecessor of `target`.
    ///
    /// Tries an exact full-name match first, then the largest version not
    /// greater than the target's within its bucket. A claimed candidate is
    /// removed from the index.
    pub fn take_predecessor(&mut self, target: &StorePath) -> Option<PredecessorMatch> {
        let found = self
            .exact_name(target)
            .map(|p| PredecessorMatch::new(p, MatchTier::Exact))
            .or_else(|| {
                self.nearest_lower_version(target)
                    .map(|p| PredecessorMatch::new(p, MatchTier::Version))
            })?;

        self.remove(&found.previous);
        Some(found)
    }

    fn exact_name(&self, target: &StorePath) -> Option<StorePath> {
        self.by_full_name
            .get(target.full_name())
            .and_then(|candidates| candidates.first())
            .cloned()
    }

    fn nearest_lower_version(&self, target: &StorePath) -> Option<StorePath> {
        let version = target.version()?;
        let bucket = self.by_bucket.get(&BucketKey::of(target))?;

        let insertion = bucket.partition_point(|candidate| {
            compare_versions(candidate.version().unwrap_or_default(), version) != Ordering::Greater
        });
        insertion.checked_sub(1).map(|i| bucket[i].clone())
    }

    fn remove(&mut self, path: &StorePath) {
        self.remaining.remove(path);

        if let Some(candidates) = self.by_full_name.get_mut(path.full_name()) {
            candidates.retain(|c| c != path);
            if candidates.is_empty() {
                self.by_full_name.remove(path.full_name());
            }
        }

        if path.version().is_some() {
            let key = BucketKey::of(path);
            if let Some(bucket) = self.by_bucket.get_mut(&key) {
                bucket.retain(|c| c != path);
                if bucket.is_empty() {
                    self.by_bucket.remove(&key);
                }
            }
        }
    }

    /// Consume the index, returning unmatched candidates sorted by path.
    #[must_use]
    pub fn into_remaining(self) -> Vec<StorePath> {
        self.remaining.into_iter().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

fn version_order(a: &StorePath, b: &StorePath) -> Ordering {
    compare_versions(
        a.version().unwrap_or_default(),
        b.version().unwrap_or_default(),
    )
}
