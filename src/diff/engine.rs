//! Recursive closure diff engine.

use super::result::{ChangeType, DiffChild, DiffNode, DiffTree};
use crate::error::{ErrorContext, Result};
use crate::matching::PredecessorIndex;
use crate::model::StorePath;
use crate::store::ClosureOracle;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

/// Diff engine comparing two artifact graphs through a [`ClosureOracle`].
///
/// The engine walks the new graph from its root. For every artifact it
/// looks for a predecessor in the old graph, classifies the difference,
/// and only descends into references when the classification cannot be
/// decided locally.
pub struct DiffEngine<'a> {
    oracle: &'a dyn ClosureOracle,
    max_level: u32,
    ignore_patterns: Vec<String>,
}

/// Mutable state of one diff run.
#[derive(Default)]
struct DiffRun {
    nodes: IndexMap<StorePath, DiffNode>,
    /// Artifacts whose children are being walked
    in_progress: HashSet<StorePath>,
}

impl<'a> DiffEngine<'a> {
    /// Create a diff engine with a cutoff level of 0 and no filtering.
    pub fn new(oracle: &'a dyn ClosureOracle) -> Self {
        Self {
            oracle,
            max_level: 0,
            ignore_patterns: Vec::new(),
        }
    }

    /// Depth past which version bumps and fixed-output rebuilds are not expanded.
    #[must_use]
    pub const fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }

    /// Drop references whose path contains any of `patterns`.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Diff `new` against `old` (absent when `new` has no predecessor).
    ///
    /// Any oracle failure aborts the run.
    pub fn diff(&self, old: Option<&StorePath>, new: &StorePath) -> Result<DiffTree> {
        tracing::info!(
            old = old.map_or("-", StorePath::as_str),
            new = new.as_str(),
            oracle = self.oracle.name(),
            max_level = self.max_level,
            "Diffing closures"
        );

        let mut run = DiffRun::default();
        self.diff_pair(&mut run, old, new, 0)?;

        tracing::info!(nodes = run.nodes.len(), "Diff complete");
        Ok(DiffTree::new(new.clone(), run.nodes))
    }

    fn diff_pair(
        &self,
        run: &mut DiffRun,
        old: Option<&StorePath>,
        new: &StorePath,
        level: u32,
    ) -> Result<()> {
        if run.nodes.contains_key(new) || run.in_progress.contains(new) {
            return Ok(());
        }

        let Some(old) = old else {
            record_leaf(run, new, ChangeType::New, None, level);
            return Ok(());
        };

        if !old.is_drv() || !new.is_drv() {
            record_leaf(run, new, ChangeType::Source, Some(old), level);
            return Ok(());
        }

        let cutoff = level > self.max_level;
        let mut pending = None;

        if old.version() != new.version() {
            if cutoff {
                record_leaf(run, new, ChangeType::Version, Some(old), level);
                return Ok(());
            }
            pending = Some(ChangeType::Version);
        }

        if self.outputs(old)? == self.outputs(new)? {
            if cutoff {
                record_leaf(run, new, ChangeType::Fixed, Some(old), level);
                return Ok(());
            }
            pending.get_or_insert(ChangeType::Fixed);
        }

        let old_refs = self.references(old)?;
        let new_refs = self.references(new)?;
        if old_refs == new_refs {
            let change = pending.unwrap_or(ChangeType::Expression);
            record_leaf(run, new, change, Some(old), level);
            return Ok(());
        }

        let mut index = PredecessorIndex::build(old_refs.difference(&new_refs).cloned().collect());
        let added: Vec<StorePath> = new_refs.difference(&old_refs).cloned().collect();

        run.in_progress.insert(new.clone());
        let mut children = Vec::with_capacity(added.len());
        for child in added {
            let found = index.take_predecessor(&child);
            if let Some(m) = &found {
                tracing::debug!(
                    child = child.as_str(),
                    previous = m.previous.as_str(),
                    tier = %m.tier,
                    "Matched predecessor"
                );
            }

            self.diff_pair(run, found.as_ref().map(|m| &m.previous), &child, level + 1)?;
            children.push(DiffChild {
                path: child,
                tier: found.map(|m| m.tier),
            });
        }
        run.in_progress.remove(new);

        let change = pending.unwrap_or(ChangeType::Normal);
        tracing::debug!(path = new.as_str(), level, %change, children = children.len(), "Expanded");
        run.nodes.insert(
            new.clone(),
            DiffNode::Expanded {
                change,
                previous: old.clone(),
                removed: index.into_remaining(),
                added: children,
            },
        );
        Ok(())
    }

    fn outputs(&self, artifact: &StorePath) -> Result<BTreeSet<String>> {
        self.oracle
            .outputs(artifact)
            .with_context(|| format!("querying outputs of {}", artifact.full_name()))
    }

    fn references(&self, artifact: &StorePath) -> Result<BTreeSet<StorePath>> {
        let mut refs = self
            .oracle
            .references(artifact)
            .with_context(|| format!("querying references of {}", artifact.full_name()))?;
        if !self.ignore_patterns.is_empty() {
            refs.retain(|r| !self.ignore_patterns.iter().any(|p| r.as_str().contains(p.as_str())));
        }
        Ok(refs)
    }
}

fn record_leaf(
    run: &mut DiffRun,
    new: &StorePath,
    change: ChangeType,
    previous: Option<&StorePath>,
    level: u32,
) {
    tracing::debug!(path = new.as_str(), level, %change, "Classified");
    run.nodes.insert(
        new.clone(),
        DiffNode::Leaf {
            change,
            previous: previous.cloned(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchTier;
    use crate::store::MemoryOracle;

    const NONE: [&str; 0] = [];

    fn drv(hash: char, name: &str) -> String {
        let hash: String = std::iter::repeat_n(hash, 32).collect();
        format!("/nix/store/{hash}-{name}.drv")
    }

    fn out(hash: char, name: &str) -> String {
        let hash: String = std::iter::repeat_n(hash, 32).collect();
        format!("/nix/store/{hash}-{name}")
    }

    fn sp(path: &str) -> StorePath {
        StorePath::parse(path)
    }

    #[test]
    fn test_missing_predecessor_is_new() {
        let oracle = MemoryOracle::new();
        let new = sp(&drv('a', "foo-1.0"));

        let tree = DiffEngine::new(&oracle).diff(None, &new).unwrap();
        assert_eq!(tree.get(&new).unwrap().change(), ChangeType::New);
        assert_eq!(oracle.query_count(), 0);
    }

    #[test]
    fn test_plain_source_is_not_recursed() {
        let oracle = MemoryOracle::new();
        let old = sp(&out('a', "source"));
        let new = sp(&out('b', "source"));

        let tree = DiffEngine::new(&oracle).diff(Some(&old), &new).unwrap();
        let node = tree.get(&new).unwrap();
        assert_eq!(node.change(), ChangeType::Source);
        assert_eq!(node.previous(), Some(&old));
    }

    #[test]
    fn test_same_references_is_expression_change() {
        let lib = drv('c', "lib-2.0");
        let old = drv('a', "foo-1.0");
        let new = drv('b', "foo-1.0");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [lib.as_str()], [out('d', "foo-1.0")])
            .with_artifact(&new, [lib.as_str()], [out('e', "foo-1.0")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        assert_eq!(tree.get(&sp(&new)).unwrap().change(), ChangeType::Expression);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_version_bump_at_root_keeps_version() {
        let lib = drv('c', "lib-2.0");
        let old = drv('a', "foo-1.0");
        let new = drv('b', "foo-1.1");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [lib.as_str()], [out('d', "foo-1.0")])
            .with_artifact(&new, [lib.as_str()], [out('e', "foo-1.1")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        let node = tree.get(&sp(&new)).unwrap();
        assert_eq!(node.change(), ChangeType::Version);
        assert!(!node.has_children());
    }

    #[test]
    fn test_version_bump_below_cutoff_is_not_expanded() {
        let old_lib = drv('c', "lib-1.0");
        let new_lib = drv('d', "lib-1.1");
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        // Children of the libraries are never queried.
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [old_lib.as_str()], [out('e', "app-1.0")])
            .with_artifact(&new, [new_lib.as_str()], [out('f', "app-1.0")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        let lib = tree.get(&sp(&new_lib)).unwrap();
        assert_eq!(lib.change(), ChangeType::Version);
        assert_eq!(lib.previous(), Some(&sp(&old_lib)));

        let root = tree.get(&sp(&new)).unwrap();
        assert_eq!(root.change(), ChangeType::Normal);
        assert!(root.removed().is_empty());
        assert_eq!(root.added()[0].tier, Some(MatchTier::Version));
    }

    #[test]
    fn test_fixed_output_below_cutoff() {
        let fetch_old = drv('c', "source");
        let fetch_new = drv('d', "source");
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [fetch_old.as_str()], [out('e', "app-1.0")])
            .with_artifact(&new, [fetch_new.as_str()], [out('f', "app-1.0")])
            .with_artifact(&fetch_old, [drv('g', "curl-8.0")], [out('z', "source")])
            .with_artifact(&fetch_new, [drv('h', "curl-8.1")], [out('z', "source")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        let node = tree.get(&sp(&fetch_new)).unwrap();
        assert_eq!(node.change(), ChangeType::Fixed);
        assert!(!node.has_children());
        assert!(tree.get(&sp(&drv('h', "curl-8.1"))).is_none());
    }

    #[test]
    fn test_fixed_output_within_cutoff_expands() {
        let old = drv('a', "source");
        let new = drv('b', "source");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [drv('g', "curl-8.0")], [out('z', "source")])
            .with_artifact(&new, [drv('h', "curl-8.1")], [out('z', "source")])
            .with_artifact(&drv('g', "curl-8.0"), NONE, [out('x', "curl-8.0")])
            .with_artifact(&drv('h', "curl-8.1"), NONE, [out('y', "curl-8.1")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        let root = tree.get(&sp(&new)).unwrap();
        assert_eq!(root.change(), ChangeType::Fixed);
        assert!(root.has_children());
        assert_eq!(
            tree.get(&sp(&drv('h', "curl-8.1"))).unwrap().change(),
            ChangeType::Version
        );
    }

    #[test]
    fn test_version_takes_precedence_over_fixed() {
        let old = drv('a', "src-1.0");
        let new = drv('b', "src-1.1");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [drv('g', "curl-8.0")], [out('z', "src")])
            .with_artifact(&new, [drv('h', "curl-8.1")], [out('z', "src")])
            .with_artifact(&drv('g', "curl-8.0"), NONE, [out('x', "curl-8.0")])
            .with_artifact(&drv('h', "curl-8.1"), NONE, [out('y', "curl-8.1")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        assert_eq!(tree.get(&sp(&new)).unwrap().change(), ChangeType::Version);
    }

    #[test]
    fn test_unmatched_references_are_removed_and_new() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let gone = drv('c', "pkgB-2.0");
        let fresh = drv('d', "zlib-1.3");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [gone.as_str()], [out('e', "app")])
            .with_artifact(&new, [fresh.as_str()], [out('f', "app")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        let root = tree.get(&sp(&new)).unwrap();
        assert_eq!(root.removed(), &[sp(&gone)]);
        assert_eq!(root.added()[0].tier, None);
        assert_eq!(tree.get(&sp(&fresh)).unwrap().change(), ChangeType::New);
    }

    #[test]
    fn test_shared_child_is_diffed_once() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let old_left = drv('c', "left-1");
        let new_left = drv('d', "left-1");
        let old_right = drv('e', "right-1");
        let new_right = drv('f', "right-1");
        let old_shared = drv('g', "shared-1");
        let new_shared = drv('h', "shared-1");

        let oracle = MemoryOracle::new()
            .with_artifact(&old, [old_left.as_str(), old_right.as_str()], [out('i', "app")])
            .with_artifact(&new, [new_left.as_str(), new_right.as_str()], [out('j', "app")])
            .with_artifact(&old_left, [old_shared.as_str()], [out('k', "left")])
            .with_artifact(&new_left, [new_shared.as_str()], [out('l', "left")])
            .with_artifact(&old_right, [old_shared.as_str()], [out('m', "right")])
            .with_artifact(&new_right, [new_shared.as_str()], [out('n', "right")])
            .with_artifact(&old_shared, NONE, [out('o', "shared")])
            .with_artifact(&new_shared, [drv('p', "extra-1")], [out('q', "shared")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        assert_eq!(tree.len(), 5);
        let shared_queries_before = oracle.query_count();

        let left = tree.get(&sp(&new_left)).unwrap();
        let right = tree.get(&sp(&new_right)).unwrap();
        assert_eq!(left.added()[0].path, sp(&new_shared));
        assert_eq!(right.added()[0].path, sp(&new_shared));
        // app: 4 queries, left: 4, right: 4, shared: 4
        assert_eq!(shared_queries_before, 16);
    }

    #[test]
    fn test_ignore_patterns_filter_references() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let lib = drv('c', "lib-1.0");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [lib.as_str(), drv('d', "fix.patch").as_str()], [out('e', "app")])
            .with_artifact(&new, [lib.as_str(), drv('f', "fix.patch").as_str()], [out('g', "app")]);

        let tree = DiffEngine::new(&oracle)
            .with_ignore_patterns(vec![".patch".to_string()])
            .diff(Some(&sp(&old)), &sp(&new))
            .unwrap();
        assert_eq!(tree.get(&sp(&new)).unwrap().change(), ChangeType::Expression);
    }

    #[test]
    fn test_self_reference_does_not_loop() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, NONE, [out('c', "app")])
            .with_artifact(&new, [new.as_str()], [out('d', "app")]);

        let tree = DiffEngine::new(&oracle).diff(Some(&sp(&old)), &sp(&new)).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get(&sp(&new)).unwrap().has_children());
    }

    #[test]
    fn test_oracle_failure_aborts() {
        let oracle = MemoryOracle::new();
        let result = DiffEngine::new(&oracle).diff(
            Some(&sp(&drv('a', "app-1.0"))),
            &sp(&drv('b', "app-1.0")),
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("querying outputs of app-1.0"), "{err}");
    }
}
