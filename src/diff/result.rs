//! Diff result structures.

use crate::matching::MatchTier;
use crate::model::StorePath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Why a new artifact differs from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// No predecessor was found
    New,
    /// One side is a plain source file rather than a recipe
    Source,
    /// Declared outputs are unchanged despite a rebuild
    Fixed,
    /// Same references, only the recipe itself changed
    Expression,
    /// Version differs from the predecessor
    Version,
    /// References changed; the children explain why
    Normal,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Source => "source",
            Self::Fixed => "fixed",
            Self::Expression => "expression",
            Self::Version => "version",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference the engine recursed into, with how its predecessor was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffChild {
    pub path: StorePath,
    /// `None` when the child had no predecessor and was diffed as new
    #[serde(rename = "match")]
    pub tier: Option<MatchTier>,
}

/// Classification of one new artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DiffNode {
    /// Classified without looking at references
    Leaf {
        change: ChangeType,
        previous: Option<StorePath>,
    },
    /// References differed and were walked
    Expanded {
        change: ChangeType,
        previous: StorePath,
        /// Old references with no counterpart, sorted by path
        removed: Vec<StorePath>,
        /// New references recursed into, sorted by path
        added: Vec<DiffChild>,
    },
}

impl DiffNode {
    #[must_use]
    pub const fn change(&self) -> ChangeType {
        match self {
            Self::Leaf { change, .. } | Self::Expanded { change, .. } => *change,
        }
    }

    #[must_use]
    pub const fn previous(&self) -> Option<&StorePath> {
        match self {
            Self::Leaf { previous, .. } => previous.as_ref(),
            Self::Expanded { previous, .. } => Some(previous),
        }
    }

    #[must_use]
    pub const fn has_children(&self) -> bool {
        matches!(self, Self::Expanded { .. })
    }

    /// Genuinely removed references (empty for leaves).
    #[must_use]
    pub fn removed(&self) -> &[StorePath] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Expanded { removed, .. } => removed,
        }
    }

    /// References recursed into (empty for leaves).
    #[must_use]
    pub fn added(&self) -> &[DiffChild] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Expanded { added, .. } => added,
        }
    }
}

/// Every classified artifact of one diff run, keyed by new artifact path.
///
/// Each path appears at most once. Nodes are stored in completion order,
/// so children precede the parents that reference them and the root is last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use]
pub struct DiffTree {
    root: StorePath,
    nodes: IndexMap<StorePath, DiffNode>,
}

impl DiffTree {
    pub(crate) const fn new(root: StorePath, nodes: IndexMap<StorePath, DiffNode>) -> Self {
        Self { root, nodes }
    }

    #[must_use]
    pub const fn root(&self) -> &StorePath {
        &self.root
    }

    #[must_use]
    pub fn get(&self, path: &StorePath) -> Option<&DiffNode> {
        self.nodes.get(path)
    }

    /// Iterate over nodes in completion order.
    pub fn iter(&self) -> impl Iterator<Item = (&StorePath, &DiffNode)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy of the tree without `Fixed` nodes or anything reachable only
    /// through them.
    ///
    /// Kept nodes are unchanged, so an expanded node may still list a
    /// dropped child among its `added` references.
    pub fn without_fixed(&self) -> Self {
        let mut keep = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(path) = stack.pop() {
            let Some(node) = self.nodes.get(path) else {
                continue;
            };
            if node.change() == ChangeType::Fixed || !keep.insert(path) {
                continue;
            }
            stack.extend(node.added().iter().map(|child| &child.path));
        }

        let nodes = self
            .nodes
            .iter()
            .filter(|(path, _)| keep.contains(path))
            .map(|(path, node)| (path.clone(), node.clone()))
            .collect();
        Self::new(self.root.clone(), nodes)
    }

    /// Count nodes per classification.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for node in self.nodes.values() {
            summary.total_nodes += 1;
            summary.removed += node.removed().len();
            match node.change() {
                ChangeType::New => summary.new += 1,
                ChangeType::Source => summary.source += 1,
                ChangeType::Fixed => summary.fixed += 1,
                ChangeType::Expression => summary.expression += 1,
                ChangeType::Version => summary.version += 1,
                ChangeType::Normal => summary.normal += 1,
            }
        }
        summary
    }
}

/// Summary statistics for the diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total_nodes: usize,
    pub new: usize,
    pub source: usize,
    pub fixed: usize,
    pub expression: usize,
    pub version: usize,
    pub normal: usize,
    /// References dropped with no matching successor
    pub removed: usize,
}

impl DiffSummary {
    #[must_use]
    pub const fn count(&self, change: ChangeType) -> usize {
        match change {
            ChangeType::New => self.new,
            ChangeType::Source => self.source,
            ChangeType::Fixed => self.fixed,
            ChangeType::Expression => self.expression,
            ChangeType::Version => self.version,
            ChangeType::Normal => self.normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> StorePath {
        StorePath::parse(format!("/nix/store/00000000000000000000000000000000-{name}.drv"))
    }

    #[test]
    fn test_summary_counts() {
        let mut nodes = IndexMap::new();
        nodes.insert(
            p("lib-1.1"),
            DiffNode::Leaf {
                change: ChangeType::Version,
                previous: Some(p("lib-1.0")),
            },
        );
        nodes.insert(
            p("app-1.0"),
            DiffNode::Expanded {
                change: ChangeType::Normal,
                previous: p("app-1.0"),
                removed: vec![p("gone-3")],
                added: vec![DiffChild {
                    path: p("lib-1.1"),
                    tier: Some(MatchTier::Version),
                }],
            },
        );
        let tree = DiffTree::new(p("app-1.0"), nodes);

        let summary = tree.summary();
        assert_eq!(summary.total_nodes, 2);
        assert_eq!(summary.count(ChangeType::Version), 1);
        assert_eq!(summary.count(ChangeType::Normal), 1);
        assert_eq!(summary.removed, 1);
    }

    #[test]
    fn test_without_fixed_prunes_subtree_but_keeps_shared_nodes() {
        let child = |name: &str| DiffChild {
            path: p(name),
            tier: Some(MatchTier::Exact),
        };
        let mut nodes = IndexMap::new();
        nodes.insert(
            p("zlib-1.3"),
            DiffNode::Leaf {
                change: ChangeType::Version,
                previous: Some(p("zlib-1.2")),
            },
        );
        nodes.insert(
            p("curl-8.1"),
            DiffNode::Leaf {
                change: ChangeType::Version,
                previous: Some(p("curl-8.0")),
            },
        );
        nodes.insert(
            p("src"),
            DiffNode::Expanded {
                change: ChangeType::Fixed,
                previous: p("src"),
                removed: vec![p("gone-1")],
                added: vec![child("curl-8.1"), child("zlib-1.3")],
            },
        );
        nodes.insert(
            p("app-1.0"),
            DiffNode::Expanded {
                change: ChangeType::Normal,
                previous: p("app-1.0"),
                removed: vec![],
                added: vec![child("src"), child("zlib-1.3")],
            },
        );
        let tree = DiffTree::new(p("app-1.0"), nodes);

        let pruned = tree.without_fixed();
        let kept: Vec<_> = pruned.iter().map(|(path, _)| path.clone()).collect();
        assert_eq!(kept, vec![p("zlib-1.3"), p("app-1.0")]);

        let summary = pruned.summary();
        assert_eq!(summary.fixed, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.total_nodes, 2);
    }

    #[test]
    fn test_leaf_accessors() {
        let leaf = DiffNode::Leaf {
            change: ChangeType::New,
            previous: None,
        };
        assert!(!leaf.has_children());
        assert!(leaf.previous().is_none());
        assert!(leaf.removed().is_empty());
        assert!(leaf.added().is_empty());
    }

    #[test]
    fn test_change_type_serializes_snake_case() {
        let json = serde_json::to_string(&ChangeType::Expression).unwrap();
        assert_eq!(json, "\"expression\"");
    }
}
