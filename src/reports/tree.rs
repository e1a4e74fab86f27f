//! Indented change tree for the terminal.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::{ChangeType, DiffNode, DiffTree};
use crate::model::StorePath;
use std::collections::HashSet;
use std::fmt::{self, Write};

/// ANSI color codes
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
}

const INDENT: &str = "  ";
const UNVERSIONED: &str = "unversioned";
const COLLAPSED: &str = "[...]";

/// Depth-first, pre-order rendering of a [`DiffTree`].
///
/// Every artifact is explained once. Later references to it print the path
/// followed by `[...]` without descending again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeReporter;

impl TreeReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReportGenerator for TreeReporter {
    fn generate_diff_report(
        &self,
        tree: &DiffTree,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut renderer = Renderer {
            tree,
            config,
            seen: HashSet::new(),
            out: String::new(),
        };
        renderer.show(tree.root(), 0)?;
        Ok(renderer.out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Tree
    }
}

struct Renderer<'a> {
    tree: &'a DiffTree,
    config: &'a ReportConfig,
    seen: HashSet<&'a StorePath>,
    out: String,
}

impl<'a> Renderer<'a> {
    fn show(&mut self, path: &'a StorePath, level: usize) -> fmt::Result {
        let tree = self.tree;
        let indent = INDENT.repeat(level);

        let Some(node) = tree.get(path) else {
            let shown = self.faded(path);
            return writeln!(self.out, "{indent}{shown} {COLLAPSED}");
        };

        if self.config.quiet && node.change() == ChangeType::Fixed {
            return Ok(());
        }

        if !self.seen.insert(path) {
            let shown = self.faded(path);
            return writeln!(self.out, "{indent}{shown} {COLLAPSED}");
        }

        let shown = self.emphasized(path);
        match describe(path, node) {
            Some(message) => writeln!(self.out, "{indent}{shown}: {message}")?,
            None => writeln!(self.out, "{indent}{shown}")?,
        }

        let child_indent = INDENT.repeat(level + 1);
        for removed in node.removed() {
            let shown = self.emphasized(removed);
            writeln!(self.out, "{child_indent}{shown}: seems to be removed")?;
        }
        for child in node.added() {
            self.show(&child.path, level + 1)?;
        }
        Ok(())
    }

    fn emphasized(&self, path: &StorePath) -> String {
        if !self.config.colored {
            return path.as_str().to_string();
        }
        let (hash, name, suffix) = path.display_parts();
        format!(
            "{}{hash}{}{}{name}{}{suffix}",
            colors::DIM,
            colors::RESET,
            colors::BOLD,
            colors::RESET
        )
    }

    fn faded(&self, path: &StorePath) -> String {
        if self.config.colored {
            format!("{}{path}{}", colors::DIM, colors::RESET)
        } else {
            path.as_str().to_string()
        }
    }
}

fn describe(path: &StorePath, node: &DiffNode) -> Option<String> {
    let message = match node.change() {
        ChangeType::New => "seems to be new".to_string(),
        ChangeType::Source => "Source file changed".to_string(),
        ChangeType::Fixed => "Fixed-output derivation changed".to_string(),
        ChangeType::Expression => "Expression changed".to_string(),
        ChangeType::Version => version_change(node.previous(), path),
        ChangeType::Normal => return None,
    };
    Some(message)
}

/// `new version (A → B)`, dropping a shared file extension from both sides.
fn version_change(old: Option<&StorePath>, new: &StorePath) -> String {
    let same_extension = old.is_some_and(|o| o.extension() == new.extension());
    let pick = |p: &StorePath| {
        if same_extension {
            p.short_version()
        } else {
            p.version()
        }
        .unwrap_or(UNVERSIONED)
        .to_string()
    };
    let before = old.map_or_else(|| UNVERSIONED.to_string(), pick);
    format!("new version ({before} → {})", pick(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use crate::store::MemoryOracle;

    fn drv(hash: char, name: &str) -> String {
        let hash: String = std::iter::repeat_n(hash, 32).collect();
        format!("/nix/store/{hash}-{name}.drv")
    }

    fn out(hash: char, name: &str) -> String {
        let hash: String = std::iter::repeat_n(hash, 32).collect();
        format!("/nix/store/{hash}-{name}")
    }

    fn render(oracle: &MemoryOracle, old: &str, new: &str, config: &ReportConfig) -> String {
        let tree = DiffEngine::new(oracle)
            .diff(Some(&StorePath::parse(old)), &StorePath::parse(new))
            .unwrap();
        TreeReporter::new().generate_diff_report(&tree, config).unwrap()
    }

    #[test]
    fn test_version_display_drops_shared_extension() {
        let old = StorePath::parse(drv('a', "src-1.0.tar.gz"));
        let new = StorePath::parse(drv('b', "src-1.1.tar.gz"));
        assert_eq!(version_change(Some(&old), &new), "new version (1.0 → 1.1)");
    }

    #[test]
    fn test_version_display_keeps_differing_extension() {
        let old = StorePath::parse(drv('a', "src-1.0.tar.gz"));
        let new = StorePath::parse(drv('b', "src-1.1.tar.xz"));
        assert_eq!(
            version_change(Some(&old), &new),
            "new version (1.0.tar.gz → 1.1.tar.xz)"
        );
    }

    #[test]
    fn test_version_display_unversioned_side() {
        let old = StorePath::parse(drv('a', "src"));
        let new = StorePath::parse(drv('b', "src-2"));
        assert_eq!(version_change(Some(&old), &new), "new version (unversioned → 2)");
    }

    #[test]
    fn test_render_removed_and_new_children() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [drv('c', "gone-1")], [out('e', "app")])
            .with_artifact(&new, [drv('d', "fresh-1")], [out('f', "app")]);

        let text = render(&oracle, &old, &new, &ReportConfig::plain());
        let expected = format!(
            "{new}\n  {}: seems to be removed\n  {}: seems to be new\n",
            drv('c', "gone-1"),
            drv('d', "fresh-1")
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_quiet_hides_fixed_subtree() {
        let old = drv('a', "app-1.0");
        let new = drv('b', "app-1.0");
        let src_old = drv('c', "source");
        let src_new = drv('d', "source");
        let oracle = MemoryOracle::new()
            .with_artifact(&old, [src_old.as_str()], [out('e', "app")])
            .with_artifact(&new, [src_new.as_str()], [out('f', "app")])
            .with_artifact(&src_old, [drv('g', "curl-8.0")], [out('z', "source")])
            .with_artifact(&src_new, [drv('h', "curl-8.1")], [out('z', "source")]);

        let loud = render(&oracle, &old, &new, &ReportConfig::plain());
        assert!(loud.contains("Fixed-output derivation changed"));

        let quiet = ReportConfig {
            quiet: true,
            ..ReportConfig::plain()
        };
        let text = render(&oracle, &old, &new, &quiet);
        assert_eq!(text, format!("{new}\n"));
    }

    #[test]
    fn test_colored_output_emphasizes_name() {
        let path = StorePath::parse(drv('a', "hello-2.12"));
        let config = ReportConfig::default();
        let renderer = Renderer {
            tree: &DiffTree::new(path.clone(), indexmap::IndexMap::new()),
            config: &config,
            seen: HashSet::new(),
            out: String::new(),
        };
        let shown = renderer.emphasized(&path);
        assert!(shown.contains("\x1b[1mhello-2.12\x1b[0m.drv"));
        assert!(shown.starts_with("\x1b[2m/nix/store/"));
    }
}
