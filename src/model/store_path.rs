//! Structured view of a content-addressed store path.
//!
//! A store path such as `/nix/store/<32-char hash>-openssl-3.0.13.drv` encodes
//! everything the diff needs to pair artifacts across two closures: the hash
//! (opaque), the human-readable name, and an optional version. Parsing never
//! fails; paths that do not follow the usual layout simply carry no version.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

/// Width of the `/nix/store/<hash>-` prefix.
pub const HASH_PREFIX_LEN: usize = 44;

/// Suffix carried by build recipes (derivations).
pub const RECIPE_SUFFIX: &str = ".drv";

/// First `-` immediately followed by a digit separates name from version.
static VERSION_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d").expect("static regex"));

/// Trailing run of `.ident` groups, e.g. `.tar.gz` in `1.2.tar.gz`.
static EXTENSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\.[A-Za-z_][A-Za-z0-9_]*)+$").expect("static regex")
});

/// A parsed store path.
///
/// Identity is the raw path string: two `StorePath`s are equal iff their
/// paths are equal, and ordering is the lexical ordering of paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StorePath {
    path: String,
    is_drv: bool,
    full_name: String,
    name: String,
    version: Option<String>,
    short_version: Option<String>,
    extension: Option<String>,
}

impl StorePath {
    /// Parse a store path. Total: malformed input degrades to an unversioned name.
    #[must_use]
    pub fn parse(path: impl Into<String>) -> Self {
        let path = path.into();
        let is_drv = path.ends_with(RECIPE_SUFFIX);

        let without_suffix = if is_drv {
            &path[..path.len() - RECIPE_SUFFIX.len()]
        } else {
            path.as_str()
        };
        let full_name = without_suffix
            .get(HASH_PREFIX_LEN..)
            .unwrap_or(without_suffix)
            .to_string();

        let (name, version) = match VERSION_BOUNDARY.find(&full_name) {
            Some(m) => (
                full_name[..m.start()].to_string(),
                Some(full_name[m.start() + 1..].to_string()),
            ),
            None => (full_name.clone(), None),
        };

        let (short_version, extension) = match version.as_deref() {
            Some(v) => match EXTENSION_SUFFIX.find(v) {
                Some(m) => (
                    Some(v[..m.start()].to_string()),
                    Some(v[m.start() + 1..].to_string()),
                ),
                None => (Some(v.to_string()), None),
            },
            None => (None, None),
        };

        Self {
            path,
            is_drv,
            full_name,
            name,
            version,
            short_version,
            extension,
        }
    }

    /// The raw path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Whether this path is a build recipe rather than a built output or source.
    #[must_use]
    pub const fn is_drv(&self) -> bool {
        self.is_drv
    }

    /// Name and version with the hash (and recipe suffix) stripped.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Version without a trailing file extension run.
    #[must_use]
    pub fn short_version(&self) -> Option<&str> {
        self.short_version.as_deref()
    }

    /// Trailing `.ext` run of the version, without the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Split the path into (hash prefix, name, recipe suffix) for display.
    #[must_use]
    pub fn display_parts(&self) -> (&str, &str, &str) {
        let suffix_len = if self.is_drv { RECIPE_SUFFIX.len() } else { 0 };
        let body_end = self.path.len() - suffix_len;
        let name_start = body_end - self.full_name.len();
        (
            &self.path[..name_start],
            &self.path[name_start..body_end],
            &self.path[body_end..],
        )
    }
}

impl PartialEq for StorePath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for StorePath {}

impl Hash for StorePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for StorePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StorePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<String> for StorePath {
    fn from(path: String) -> Self {
        Self::parse(path)
    }
}

impl From<&str> for StorePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.path
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}
