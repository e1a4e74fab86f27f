//! Match result types.

use crate::model::StorePath;
use serde::{Deserialize, Serialize};

/// How a predecessor was found for an added artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    /// Same name and version, different hash
    Exact,
    /// Nearest lower version of the same package
    Version,
}

impl MatchTier {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Version => "version",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The artifact judged to be the previous incarnation of an added one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PredecessorMatch {
    pub previous: StorePath,
    pub tier: MatchTier,
}

impl PredecessorMatch {
    pub const fn new(previous: StorePath, tier: MatchTier) -> Self {
        Self { previous, tier }
    }
}
