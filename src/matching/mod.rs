//! Predecessor matching between the references two recipes do not share.
//!
//! Matching is a two-tier heuristic:
//!
//! 1. **Exact**: a removed artifact with the same full name (name and version)
//! 2. **Version**: the nearest lower version within the same
//!    (name, has-extension) bucket, ordered by Nix version rules
//!
//! It is best-effort by nature. A package renamed between builds will not
//! be paired with its former self and shows up as one removal plus one
//! new artifact.

mod index;
mod traits;

pub use index::PredecessorIndex;
pub use traits::{MatchTier, PredecessorMatch};
