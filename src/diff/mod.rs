//! Closure diff engine.
//!
//! Compares the dependency graphs of two build recipes and classifies, for
//! every artifact that differs, the root cause of the change.
//!
//! The engine applies the following rules in order, the first that fires
//! decides the classification:
//!
//! 1. already classified in this run: skip
//! 2. no predecessor: [`ChangeType::New`]
//! 3. either side is not a recipe: [`ChangeType::Source`]
//! 4. version differs: [`ChangeType::Version`], not expanded past the cutoff level
//! 5. declared outputs equal: [`ChangeType::Fixed`], not expanded past the cutoff level
//! 6. references equal: [`ChangeType::Expression`] unless 4 or 5 applied
//! 7. otherwise walk the differing references, pairing each added one with
//!    a predecessor through [`crate::matching`]
//!
//! # Example
//!
//! ```
//! use closure_diff::diff::{ChangeType, DiffEngine};
//! use closure_diff::model::StorePath;
//! use closure_diff::store::MemoryOracle;
//!
//! let oracle = MemoryOracle::new();
//! let new = StorePath::parse("/nix/store/00000000000000000000000000000000-foo-1.0.drv");
//!
//! let tree = DiffEngine::new(&oracle).diff(None, &new).unwrap();
//! assert_eq!(tree.get(&new).unwrap().change(), ChangeType::New);
//! ```

mod engine;
mod result;

pub use engine::DiffEngine;
pub use result::{ChangeType, DiffChild, DiffNode, DiffSummary, DiffTree};
