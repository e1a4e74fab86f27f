//! **Explain why a system rebuild changes what it changes.**
//!
//! `closure-diff` compares the derivation closure of a running system with
//! the closure a rebuild would produce, and reports each changed recipe as a
//! tree of causes: a new version, a new fixed-output source, an edited build
//! expression, or simply a changed dependency further down.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: [`StorePath`], the parsed form of a store path with its
//!   hash, name, and version.
//! - **[`store`]**: the [`ClosureOracle`] trait answering deriver, reference,
//!   and output queries. [`NixStoreOracle`] asks the local store;
//!   [`MemoryOracle`] serves a fixed closure for tests and embedding.
//! - **[`matching`]**: pairs each new dependency with its most plausible
//!   predecessor in the old closure.
//! - **[`diff`]**: the [`DiffEngine`], which classifies every visited recipe
//!   into a [`ChangeType`] and produces a [`DiffTree`].
//! - **[`reports`]**: renders a [`DiffTree`] as an indented tree or JSON.
//! - **[`config`]**, **[`pipeline`]**, **[`cli`]**: the command-line surface.
//!
//! ## Diffing Two Closures
//!
//! ```
//! use closure_diff::{DiffEngine, MemoryOracle, StorePath};
//!
//! let old = "/nix/store/00000000000000000000000000000000-hello-2.12.drv";
//! let new = "/nix/store/11111111111111111111111111111111-hello-2.13.drv";
//! let oracle = MemoryOracle::new()
//!     .with_artifact(old, Vec::<&str>::new(), ["/nix/store/a-hello-2.12"])
//!     .with_artifact(new, Vec::<&str>::new(), ["/nix/store/b-hello-2.13"]);
//!
//! let tree = DiffEngine::new(&oracle)
//!     .diff(Some(&StorePath::parse(old)), &StorePath::parse(new))
//!     .unwrap();
//! assert_eq!(tree.len(), 1);
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    // Variable names like `old`/`new` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod matching;
pub mod model;
pub mod pipeline;
pub mod reports;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use diff::{ChangeType, DiffChild, DiffEngine, DiffNode, DiffSummary, DiffTree};
pub use error::{ClosureDiffError, ErrorContext, QueryErrorKind, Result};
pub use matching::{MatchTier, PredecessorIndex, PredecessorMatch};
pub use model::StorePath;
pub use reports::{ReportFormat, ReportGenerator, create_reporter};
pub use store::{ClosureOracle, MemoryOracle, NixStoreOracle};
