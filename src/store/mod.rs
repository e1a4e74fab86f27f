//! Access to the package store.
//!
//! The diff engine only ever talks to the store through [`ClosureOracle`].
//! [`NixStoreOracle`] answers by running the store query tool, with an
//! in-memory memo and an optional on-disk [`FileCache`]; [`MemoryOracle`]
//! answers from a graph built in code.

mod cache;
mod memory;
mod nix;
mod traits;

pub use cache::{CacheKey, CacheStats, FileCache, QueryKind};
pub use memory::MemoryOracle;
pub use nix::NixStoreOracle;
pub use traits::ClosureOracle;
