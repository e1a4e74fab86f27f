//! Data model for closure comparison.
//!
//! Store paths are the only identity the diff works with. Everything the
//! engine knows about an artifact (name, version, whether it is a build
//! recipe) is derived from its path by [`StorePath::parse`].

mod store_path;

pub use store_path::{HASH_PREFIX_LEN, RECIPE_SUFFIX, StorePath};
