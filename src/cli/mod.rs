//! CLI command handlers.
//!
//! Testable command handlers invoked by main.rs.

mod diff;

pub use diff::{DiffRequest, NO_UPDATES, run_diff, run_diff_with};
