//! Unified error types for closure-diff.
//!
//! Store query failures are fatal for the diff being computed: the engine
//! never retries or skips an artifact it could not query, it propagates.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for closure-diff operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClosureDiffError {
    /// Errors while querying the store for references, outputs or derivers
    #[error("Store query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: QueryErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Specific store query error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QueryErrorKind {
    #[error("could not run {tool}: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("no deriver recorded for {0}")]
    NoDeriver(String),

    #[error("unknown artifact: {0}")]
    UnknownArtifact(String),

    #[error("unexpected query output: {0}")]
    InvalidOutput(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for closure-diff operations
pub type Result<T> = std::result::Result<T, ClosureDiffError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl ClosureDiffError {
    /// Create a query error with context
    pub fn query(context: impl Into<String>, source: QueryErrorKind) -> Self {
        Self::Query {
            context: context.into(),
            source,
        }
    }

    /// Create a query error for an artifact the oracle does not know
    pub fn unknown_artifact(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::query(
            format!("looking up {path}"),
            QueryErrorKind::UnknownArtifact(path),
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for ClosureDiffError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ClosureDiffError {
    fn from(err: serde_json::Error) -> Self {
        Self::query(
            "decoding cached query result",
            QueryErrorKind::InvalidOutput(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outward, so a failure deep in the diff reads like
/// `"querying references of hello-2.12: --references /nix/store/…-hello-2.12.drv"`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<ClosureDiffError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: ClosureDiffError, new_ctx: &str) -> ClosureDiffError {
    match err {
        ClosureDiffError::Query {
            context: existing,
            source,
        } => ClosureDiffError::Query {
            context: chain_context(new_ctx, &existing),
            source,
        },
        ClosureDiffError::Io {
            path,
            message,
            source,
        } => ClosureDiffError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        ClosureDiffError::Config(msg) => ClosureDiffError::Config(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
