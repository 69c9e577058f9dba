//! Rich diagnostic error types for utility-explorer.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::block::BlockError;
use crate::config::ConfigError;
use crate::paths::PathError;
use crate::task::TaskError;

/// Top-level error type for utility-explorer.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum UeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracker(#[from] TrackerError),
}

/// Convenience alias used across the crate.
pub type UeResult<T> = std::result::Result<T, UeError>;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(ue::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(ue::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             Another `ue` process may hold the database lock; wait for it to finish. \
             If the problem persists, move `ue.redb` aside and re-run `ue init`."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(ue::store::serde),
        help(
            "Failed to serialize or deserialize a stored record. \
             This usually means the store was written by an incompatible version."
        )
    )]
    Serialization { message: String },

    #[error("corrupt record in table {table}: {message}")]
    #[diagnostic(
        code(ue::store::corrupt),
        help("A stored key or counter has an unexpected shape. Inspect or rebuild the store.")
    )]
    Corrupt { table: String, message: String },
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("failed to create data directory: {path}")]
    #[diagnostic(
        code(ue::tracker::data_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("demo seeding requires demo mode")]
    #[diagnostic(
        code(ue::tracker::not_demo),
        help("Run with `UE_DEMO=1 ue demo-setup` so demo data never touches your real store.")
    )]
    NotDemoMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_wraps_transparently() {
        let err: UeError = StoreError::Redb {
            message: "locked".into(),
        }
        .into();
        assert_eq!(err.to_string(), "redb transaction error: locked");
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("ue::store::redb")
        );
    }

    #[test]
    fn task_not_found_keeps_code() {
        let err: UeError = TaskError::NotFound { id: 7 }.into();
        assert!(err.to_string().contains('7'));
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("ue::task::not_found")
        );
    }
}
