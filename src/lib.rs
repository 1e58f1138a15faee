//! # anidb - Genome comparison store
//!
//! SQLite-backed persistence for pairwise genome comparisons.
//!
//! anidb provides:
//! - A fixed relational schema for genomes, runs, run/genome links and comparisons
//! - Typed insert/lookup operations, each in its own transaction
//! - Comparison memoization keyed on query, subject, program, version and settings
//! - Read-only reports joining runs and genomes

pub mod genome;
pub mod run;
pub mod comparison;
pub mod storage;
pub mod fingerprint;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use genome::Genome;
pub use run::{Run, RunGenome};
pub use comparison::{Comparison, ComparisonKey, ComparisonStats, Setting};
pub use storage::{create_db, SqliteStore};

use std::path::PathBuf;

/// Result type alias for anidb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for anidb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database does not exist: {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for uniqueness and foreign key failures raised by inserts
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(msg.unwrap_or_else(|| e.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failure_maps_to_variant() {
        let raw = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: genomes.hash, genomes.path".to_string()),
        );
        let err: Error = raw.into();
        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("genomes.hash"));
    }

    #[test]
    fn test_other_failures_are_storage_errors() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Storage(_)));
    }
}
