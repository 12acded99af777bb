//! Database-specific error types and conversions.

use ricetrace_core::RegistryError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored row failed to decode into a domain value. Indicates a
    /// schema/data mismatch, not a caller mistake.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<DbError> for RegistryError {
    fn from(err: DbError) -> Self {
        RegistryError::Storage(err.to_string())
    }
}
