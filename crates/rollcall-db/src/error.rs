//! Database-specific error types and conversions.

use rollcall_core::error::RollcallError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate record: {entity} with id {id}")]
    Duplicate { entity: String, id: String },
}

impl DbError {
    /// Classify a failed write statement.
    ///
    /// SurrealDB reports a taken record id or a violated unique index
    /// only through its error text, and callers need that case kept
    /// apart from transient store failures.
    pub(crate) fn classify_write(err: surrealdb::Error, entity: &str, id: &str) -> Self {
        let msg = err.to_string();
        if msg.contains("already exists") || msg.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                id: id.into(),
            }
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for RollcallError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RollcallError::NotFound { entity, id },
            DbError::Duplicate { entity, .. } => RollcallError::AlreadyExists { entity },
            other => RollcallError::Database(other.to_string()),
        }
    }
}
