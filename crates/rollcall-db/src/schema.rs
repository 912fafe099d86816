//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Session codes double as `session` record ids, and attendance record
//! ids are the composite `<session code>:<student id>`, so a plain
//! CREATE against either table is an atomic insert-or-reject.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD teacher_id ON TABLE session TYPE string;
DEFINE FIELD branch ON TABLE session TYPE string;
DEFINE FIELD semester ON TABLE session TYPE string;
DEFINE FIELD course ON TABLE session TYPE string;
DEFINE FIELD time_slot ON TABLE session TYPE string;
DEFINE FIELD active ON TABLE session TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE session TYPE datetime;

-- =======================================================================
-- Attendance records
-- =======================================================================
DEFINE TABLE attendance SCHEMAFULL;
DEFINE FIELD session_id ON TABLE attendance TYPE string;
DEFINE FIELD student_id ON TABLE attendance TYPE string;
DEFINE FIELD course ON TABLE attendance TYPE string;
DEFINE FIELD branch ON TABLE attendance TYPE string;
DEFINE FIELD semester ON TABLE attendance TYPE string;
DEFINE FIELD time_slot ON TABLE attendance TYPE string;
DEFINE FIELD status ON TABLE attendance TYPE string \
    DEFAULT 'Present';
DEFINE FIELD marked_at ON TABLE attendance TYPE datetime;
DEFINE FIELD origin_ip ON TABLE attendance TYPE string;
DEFINE INDEX idx_attendance_session_student ON TABLE attendance \
    COLUMNS session_id, student_id UNIQUE;
DEFINE INDEX idx_attendance_session_origin ON TABLE attendance \
    COLUMNS session_id, origin_ip;
DEFINE INDEX idx_attendance_student ON TABLE attendance \
    COLUMNS student_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_v1_has_unique_redemption_index() {
        assert!(SCHEMA_V1.contains("COLUMNS session_id, student_id UNIQUE"));
    }
}
