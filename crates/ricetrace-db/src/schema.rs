//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Identities are stored as strings and double as record ids for the
//! role tables, so membership checks are single-record lookups. Enums
//! are stored as strings with ASSERT constraints.

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
-- Counters (sequential id allocation; one record per counter name)
-- =======================================================================
DEFINE TABLE counter SCHEMAFULL;
DEFINE FIELD value ON TABLE counter TYPE int DEFAULT 0;

-- =======================================================================
-- Approved farmers (record id = identity)
-- =======================================================================
DEFINE TABLE farmer SCHEMAFULL;
DEFINE FIELD identity ON TABLE farmer TYPE string;
DEFINE FIELD approved_at ON TABLE farmer TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Approved millers (record id = identity)
-- =======================================================================
DEFINE TABLE miller SCHEMAFULL;
DEFINE FIELD identity ON TABLE miller TYPE string;
DEFINE FIELD approved_at ON TABLE miller TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Pending farmer-role requests (record id = identity; FIFO by position)
-- =======================================================================
DEFINE TABLE pending_request SCHEMAFULL;
DEFINE FIELD identity ON TABLE pending_request TYPE string;
DEFINE FIELD position ON TABLE pending_request TYPE int;
DEFINE FIELD requested_at ON TABLE pending_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_pending_position ON TABLE pending_request \
    COLUMNS position UNIQUE;

-- =======================================================================
-- Batches (record id = sequential batch id; never physically deleted)
-- =======================================================================
DEFINE TABLE batch SCHEMAFULL;
DEFINE FIELD batch_id ON TABLE batch TYPE int;
DEFINE FIELD variety ON TABLE batch TYPE string;
DEFINE FIELD origin ON TABLE batch TYPE string;
DEFINE FIELD is_organic ON TABLE batch TYPE bool;
DEFINE FIELD farmer ON TABLE batch TYPE string;
DEFINE FIELD miller ON TABLE batch TYPE option<string>;
DEFINE FIELD harvest_date ON TABLE batch TYPE datetime;
DEFINE FIELD milling_date ON TABLE batch TYPE option<datetime>;
DEFINE FIELD image_ref ON TABLE batch TYPE string;
DEFINE FIELD state ON TABLE batch TYPE string \
    ASSERT $value IN ['Harvested', 'Processed', 'Sold', 'Deleted'];
DEFINE INDEX idx_batch_id ON TABLE batch COLUMNS batch_id UNIQUE;
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
