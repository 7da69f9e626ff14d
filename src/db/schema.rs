//! Database schema definitions

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::types::ScaffoldError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), ScaffoldError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.execute_batch(SCHEMA)
            .map_err(|e| ScaffoldError::Database(format!("Failed to create tables: {}", e)))?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, ScaffoldError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| ScaffoldError::Database(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| ScaffoldError::Database(format!("Failed to read schema_version: {}", e)))?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), ScaffoldError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| ScaffoldError::Database(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| ScaffoldError::Database(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    google_id TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS open_keys (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    value TEXT NOT NULL UNIQUE,
    enabled INTEGER NOT NULL DEFAULT 1,
    expired_date TEXT,
    -- Account in the state tracking service, set on first activation
    state_account_id INTEGER
);

CREATE TABLE IF NOT EXISTS scaffolds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL UNIQUE,
    abi TEXT NOT NULL,
    open_key_id INTEGER NOT NULL REFERENCES open_keys(id),
    developer_address TEXT NOT NULL,
    description TEXT NOT NULL,
    fiat_amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    conversion_amount TEXT NOT NULL,
    web_hook TEXT,
    version TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scaffold_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scaffold_id INTEGER NOT NULL REFERENCES scaffolds(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    property_type TEXT NOT NULL,
    default_value TEXT
);

-- One live summary per scaffold, upserted on refresh
CREATE TABLE IF NOT EXISTS scaffold_summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scaffold_id INTEGER NOT NULL UNIQUE REFERENCES scaffolds(id),
    currency TEXT NOT NULL,
    fiat_amount TEXT NOT NULL,
    transaction_index INTEGER NOT NULL,
    token_address TEXT,
    token_balance TEXT NOT NULL,
    enabled INTEGER NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS share_holders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    summary_id INTEGER NOT NULL REFERENCES scaffold_summaries(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    address TEXT NOT NULL,
    percent INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_open_keys_user ON open_keys(user_id);
CREATE INDEX IF NOT EXISTS idx_scaffolds_open_key ON scaffolds(open_key_id);
CREATE INDEX IF NOT EXISTS idx_properties_scaffold ON scaffold_properties(scaffold_id);
CREATE INDEX IF NOT EXISTS idx_summaries_enabled ON scaffold_summaries(enabled);
CREATE INDEX IF NOT EXISTS idx_share_holders_summary ON share_holders(summary_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_sets_version() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        // Second run is a no-op
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_unreadable_version_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL); \
             INSERT INTO schema_version (version) VALUES ('not-a-number');",
        )
        .unwrap();

        let result = init_schema(&conn);
        assert!(matches!(result, Err(ScaffoldError::Database(_))));
    }
}
