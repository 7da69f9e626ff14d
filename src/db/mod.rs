//! SQLite database for scaffold records
//!
//! ## Tables
//!
//! - `users` / `open_keys` - owners and their API key records
//! - `scaffolds` / `scaffold_properties` - deployed contracts and their properties
//! - `scaffold_summaries` / `share_holders` - cached on-chain state, one summary per scaffold
//!
//! All access goes through a single connection behind a mutex. Multi-row writes
//! run inside one transaction while that mutex is held, so readers never see a
//! half-applied write.

pub mod keys;
pub mod scaffolds;
pub mod schema;
pub mod summaries;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::types::ScaffoldError;

/// SQLite database holding scaffold state
pub struct ScaffoldDb {
    conn: Mutex<Connection>,
}

impl ScaffoldDb {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, ScaffoldError> {
        info!("Opening SQLite database at {:?}", path);

        let conn = Connection::open(path)
            .map_err(|e| ScaffoldError::Database(format!("Failed to open SQLite: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| ScaffoldError::Database(format!("Failed to set PRAGMA: {}", e)))?;

        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, ScaffoldError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory().map_err(|e| {
            ScaffoldError::Database(format!("Failed to open in-memory SQLite: {}", e))
        })?;

        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, ScaffoldError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| ScaffoldError::Database(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.with_conn(|conn| schema::init_schema(conn))?;

        Ok(db)
    }

    /// Run a read against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ScaffoldError>
    where
        F: FnOnce(&Connection) -> Result<T, ScaffoldError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ScaffoldError::Database(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run a write with exclusive access (needed to open transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, ScaffoldError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ScaffoldError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ScaffoldError::Database(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
