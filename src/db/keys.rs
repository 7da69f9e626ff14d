//! Users and open key records

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::{OpenKey, ScaffoldError, User};

fn open_key_from_row(row: &Row) -> Result<OpenKey, rusqlite::Error> {
    Ok(OpenKey {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        value: row.get("value")?,
        enabled: row.get("enabled")?,
        expired_date: row.get("expired_date")?,
        state_account_id: row.get("state_account_id")?,
    })
}

pub fn create_user(conn: &Connection, google_id: &str) -> Result<User, ScaffoldError> {
    conn.execute("INSERT INTO users (google_id) VALUES (?)", params![google_id])
        .map_err(|e| ScaffoldError::Database(format!("User insert failed: {}", e)))?;

    Ok(User {
        id: conn.last_insert_rowid(),
        google_id: google_id.to_string(),
    })
}

pub fn find_user_by_google_id(conn: &Connection, google_id: &str) -> Result<Option<User>, ScaffoldError> {
    conn.query_row(
        "SELECT id, google_id FROM users WHERE google_id = ?",
        params![google_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                google_id: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))
}

pub fn create_open_key(
    conn: &Connection,
    user_id: i64,
    value: &str,
    expired_date: Option<DateTime<Utc>>,
) -> Result<OpenKey, ScaffoldError> {
    conn.execute(
        "INSERT INTO open_keys (user_id, value, enabled, expired_date) VALUES (?, ?, 1, ?)",
        params![user_id, value, expired_date],
    )
    .map_err(|e| ScaffoldError::Database(format!("Open key insert failed: {}", e)))?;

    Ok(OpenKey {
        id: conn.last_insert_rowid(),
        user_id,
        value: value.to_string(),
        enabled: true,
        expired_date,
        state_account_id: None,
    })
}

/// Find a usable key: enabled and not past its expiry
pub fn find_active_open_key(
    conn: &Connection,
    value: &str,
    now: DateTime<Utc>,
) -> Result<Option<OpenKey>, ScaffoldError> {
    conn.query_row(
        r#"
        SELECT * FROM open_keys
        WHERE value = ? AND enabled = 1
          AND (expired_date IS NULL OR expired_date > ?)
        "#,
        params![value, now],
        open_key_from_row,
    )
    .optional()
    .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))
}

pub fn get_open_key(conn: &Connection, id: i64) -> Result<Option<OpenKey>, ScaffoldError> {
    conn.query_row("SELECT * FROM open_keys WHERE id = ?", params![id], open_key_from_row)
        .optional()
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))
}

pub fn list_open_keys_by_user(conn: &Connection, user_id: i64) -> Result<Vec<OpenKey>, ScaffoldError> {
    let mut stmt = conn
        .prepare("SELECT * FROM open_keys WHERE user_id = ? ORDER BY id")
        .map_err(|e| ScaffoldError::Database(format!("Prepare failed: {}", e)))?;

    let keys = stmt
        .query_map(params![user_id], open_key_from_row)
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScaffoldError::Database(format!("Row parse failed: {}", e)))?;

    Ok(keys)
}

/// Link a key record to its tracking account
///
/// Only a key without an account is linked. Returns `false` when the key
/// already had one, leaving the stored id untouched.
pub fn set_state_account_id(conn: &Connection, key_id: i64, account_id: i64) -> Result<bool, ScaffoldError> {
    let changes = conn
        .execute(
            "UPDATE open_keys SET state_account_id = ? WHERE id = ? AND state_account_id IS NULL",
            params![account_id, key_id],
        )
        .map_err(|e| ScaffoldError::Database(format!("Update failed: {}", e)))?;

    if changes == 0 {
        if get_open_key(conn, key_id)?.is_none() {
            return Err(ScaffoldError::NotFound(format!("Not found open key with id {}", key_id)));
        }
        return Ok(false);
    }

    Ok(true)
}
