//! Scaffold records and their properties

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::debug;

use crate::types::{
    OpenKey, Page, PageRequest, PropertyType, SaveScaffoldRequest, Scaffold, ScaffoldError,
    ScaffoldProperty,
};

/// Scaffold columns joined with the owning key record
const SCAFFOLD_SELECT: &str = r#"
    SELECT
        s.id, s.address, s.abi, s.developer_address, s.description,
        s.fiat_amount, s.currency, s.conversion_amount, s.web_hook,
        s.version, s.created_at,
        k.id AS key_id, k.user_id AS key_user_id, k.value AS key_value,
        k.enabled AS key_enabled, k.expired_date AS key_expired_date,
        k.state_account_id AS key_state_account_id
    FROM scaffolds s
    JOIN open_keys k ON s.open_key_id = k.id
"#;

fn scaffold_from_row(row: &Row) -> Result<Scaffold, rusqlite::Error> {
    Ok(Scaffold {
        id: row.get("id")?,
        address: row.get("address")?,
        abi: row.get("abi")?,
        open_key: OpenKey {
            id: row.get("key_id")?,
            user_id: row.get("key_user_id")?,
            value: row.get("key_value")?,
            enabled: row.get("key_enabled")?,
            expired_date: row.get("key_expired_date")?,
            state_account_id: row.get("key_state_account_id")?,
        },
        developer_address: row.get("developer_address")?,
        description: row.get("description")?,
        fiat_amount: row.get("fiat_amount")?,
        currency: row.get("currency")?,
        conversion_amount: row.get("conversion_amount")?,
        web_hook: row.get("web_hook")?,
        version: row.get("version")?,
        properties: vec![], // Loaded separately
        created_at: row.get("created_at")?,
    })
}

fn query_scaffolds(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Scaffold>, ScaffoldError> {
    let sql = format!("{} {}", SCAFFOLD_SELECT, filter);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ScaffoldError::Database(format!("Prepare failed: {}", e)))?;

    let mut scaffolds = stmt
        .query_map(params, scaffold_from_row)
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScaffoldError::Database(format!("Row parse failed: {}", e)))?;

    for scaffold in &mut scaffolds {
        scaffold.properties = get_properties(conn, scaffold.id)?;
    }

    Ok(scaffolds)
}

fn get_properties(conn: &Connection, scaffold_id: i64) -> Result<Vec<ScaffoldProperty>, ScaffoldError> {
    let mut stmt = conn
        .prepare(
            "SELECT name, property_type, default_value FROM scaffold_properties \
             WHERE scaffold_id = ? ORDER BY position",
        )
        .map_err(|e| ScaffoldError::Database(format!("Prepare failed: {}", e)))?;

    let rows = stmt
        .query_map(params![scaffold_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScaffoldError::Database(format!("Row parse failed: {}", e)))?;

    rows.into_iter()
        .map(|(name, property_type, default_value)| {
            let property_type = PropertyType::parse(&property_type).ok_or_else(|| {
                ScaffoldError::Database(format!("Unknown property type: {}", property_type))
            })?;
            Ok(ScaffoldProperty {
                name,
                property_type,
                default_value,
            })
        })
        .collect()
}

/// Insert a scaffold and its properties in one transaction
pub fn create_scaffold(
    conn: &mut Connection,
    open_key_id: i64,
    request: &SaveScaffoldRequest,
    created_at: DateTime<Utc>,
) -> Result<Scaffold, ScaffoldError> {
    let tx = conn
        .transaction()
        .map_err(|e| ScaffoldError::Database(format!("Transaction failed: {}", e)))?;

    tx.execute(
        r#"
        INSERT INTO scaffolds (
            address, abi, open_key_id, developer_address, description,
            fiat_amount, currency, conversion_amount, web_hook, version, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            request.address,
            request.abi,
            open_key_id,
            request.developer_address,
            request.description,
            request.fiat_amount,
            request.currency,
            request.conversion_amount,
            request.web_hook,
            request.version,
            created_at,
        ],
    )
    .map_err(|e| ScaffoldError::Database(format!("Insert failed: {}", e)))?;

    let scaffold_id = tx.last_insert_rowid();

    for (position, property) in request.properties.iter().enumerate() {
        tx.execute(
            "INSERT INTO scaffold_properties (scaffold_id, position, name, property_type, default_value) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                scaffold_id,
                position as i64,
                property.name,
                property.property_type.as_str(),
                property.default_value,
            ],
        )
        .map_err(|e| ScaffoldError::Database(format!("Property insert failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| ScaffoldError::Database(format!("Commit failed: {}", e)))?;

    debug!(address = %request.address, scaffold_id, "Scaffold row created");

    get_scaffold(conn, scaffold_id)?
        .ok_or_else(|| ScaffoldError::Database("Scaffold not found after insert".to_string()))
}

pub fn get_scaffold(conn: &Connection, id: i64) -> Result<Option<Scaffold>, ScaffoldError> {
    Ok(query_scaffolds(conn, "WHERE s.id = ?", params![id])?.pop())
}

/// Find a scaffold owned by any key of the given user
pub fn find_scaffold(conn: &Connection, address: &str, user_id: i64) -> Result<Option<Scaffold>, ScaffoldError> {
    Ok(query_scaffolds(conn, "WHERE s.address = ? AND k.user_id = ?", params![address, user_id])?.pop())
}

pub fn find_scaffold_by_address(conn: &Connection, address: &str) -> Result<Option<Scaffold>, ScaffoldError> {
    Ok(query_scaffolds(conn, "WHERE s.address = ?", params![address])?.pop())
}

/// List a user's scaffolds, newest first
pub fn list_scaffolds(conn: &Connection, user_id: i64, page: PageRequest) -> Result<Page<Scaffold>, ScaffoldError> {
    let total: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM scaffolds s JOIN open_keys k ON s.open_key_id = k.id WHERE k.user_id = ?",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?;

    let limit = page.limit as i64;
    let offset = page.offset as i64;
    let items = query_scaffolds(
        conn,
        "WHERE k.user_id = ? ORDER BY s.id DESC LIMIT ? OFFSET ?",
        params![user_id, limit, offset],
    )?;

    Ok(Page {
        items,
        total: total as u64,
    })
}

/// Persist the mutable fields of a scaffold (description and webhook)
pub fn update_scaffold(conn: &Connection, scaffold: &Scaffold) -> Result<Scaffold, ScaffoldError> {
    let changes = conn
        .execute(
            "UPDATE scaffolds SET description = ?, web_hook = ? WHERE id = ?",
            params![scaffold.description, scaffold.web_hook, scaffold.id],
        )
        .map_err(|e| ScaffoldError::Database(format!("Update failed: {}", e)))?;

    if changes == 0 {
        return Err(ScaffoldError::NotFound(format!(
            "Not found scaffold with address {}",
            scaffold.address
        )));
    }

    get_scaffold(conn, scaffold.id)?
        .ok_or_else(|| ScaffoldError::Database("Scaffold not found after update".to_string()))
}
