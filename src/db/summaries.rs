//! Cached scaffold summaries and their share holders

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::types::{ScaffoldError, ScaffoldSummary, ShareHolder, SummarySnapshot};

fn summary_from_row(row: &Row) -> Result<ScaffoldSummary, rusqlite::Error> {
    Ok(ScaffoldSummary {
        id: row.get("id")?,
        scaffold_id: row.get("scaffold_id")?,
        scaffold_address: row.get("scaffold_address")?,
        currency: row.get("currency")?,
        fiat_amount: row.get("fiat_amount")?,
        transaction_index: row.get("transaction_index")?,
        token_address: row.get("token_address")?,
        token_balance: row.get("token_balance")?,
        enabled: row.get("enabled")?,
        fetched_at: row.get("fetched_at")?,
        share_holders: vec![], // Loaded separately
    })
}

/// Get the cached summary of a scaffold, with its share holders
pub fn find_summary(conn: &Connection, scaffold_id: i64) -> Result<Option<ScaffoldSummary>, ScaffoldError> {
    let summary = conn
        .query_row(
            r#"
            SELECT m.*, s.address AS scaffold_address
            FROM scaffold_summaries m
            JOIN scaffolds s ON m.scaffold_id = s.id
            WHERE m.scaffold_id = ?
            "#,
            params![scaffold_id],
            summary_from_row,
        )
        .optional()
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?;

    match summary {
        Some(mut summary) => {
            summary.share_holders = get_share_holders(conn, summary.id)?;
            Ok(Some(summary))
        }
        None => Ok(None),
    }
}

fn get_share_holders(conn: &Connection, summary_id: i64) -> Result<Vec<ShareHolder>, ScaffoldError> {
    let mut stmt = conn
        .prepare("SELECT address, percent FROM share_holders WHERE summary_id = ? ORDER BY position")
        .map_err(|e| ScaffoldError::Database(format!("Prepare failed: {}", e)))?;

    let holders = stmt
        .query_map(params![summary_id], |row| {
            Ok(ShareHolder {
                address: row.get(0)?,
                percent: row.get(1)?,
            })
        })
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScaffoldError::Database(format!("Row parse failed: {}", e)))?;

    Ok(holders)
}

/// Replace the cached summary of a scaffold in one transaction
///
/// The summary row is upserted so it keeps its id across refreshes. The
/// share holder set is deleted and reinserted wholesale.
pub fn replace_summary(
    conn: &mut Connection,
    scaffold_id: i64,
    snapshot: &SummarySnapshot,
) -> Result<ScaffoldSummary, ScaffoldError> {
    let tx = conn
        .transaction()
        .map_err(|e| ScaffoldError::Database(format!("Transaction failed: {}", e)))?;

    let chain = &snapshot.chain;
    tx.execute(
        r#"
        INSERT INTO scaffold_summaries (
            scaffold_id, currency, fiat_amount, transaction_index,
            token_address, token_balance, enabled, fetched_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(scaffold_id) DO UPDATE SET
            currency = excluded.currency,
            fiat_amount = excluded.fiat_amount,
            transaction_index = excluded.transaction_index,
            token_address = excluded.token_address,
            token_balance = excluded.token_balance,
            enabled = excluded.enabled,
            fetched_at = excluded.fetched_at
        "#,
        params![
            scaffold_id,
            chain.currency,
            chain.fiat_amount,
            chain.transaction_index,
            chain.token_address,
            chain.token_balance,
            chain.enabled,
            snapshot.fetched_at,
        ],
    )
    .map_err(|e| ScaffoldError::Database(format!("Summary upsert failed: {}", e)))?;

    let summary_id: i64 = tx
        .query_row(
            "SELECT id FROM scaffold_summaries WHERE scaffold_id = ?",
            params![scaffold_id],
            |row| row.get(0),
        )
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?;

    tx.execute("DELETE FROM share_holders WHERE summary_id = ?", params![summary_id])
        .map_err(|e| ScaffoldError::Database(format!("Share holder delete failed: {}", e)))?;

    for (position, holder) in snapshot.share_holders.iter().enumerate() {
        tx.execute(
            "INSERT INTO share_holders (summary_id, position, address, percent) VALUES (?, ?, ?, ?)",
            params![summary_id, position as i64, holder.address, holder.percent],
        )
        .map_err(|e| ScaffoldError::Database(format!("Share holder insert failed: {}", e)))?;
    }

    let summary = find_summary(&tx, scaffold_id)?
        .ok_or_else(|| ScaffoldError::Database("Summary not found after upsert".to_string()))?;

    tx.commit()
        .map_err(|e| ScaffoldError::Database(format!("Commit failed: {}", e)))?;

    debug!(
        scaffold_id,
        summary_id,
        share_holders = summary.share_holders.len(),
        "Summary replaced"
    );

    Ok(summary)
}

/// Count a user's scaffolds whose cached summary reports them disabled
pub fn count_disabled_scaffolds(conn: &Connection, user_id: i64) -> Result<u64, ScaffoldError> {
    let count: i64 = conn
        .query_row(
            r#"
            SELECT COUNT(*)
            FROM scaffold_summaries m
            JOIN scaffolds s ON m.scaffold_id = s.id
            JOIN open_keys k ON s.open_key_id = k.id
            WHERE m.enabled = 0 AND k.user_id = ?
            "#,
            params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| ScaffoldError::Database(format!("Query failed: {}", e)))?;

    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{keys, scaffolds, ScaffoldDb};
    use crate::types::{ChainSummary, SaveScaffoldRequest};
    use chrono::{Duration, Utc};

    fn snapshot(enabled: bool, holders: &[(&str, u32)]) -> SummarySnapshot {
        SummarySnapshot {
            chain: ChainSummary {
                currency: "USD".to_string(),
                fiat_amount: "2.50".to_string(),
                transaction_index: 0,
                token_address: None,
                token_balance: "0".to_string(),
                enabled,
            },
            share_holders: holders
                .iter()
                .map(|(address, percent)| ShareHolder {
                    address: address.to_string(),
                    percent: *percent,
                })
                .collect(),
            fetched_at: Utc::now(),
        }
    }

    fn seed(db: &ScaffoldDb, addresses: &[&str]) -> (i64, Vec<i64>) {
        db.with_conn_mut(|conn| {
            let user = keys::create_user(conn, "googleId")?;
            let key = keys::create_open_key(conn, user.id, "op_pk_1", None)?;
            let mut ids = Vec::new();
            for address in addresses {
                let request = SaveScaffoldRequest {
                    address: address.to_string(),
                    abi: "[]".to_string(),
                    open_key: key.value.clone(),
                    developer_address: "0xdev".to_string(),
                    description: String::new(),
                    fiat_amount: "1".to_string(),
                    currency: "USD".to_string(),
                    conversion_amount: "1".to_string(),
                    web_hook: None,
                    properties: vec![],
                    version: "V1".to_string(),
                };
                ids.push(scaffolds::create_scaffold(conn, key.id, &request, Utc::now())?.id);
            }
            Ok((user.id, ids))
        })
        .unwrap()
    }

    #[test]
    fn test_replace_summary_keeps_identity() {
        let db = ScaffoldDb::open_in_memory().unwrap();
        let (_, ids) = seed(&db, &["0xabc"]);

        let first = db
            .with_conn_mut(|conn| replace_summary(conn, ids[0], &snapshot(true, &[("0x1", 60), ("0x2", 40)])))
            .unwrap();
        assert_eq!(first.scaffold_address, "0xabc");
        assert_eq!(first.share_holders.len(), 2);

        let mut later = snapshot(false, &[("0x3", 100)]);
        later.fetched_at = first.fetched_at + Duration::minutes(11);
        let second = db
            .with_conn_mut(|conn| replace_summary(conn, ids[0], &later))
            .unwrap();

        assert_eq!(second.id, first.id);
        assert!(!second.enabled);
        assert_eq!(
            second.share_holders,
            vec![ShareHolder {
                address: "0x3".to_string(),
                percent: 100
            }]
        );

        let summaries: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM scaffold_summaries", [], |row| row.get(0))?))
            .unwrap();
        let holders: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM share_holders", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(summaries, 1);
        assert_eq!(holders, 1);
    }

    #[test]
    fn test_failed_replace_keeps_previous_summary() {
        let db = ScaffoldDb::open_in_memory().unwrap();
        let (_, ids) = seed(&db, &["0xabc"]);

        let before = db
            .with_conn_mut(|conn| replace_summary(conn, ids[0], &snapshot(true, &[("0x1", 60), ("0x2", 40)])))
            .unwrap();

        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TEMP TRIGGER reject_holder BEFORE INSERT ON share_holders \
                 WHEN NEW.address = '0xbad' BEGIN SELECT RAISE(ABORT, 'rejected holder'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        // The first holder inserts fine, the second aborts the statement
        let mut failing = snapshot(false, &[("0x3", 50), ("0xbad", 50)]);
        failing.chain.transaction_index = 9;
        let result = db.with_conn_mut(|conn| replace_summary(conn, ids[0], &failing));
        assert!(matches!(result, Err(ScaffoldError::Database(_))));

        let after = db
            .with_conn(|conn| find_summary(conn, ids[0]))
            .unwrap()
            .unwrap();
        assert_eq!(after, before);
        assert!(after.enabled);
        assert_eq!(after.transaction_index, 0);
        assert_eq!(after.share_holders.len(), 2);
    }

    #[test]
    fn test_find_summary_missing() {
        let db = ScaffoldDb::open_in_memory().unwrap();
        let (_, ids) = seed(&db, &["0xabc"]);

        let summary = db.with_conn(|conn| find_summary(conn, ids[0])).unwrap();
        assert!(summary.is_none());
    }

    #[test]
    fn test_count_disabled_scaffolds() {
        let db = ScaffoldDb::open_in_memory().unwrap();
        let (user_id, ids) = seed(&db, &["0x01", "0x02", "0x03"]);

        db.with_conn_mut(|conn| {
            replace_summary(conn, ids[0], &snapshot(false, &[]))?;
            replace_summary(conn, ids[1], &snapshot(false, &[]))?;
            replace_summary(conn, ids[2], &snapshot(true, &[]))?;
            Ok(())
        })
        .unwrap();

        let count = db
            .with_conn(|conn| count_disabled_scaffolds(conn, user_id))
            .unwrap();
        assert_eq!(count, 2);
    }
}
