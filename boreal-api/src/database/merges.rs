use crate::database::contacts::{delete_contact_rows, write_contact_fields};
use crate::database::{AsyncDbConnection, StoreResult};
use rusqlite::{params, Connection, TransactionBehavior};
use shared_types::{ContactMergeRecord, ContactUpdate};

pub fn insert_merge_record(
    conn: &Connection,
    survivor_id: &str,
    merged_ids: &[String],
    fields: &ContactUpdate,
    note: &str,
    now: i64,
) -> StoreResult<i64> {
    let merged_json = serde_json::to_string(merged_ids)?;
    let fields_json = serde_json::to_string(fields)?;

    let id: i64 = conn.query_row(
        "INSERT INTO contact_merges (survivor_id, merged_ids, fields, note, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id",
        params![survivor_id, merged_json, fields_json, note, now],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Update the survivor, delete the losers and record the audit entry in one
/// immediate transaction. Any missing row rolls the whole merge back.
pub async fn apply_merge(
    conn: AsyncDbConnection,
    survivor_id: &str,
    update: &ContactUpdate,
    losers: &[String],
    note: &str,
) -> StoreResult<i64> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    // IMMEDIATE takes the write lock up front so overlapping merges queue
    // behind each other instead of interleaving.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    write_contact_fields(&tx, survivor_id, update, now)?;
    delete_contact_rows(&tx, losers)?;
    let record_id = insert_merge_record(&tx, survivor_id, losers, update, note, now)?;
    tx.commit()?;

    Ok(record_id)
}

pub async fn list_merges(
    conn: AsyncDbConnection,
    limit: usize,
) -> StoreResult<Vec<ContactMergeRecord>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT id, survivor_id, merged_ids, fields, note, created_at
         FROM contact_merges
         ORDER BY created_at DESC, id DESC
         LIMIT ?",
    )?;

    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(rows.len());
    for (id, survivor_id, merged_ids, fields, note, created_at) in rows {
        records.push(ContactMergeRecord {
            id,
            survivor_id,
            merged_ids: serde_json::from_str(&merged_ids)?,
            fields: serde_json::from_str(&fields)?,
            note,
            created_at,
        });
    }

    Ok(records)
}
