use crate::database::{AsyncDbConnection, StoreError, StoreResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use shared_types::{Contact, ContactStatus, ContactUpdate, CreateContactRequest};

const CONTACT_COLUMNS: &str = "id, full_name, email, phone, status, created_at, updated_at";

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    let status: Option<String> = row.get(4)?;
    let status = status
        .map(|s| s.parse::<ContactStatus>())
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Contact {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        status,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Blank strings are stored as NULL so "no value" has a single representation.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn insert_contact(
    conn: AsyncDbConnection,
    request: &CreateContactRequest,
) -> StoreResult<Contact> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let id = uuid::Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO contacts (id, full_name, email, phone, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            &id,
            non_blank(&request.full_name),
            non_blank(&request.email),
            non_blank(&request.phone),
            request.status.map(|s| s.as_str()),
            now,
            now
        ],
    )?;

    Ok(Contact {
        id,
        full_name: non_blank(&request.full_name).map(str::to_string),
        email: non_blank(&request.email).map(str::to_string),
        phone: non_blank(&request.phone).map(str::to_string),
        status: request.status,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_contact(conn: AsyncDbConnection, id: &str) -> StoreResult<Contact> {
    let conn = conn.lock().await?;

    conn.query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"),
        [id],
        row_to_contact,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

pub async fn list_contacts(conn: AsyncDbConnection, limit: usize) -> StoreResult<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC, id LIMIT ?"
    ))?;

    let contacts = stmt
        .query_map([limit as i64], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

/// Every contact, oldest first. The duplicate scan depends on this order
/// for its discovery-order tie-break.
pub async fn list_all_contacts(conn: AsyncDbConnection) -> StoreResult<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at ASC, id ASC"
    ))?;

    let contacts = stmt
        .query_map([], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

pub async fn find_contacts_by_ids(
    conn: AsyncDbConnection,
    ids: &[String],
) -> StoreResult<Vec<Contact>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let conn = conn.lock().await?;
    let placeholders = vec!["?"; ids.len()].join(", ");

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id IN ({placeholders})"
    ))?;

    let contacts = stmt
        .query_map(params_from_iter(ids.iter()), row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

/// Overwrite the mutable fields of one contact. Fails with `NotFound` when
/// the row is gone.
pub fn write_contact_fields(
    conn: &Connection,
    id: &str,
    update: &ContactUpdate,
    now: i64,
) -> StoreResult<()> {
    let affected = conn.execute(
        "UPDATE contacts
         SET full_name = ?, email = ?, phone = ?, status = ?, updated_at = ?
         WHERE id = ?",
        params![
            non_blank(&update.full_name),
            non_blank(&update.email),
            non_blank(&update.phone),
            update.status.map(|s| s.as_str()),
            now,
            id
        ],
    )?;

    if affected == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }

    Ok(())
}

/// Delete rows one by one, failing on the first id that no longer exists.
/// Callers run this inside a transaction so a failure leaves every row intact.
pub fn delete_contact_rows(conn: &Connection, ids: &[String]) -> StoreResult<usize> {
    let mut stmt = conn.prepare("DELETE FROM contacts WHERE id = ?")?;

    for id in ids {
        if stmt.execute([id])? == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
    }

    Ok(ids.len())
}

pub async fn update_contact(
    conn: AsyncDbConnection,
    id: &str,
    update: &ContactUpdate,
) -> StoreResult<Contact> {
    {
        let conn = conn.lock().await?;
        write_contact_fields(&conn, id, update, chrono::Utc::now().timestamp())?;
    }

    get_contact(conn, id).await
}

pub async fn delete_contacts(conn: AsyncDbConnection, ids: &[String]) -> StoreResult<usize> {
    let mut conn = conn.lock().await?;
    let tx = conn.transaction()?;
    let deleted = delete_contact_rows(&tx, ids)?;
    tx.commit()?;

    Ok(deleted)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::database::Database;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub fn open_test_database() -> (TempDir, Arc<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("crm.sqlite3"), 2).unwrap();
        (dir, Arc::new(db))
    }

    /// Insert a contact with a fixed id and timestamp so tests control ordering.
    pub async fn seed_contact(
        db: &Database,
        id: &str,
        full_name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        updated_at: i64,
    ) {
        let conn = db.async_connection.lock().await.unwrap();
        conn.execute(
            "INSERT INTO contacts (id, full_name, email, phone, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'active', ?, ?)",
            rusqlite::params![id, full_name, email, phone, updated_at, updated_at],
        )
        .unwrap();
    }
}
