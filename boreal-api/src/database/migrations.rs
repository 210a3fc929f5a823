use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id VARCHAR PRIMARY KEY,
            full_name VARCHAR,
            email VARCHAR,
            phone VARCHAR,
            status VARCHAR CHECK (status IS NULL OR status IN ('active', 'inactive')),
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_created
            ON contacts(created_at)",
        [],
    )?;

    // Audit trail for applied merges. Survivor ids are not foreign keys: a
    // survivor may itself be merged away later and its history must remain.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contact_merges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survivor_id VARCHAR NOT NULL,
            merged_ids VARCHAR NOT NULL,
            fields VARCHAR NOT NULL,
            note VARCHAR NOT NULL,
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contact_merges_survivor
            ON contact_merges(survivor_id)",
        [],
    )?;

    Ok(())
}
