/*!
# Ledger Schema

Table layout for the donation ledger and its version bookkeeping.
*/

use crate::LedgerResult;
use rusqlite::{Connection, OptionalExtension};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables in a fresh database
pub fn initialize_database(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE donations (
            id TEXT PRIMARY KEY,
            transaction_id TEXT,
            receipt_number TEXT NOT NULL UNIQUE,
            amount TEXT NOT NULL, -- decimal string, major units
            currency TEXT NOT NULL,
            donor_name TEXT NOT NULL,
            donor_email TEXT NOT NULL,
            donor_phone TEXT,
            recurring INTEGER NOT NULL DEFAULT 0,
            frequency TEXT,
            payment_method TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL, -- unix millis
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX idx_donations_email ON donations(donor_email COLLATE NOCASE);
        CREATE INDEX idx_donations_created ON donations(created_at);
        CREATE INDEX idx_donations_status ON donations(status);

        CREATE TABLE schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Check if the donations table exists
pub fn check_schema(conn: &Connection) -> LedgerResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='donations'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Get current schema version from database
pub fn get_schema_version(conn: &Connection) -> LedgerResult<Option<i32>> {
    let table_exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if table_exists.is_none() {
        return Ok(None);
    }

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version)
}
