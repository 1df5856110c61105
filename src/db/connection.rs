use anyhow::{Context, Result};
use rusqlite::Connection;

/// Enable foreign keys and run the idempotent schema. Called for every fresh
/// connection, file-backed or in-memory, so tests and real runs enforce the
/// same referential checks.
pub(crate) fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS venue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            city TEXT,
            state TEXT,
            address TEXT,
            phone TEXT,
            facebook_link TEXT,
            genres TEXT
        )",
        [],
    )
    .context("failed to create venue table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS artist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            city TEXT,
            state TEXT,
            phone TEXT,
            genres TEXT,
            facebook_link TEXT
        )",
        [],
    )
    .context("failed to create artist table")?;

    // No ON DELETE action: a venue or artist with shows cannot be removed.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS show (
            show_id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL,
            artist_id INTEGER NOT NULL,
            venue_id INTEGER NOT NULL,
            FOREIGN KEY(artist_id) REFERENCES artist(id),
            FOREIGN KEY(venue_id) REFERENCES venue(id)
        )",
        [],
    )
    .context("failed to create show table")?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_show_venue_id ON show(venue_id);
         CREATE INDEX IF NOT EXISTS idx_show_artist_id ON show(artist_id);",
    )
    .context("failed to create show indexes")?;

    Ok(())
}
