//! Persistence layer split across one submodule per table. The free functions
//! take a plain `Connection` so they compose inside a `Transaction`; the
//! [`Store`] handle owns the connection and decides transaction boundaries.

mod artists;
mod connection;
mod fields;
mod shows;
mod venues;

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::Result;

pub use artists::{create_artist, delete_artist, fetch_artist, fetch_artists, update_artist};
pub use shows::{
    count_shows_for_artist, count_shows_for_venue, create_show, delete_show, fetch_show,
    fetch_show_details, fetch_shows, fetch_shows_for_artist, fetch_shows_for_venue,
    upcoming_counts_by_venue, update_show,
};
pub use venues::{create_venue, delete_venue, fetch_venue, fetch_venues, update_venue};

/// Handle to the booking database. Query and mutation services borrow it; each
/// of their calls runs as exactly one transaction.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (creating if needed) the database file at `path` and run the
    /// schema.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let conn = Connection::open(path).context("failed to open SQLite database")?;
        connection::prepare(&conn)?;
        debug!(path = %path.display(), "opened store");
        Ok(Self::from_connection(conn))
    }

    /// Private scratch database, mostly for tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        connection::prepare(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run `f` in a transaction that is always rolled back. Reads see one
    /// consistent snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        f(&tx)
    }

    /// Run `f` in a transaction: commit when it returns `Ok`, roll back
    /// otherwise. Nothing `f` wrote is visible after a failure.
    pub fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// A panic while holding the lock unwinds through the open transaction,
    /// which rolls it back on drop, so the connection is still usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> MutexGuard<'_, Connection> {
        self.lock()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::models::{Artist, Genres, NewArtist, NewShow, NewVenue, Show, Venue};

    pub(crate) fn store() -> Store {
        Store::open_in_memory().expect("in-memory store")
    }

    pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2035, 5, day, hour, 0, 0).unwrap()
    }

    pub(crate) fn venue(conn: &Connection, name: &str, city: &str, state: &str) -> Venue {
        create_venue(
            conn,
            NewVenue {
                name: name.to_string(),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                genres: Genres::new(["Jazz", "Folk"]),
                ..NewVenue::default()
            },
        )
        .expect("venue")
    }

    pub(crate) fn artist(conn: &Connection, name: &str) -> Artist {
        create_artist(
            conn,
            NewArtist {
                name: name.to_string(),
                city: Some("San Francisco".to_string()),
                state: Some("CA".to_string()),
                ..NewArtist::default()
            },
        )
        .expect("artist")
    }

    pub(crate) fn show(conn: &Connection, venue: &Venue, artist: &Artist, start: DateTime<Utc>) -> Show {
        create_show(
            conn,
            NewShow {
                start_time: start,
                artist_id: artist.id,
                venue_id: venue.id,
            },
        )
        .expect("show")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::{ErrorKind, StoreError};

    #[test]
    fn write_rolls_back_on_error() {
        let store = store();
        let result: Result<()> = store.write(|conn| {
            venue(conn, "The Musical Hop", "San Francisco", "CA");
            Err(StoreError::validation("abort"))
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);

        let venues = store.read(fetch_venues).unwrap();
        assert!(venues.is_empty());
    }

    #[test]
    fn write_commits_on_success() {
        let store = store();
        let created = store
            .write(|conn| Ok(venue(conn, "The Dueling Pianos Bar", "New York", "NY")))
            .unwrap();
        let fetched = store.read(|conn| fetch_venue(conn, created.id)).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn read_never_persists_writes() {
        let store = store();
        store
            .read(|conn| Ok(venue(conn, "Scratch", "Nowhere", "NA")))
            .unwrap();
        assert!(store.read(fetch_venues).unwrap().is_empty());
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = store();
        let enabled: i64 = store
            .raw()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn check_failure_surfaces_fixed_message() {
        let store = store();
        let err = store
            .write(|conn| {
                conn.execute("INSERT INTO venue (name) VALUES ('   ')", [])?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "A required field is missing or invalid.");
    }
}
