use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{EntityKind, Result, StoreError};
use crate::models::{NewShow, Show, ShowChanges, ShowDetail};

const SELECT_SHOW: &str = "SELECT show_id, start_time, artist_id, venue_id FROM show";

/// Shows joined with both owners. LEFT JOINs so a dangling reference shows up
/// as a missing name instead of a silently dropped row.
const SELECT_SHOW_DETAIL: &str = "SELECT s.show_id, s.venue_id, v.name, s.artist_id, a.name, s.start_time
     FROM show s
     LEFT JOIN venue v ON v.id = s.venue_id
     LEFT JOIN artist a ON a.id = s.artist_id";

fn show_from_row(row: &Row<'_>) -> rusqlite::Result<Show> {
    Ok(Show {
        id: row.get(0)?,
        start_time: row.get(1)?,
        artist_id: row.get(2)?,
        venue_id: row.get(3)?,
    })
}

/// Joined row before the owner names have been checked.
struct DetailRow {
    show_id: i64,
    venue_id: i64,
    venue_name: Option<String>,
    artist_id: i64,
    artist_name: Option<String>,
    start_time: DateTime<Utc>,
}

impl DetailRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            show_id: row.get(0)?,
            venue_id: row.get(1)?,
            venue_name: row.get(2)?,
            artist_id: row.get(3)?,
            artist_name: row.get(4)?,
            start_time: row.get(5)?,
        })
    }

    fn resolve(self) -> Result<ShowDetail> {
        let venue_name = self.venue_name.ok_or_else(|| {
            StoreError::integrity(format!(
                "Show {} references missing venue {}.",
                self.show_id, self.venue_id
            ))
        })?;
        let artist_name = self.artist_name.ok_or_else(|| {
            StoreError::integrity(format!(
                "Show {} references missing artist {}.",
                self.show_id, self.artist_id
            ))
        })?;
        Ok(ShowDetail {
            show_id: self.show_id,
            venue_id: self.venue_id,
            venue_name,
            artist_id: self.artist_id,
            artist_name,
            start_time: self.start_time,
        })
    }
}

fn query_details(conn: &Connection, filter: &str, id: Option<i64>) -> Result<Vec<ShowDetail>> {
    let mut stmt = conn.prepare(&format!("{SELECT_SHOW_DETAIL} {filter}"))?;
    let rows = match id {
        Some(id) => stmt
            .query_map(params![id], DetailRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], DetailRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };
    rows.into_iter().map(DetailRow::resolve).collect()
}

/// Every show in insertion order.
pub fn fetch_shows(conn: &Connection) -> Result<Vec<Show>> {
    let mut stmt = conn.prepare(&format!("{SELECT_SHOW} ORDER BY show_id"))?;
    let shows = stmt
        .query_map([], show_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(shows)
}

pub fn fetch_show(conn: &Connection, id: i64) -> Result<Show> {
    conn.query_row(
        &format!("{SELECT_SHOW} WHERE show_id = ?1"),
        params![id],
        show_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(EntityKind::Show, id))
}

/// Every show with venue and artist names, in insertion order.
pub fn fetch_show_details(conn: &Connection) -> Result<Vec<ShowDetail>> {
    query_details(conn, "ORDER BY s.show_id", None)
}

/// Shows hosted by one venue, earliest first.
pub fn fetch_shows_for_venue(conn: &Connection, venue_id: i64) -> Result<Vec<ShowDetail>> {
    let mut shows = query_details(conn, "WHERE s.venue_id = ?1", Some(venue_id))?;
    sort_chronologically(&mut shows);
    Ok(shows)
}

/// Shows played by one artist, earliest first.
pub fn fetch_shows_for_artist(conn: &Connection, artist_id: i64) -> Result<Vec<ShowDetail>> {
    let mut shows = query_details(conn, "WHERE s.artist_id = ?1", Some(artist_id))?;
    sort_chronologically(&mut shows);
    Ok(shows)
}

// Timestamps are compared as values, not as their stored text.
fn sort_chronologically(shows: &mut [ShowDetail]) {
    shows.sort_by_key(|show| (show.start_time, show.show_id));
}

pub fn count_shows_for_venue(conn: &Connection, venue_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM show WHERE venue_id = ?1",
        params![venue_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub fn count_shows_for_artist(conn: &Connection, artist_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM show WHERE artist_id = ?1",
        params![artist_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Number of shows at or after `now`, keyed by venue id. Venues without
/// upcoming shows are absent from the map.
pub fn upcoming_counts_by_venue(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<HashMap<i64, usize>> {
    let mut stmt = conn.prepare("SELECT venue_id, start_time FROM show")?;
    let mut rows = stmt.query([])?;

    let mut counts = HashMap::new();
    while let Some(row) = rows.next()? {
        let venue_id: i64 = row.get(0)?;
        let start_time: DateTime<Utc> = row.get(1)?;
        if start_time >= now {
            *counts.entry(venue_id).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Insert a show after checking that both the artist and the venue exist.
pub fn create_show(conn: &Connection, new: NewShow) -> Result<Show> {
    ensure_references(conn, new.artist_id, new.venue_id)?;

    conn.execute(
        "INSERT INTO show (start_time, artist_id, venue_id) VALUES (?1, ?2, ?3)",
        params![new.start_time, new.artist_id, new.venue_id],
    )?;

    let show = Show {
        id: conn.last_insert_rowid(),
        start_time: new.start_time,
        artist_id: new.artist_id,
        venue_id: new.venue_id,
    };
    debug!(
        show_id = show.id,
        artist_id = show.artist_id,
        venue_id = show.venue_id,
        "inserted show"
    );
    Ok(show)
}

pub fn update_show(conn: &Connection, id: i64, changes: ShowChanges) -> Result<Show> {
    let mut show = fetch_show(conn, id)?;
    if let Some(start_time) = changes.start_time {
        show.start_time = start_time;
    }
    if let Some(artist_id) = changes.artist_id {
        show.artist_id = artist_id;
    }
    if let Some(venue_id) = changes.venue_id {
        show.venue_id = venue_id;
    }
    ensure_references(conn, show.artist_id, show.venue_id)?;

    conn.execute(
        "UPDATE show SET start_time = ?1, artist_id = ?2, venue_id = ?3 WHERE show_id = ?4",
        params![show.start_time, show.artist_id, show.venue_id, id],
    )?;
    Ok(show)
}

pub fn delete_show(conn: &Connection, id: i64) -> Result<Show> {
    let show = fetch_show(conn, id)?;
    conn.execute("DELETE FROM show WHERE show_id = ?1", params![id])?;
    Ok(show)
}

fn ensure_references(conn: &Connection, artist_id: i64, venue_id: i64) -> Result<()> {
    if !exists(conn, "SELECT EXISTS(SELECT 1 FROM artist WHERE id = ?1)", artist_id)? {
        return Err(StoreError::integrity(format!(
            "Artist {artist_id} does not exist."
        )));
    }
    if !exists(conn, "SELECT EXISTS(SELECT 1 FROM venue WHERE id = ?1)", venue_id)? {
        return Err(StoreError::integrity(format!(
            "Venue {venue_id} does not exist."
        )));
    }
    Ok(())
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    Ok(conn.query_row(sql, params![id], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::error::ErrorKind;

    #[test]
    fn show_with_unknown_artist_is_integrity_error() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");

        let err = create_show(
            &conn,
            NewShow {
                start_time: at(21, 21),
                artist_id: 99,
                venue_id: hop.id,
            },
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(fetch_shows(&conn).unwrap().is_empty());
    }

    #[test]
    fn show_with_unknown_venue_is_integrity_error() {
        let store = store();
        let conn = store.raw();
        let band = artist(&conn, "Guns N Petals");

        let err = create_show(
            &conn,
            NewShow {
                start_time: at(21, 21),
                artist_id: band.id,
                venue_id: 5,
            },
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(fetch_shows(&conn).unwrap().is_empty());
    }

    #[test]
    fn venue_and_artist_can_share_many_shows() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let park = venue(&conn, "Park Square Live Music & Coffee", "San Francisco", "CA");
        let band = artist(&conn, "The Wild Sax Band");
        let other = artist(&conn, "Matt Quevedo");

        show(&conn, &hop, &band, at(3, 20));
        show(&conn, &hop, &band, at(1, 20));
        show(&conn, &park, &band, at(2, 20));
        show(&conn, &hop, &other, at(4, 20));

        let hop_shows = fetch_shows_for_venue(&conn, hop.id).unwrap();
        let starts: Vec<_> = hop_shows.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, [at(1, 20), at(3, 20), at(4, 20)]);
        assert_eq!(fetch_shows_for_artist(&conn, band.id).unwrap().len(), 3);
        assert_eq!(count_shows_for_venue(&conn, park.id).unwrap(), 1);
    }

    #[test]
    fn start_time_round_trips() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let band = artist(&conn, "Guns N Petals");
        let created = show(&conn, &hop, &band, at(21, 21));
        assert_eq!(fetch_show(&conn, created.id).unwrap(), created);
    }

    #[test]
    fn update_to_missing_venue_is_refused() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let band = artist(&conn, "Guns N Petals");
        let booked = show(&conn, &hop, &band, at(21, 21));

        let err = update_show(
            &conn,
            booked.id,
            ShowChanges {
                venue_id: Some(77),
                ..ShowChanges::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert_eq!(fetch_show(&conn, booked.id).unwrap(), booked);
    }

    #[test]
    fn dangling_reference_surfaces_as_integrity_error() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let band = artist(&conn, "Guns N Petals");
        show(&conn, &hop, &band, at(21, 21));

        conn.execute_batch("PRAGMA foreign_keys = OFF; DELETE FROM artist;")
            .unwrap();

        let err = fetch_show_details(&conn).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(err.to_string().contains("missing artist"));
    }

    #[test]
    fn upcoming_counts_include_boundary() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let band = artist(&conn, "Guns N Petals");
        show(&conn, &hop, &band, at(1, 20));
        show(&conn, &hop, &band, at(10, 20));
        show(&conn, &hop, &band, at(20, 20));

        let counts = upcoming_counts_by_venue(&conn, at(10, 20)).unwrap();
        assert_eq!(counts.get(&hop.id), Some(&2));
    }
}
