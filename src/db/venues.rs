use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::fields::{link, optional, required};
use super::shows::count_shows_for_venue;
use crate::error::{EntityKind, Result, StoreError};
use crate::models::{Genres, NewVenue, Venue, VenueChanges};

const SELECT_VENUE: &str =
    "SELECT id, name, city, state, address, phone, facebook_link, genres FROM venue";

fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    let genres: Option<String> = row.get(7)?;
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        facebook_link: row.get(6)?,
        genres: Genres::decode(genres.as_deref().unwrap_or_default()),
    })
}

/// Every venue in insertion order.
pub fn fetch_venues(conn: &Connection) -> Result<Vec<Venue>> {
    let mut stmt = conn.prepare(&format!("{SELECT_VENUE} ORDER BY id"))?;
    let venues = stmt
        .query_map([], venue_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(venues)
}

pub fn fetch_venue(conn: &Connection, id: i64) -> Result<Venue> {
    conn.query_row(
        &format!("{SELECT_VENUE} WHERE id = ?1"),
        params![id],
        venue_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(EntityKind::Venue, id))
}

/// Insert a venue after normalizing its fields, returning the stored row.
pub fn create_venue(conn: &Connection, new: NewVenue) -> Result<Venue> {
    let mut venue = Venue {
        id: 0,
        name: new.name,
        city: new.city,
        state: new.state,
        address: new.address,
        phone: new.phone,
        facebook_link: new.facebook_link,
        genres: new.genres,
    };
    normalize(&mut venue)?;

    conn.execute(
        "INSERT INTO venue (name, city, state, address, phone, facebook_link, genres)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            venue.name,
            venue.city,
            venue.state,
            venue.address,
            venue.phone,
            venue.facebook_link,
            venue.genres.encode(),
        ],
    )?;
    venue.id = conn.last_insert_rowid();
    debug!(venue_id = venue.id, name = %venue.name, "inserted venue");
    Ok(venue)
}

/// Apply the supplied changes on top of the stored row. Fields left as `None`
/// keep their current value.
pub fn update_venue(conn: &Connection, id: i64, changes: VenueChanges) -> Result<Venue> {
    let mut venue = fetch_venue(conn, id)?;
    if let Some(name) = changes.name {
        venue.name = name;
    }
    if let Some(city) = changes.city {
        venue.city = city;
    }
    if let Some(state) = changes.state {
        venue.state = state;
    }
    if let Some(address) = changes.address {
        venue.address = address;
    }
    if let Some(phone) = changes.phone {
        venue.phone = phone;
    }
    if let Some(facebook_link) = changes.facebook_link {
        venue.facebook_link = facebook_link;
    }
    if let Some(genres) = changes.genres {
        venue.genres = genres;
    }
    normalize(&mut venue)?;

    conn.execute(
        "UPDATE venue
         SET name = ?1, city = ?2, state = ?3, address = ?4, phone = ?5,
             facebook_link = ?6, genres = ?7
         WHERE id = ?8",
        params![
            venue.name,
            venue.city,
            venue.state,
            venue.address,
            venue.phone,
            venue.facebook_link,
            venue.genres.encode(),
            id,
        ],
    )?;
    Ok(venue)
}

/// Remove a venue. Venues that still host shows are refused; their shows have
/// to be deleted first. Returns the removed row.
pub fn delete_venue(conn: &Connection, id: i64) -> Result<Venue> {
    let venue = fetch_venue(conn, id)?;
    let shows = count_shows_for_venue(conn, id)?;
    if shows > 0 {
        return Err(StoreError::integrity(format!(
            "Venue {} still hosts {shows} show(s); delete them first.",
            venue.name
        )));
    }

    conn.execute("DELETE FROM venue WHERE id = ?1", params![id])?;
    Ok(venue)
}

fn normalize(venue: &mut Venue) -> Result<()> {
    venue.name = required(EntityKind::Venue, "name", &venue.name)?;
    venue.city = optional(venue.city.take());
    venue.state = optional(venue.state.take());
    venue.address = optional(venue.address.take());
    venue.phone = optional(venue.phone.take());
    venue.facebook_link = link("Facebook link", venue.facebook_link.take())?;
    venue.genres.validate()
}
