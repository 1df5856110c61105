use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::fields::{link, optional, required};
use super::shows::count_shows_for_artist;
use crate::error::{EntityKind, Result, StoreError};
use crate::models::{Artist, ArtistChanges, Genres, NewArtist};

const SELECT_ARTIST: &str =
    "SELECT id, name, city, state, phone, genres, facebook_link FROM artist";

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    let genres: Option<String> = row.get(5)?;
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        phone: row.get(4)?,
        genres: Genres::decode(genres.as_deref().unwrap_or_default()),
        facebook_link: row.get(6)?,
    })
}

pub fn fetch_artists(conn: &Connection) -> Result<Vec<Artist>> {
    let mut stmt = conn.prepare(&format!("{SELECT_ARTIST} ORDER BY id"))?;
    let artists = stmt
        .query_map([], artist_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(artists)
}

pub fn fetch_artist(conn: &Connection, id: i64) -> Result<Artist> {
    conn.query_row(
        &format!("{SELECT_ARTIST} WHERE id = ?1"),
        params![id],
        artist_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(EntityKind::Artist, id))
}

pub fn create_artist(conn: &Connection, new: NewArtist) -> Result<Artist> {
    let mut artist = Artist {
        id: 0,
        name: new.name,
        city: new.city,
        state: new.state,
        phone: new.phone,
        genres: new.genres,
        facebook_link: new.facebook_link,
    };
    normalize(&mut artist)?;

    conn.execute(
        "INSERT INTO artist (name, city, state, phone, genres, facebook_link)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            artist.name,
            artist.city,
            artist.state,
            artist.phone,
            artist.genres.encode(),
            artist.facebook_link,
        ],
    )?;
    artist.id = conn.last_insert_rowid();
    debug!(artist_id = artist.id, name = %artist.name, "inserted artist");
    Ok(artist)
}

pub fn update_artist(conn: &Connection, id: i64, changes: ArtistChanges) -> Result<Artist> {
    let mut artist = fetch_artist(conn, id)?;
    if let Some(name) = changes.name {
        artist.name = name;
    }
    if let Some(city) = changes.city {
        artist.city = city;
    }
    if let Some(state) = changes.state {
        artist.state = state;
    }
    if let Some(phone) = changes.phone {
        artist.phone = phone;
    }
    if let Some(genres) = changes.genres {
        artist.genres = genres;
    }
    if let Some(facebook_link) = changes.facebook_link {
        artist.facebook_link = facebook_link;
    }
    normalize(&mut artist)?;

    conn.execute(
        "UPDATE artist
         SET name = ?1, city = ?2, state = ?3, phone = ?4, genres = ?5, facebook_link = ?6
         WHERE id = ?7",
        params![
            artist.name,
            artist.city,
            artist.state,
            artist.phone,
            artist.genres.encode(),
            artist.facebook_link,
            id,
        ],
    )?;
    Ok(artist)
}

/// Remove an artist that has no shows booked.
pub fn delete_artist(conn: &Connection, id: i64) -> Result<Artist> {
    let artist = fetch_artist(conn, id)?;
    let shows = count_shows_for_artist(conn, id)?;
    if shows > 0 {
        return Err(StoreError::integrity(format!(
            "Artist {} still has {shows} show(s) booked; delete them first.",
            artist.name
        )));
    }

    conn.execute("DELETE FROM artist WHERE id = ?1", params![id])?;
    Ok(artist)
}

fn normalize(artist: &mut Artist) -> Result<()> {
    artist.name = required(EntityKind::Artist, "name", &artist.name)?;
    artist.city = optional(artist.city.take());
    artist.state = optional(artist.state.take());
    artist.phone = optional(artist.phone.take());
    artist.facebook_link = link("Facebook link", artist.facebook_link.take())?;
    artist.genres.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::error::ErrorKind;

    #[test]
    fn phone_update_leaves_other_fields() {
        let store = store();
        let conn = store.raw();
        let created = create_artist(
            &conn,
            NewArtist {
                name: "Guns N Petals".to_string(),
                city: Some("San Francisco".to_string()),
                state: Some("CA".to_string()),
                phone: Some("326-123-5000".to_string()),
                genres: Genres::new(["Rock n Roll"]),
                facebook_link: Some("https://www.facebook.com/GunsNPetals".to_string()),
            },
        )
        .unwrap();

        update_artist(
            &conn,
            created.id,
            ArtistChanges {
                phone: Some(Some("555-0000".to_string())),
                ..ArtistChanges::default()
            },
        )
        .unwrap();

        let fetched = fetch_artist(&conn, created.id).unwrap();
        assert_eq!(fetched.phone.as_deref(), Some("555-0000"));
        assert_eq!(
            Artist {
                phone: created.phone.clone(),
                ..fetched
            },
            created
        );
    }

    #[test]
    fn malformed_link_is_rejected_on_update() {
        let store = store();
        let conn = store.raw();
        let band = artist(&conn, "Matt Quevedo");
        let err = update_artist(
            &conn,
            band.id,
            ArtistChanges {
                facebook_link: Some(Some("not a url".to_string())),
                ..ArtistChanges::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(fetch_artist(&conn, band.id).unwrap(), band);
    }

    #[test]
    fn delete_with_shows_is_refused() {
        let store = store();
        let conn = store.raw();
        let hop = venue(&conn, "The Musical Hop", "San Francisco", "CA");
        let band = artist(&conn, "Guns N Petals");
        show(&conn, &hop, &band, at(21, 21));

        let err = delete_artist(&conn, band.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(fetch_artist(&conn, band.id).is_ok());
    }

    #[test]
    fn delete_missing_artist_is_not_found() {
        let store = store();
        let conn = store.raw();
        assert_eq!(
            delete_artist(&conn, 9).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
