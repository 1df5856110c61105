//! Domain models that mirror the SQLite schema plus the shapes produced by the
//! query layer. These stay plain data holders; validation lives next to the
//! persistence code and presentation lives in the terminal front-end.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{EntityKind, Result, StoreError};

/// Delimiter used for the persisted genre string.
const GENRE_DELIMITER: char = ',';

/// Lowercase one character at a time. Unlike `str::to_lowercase` there is no
/// word-final sigma rule, so a substring folds the same way on its own as it
/// does inside a longer string.
pub(crate) fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Ordered set of genre tags. The database stores a single delimited string;
/// every conversion between the two goes through [`Genres::encode`] and
/// [`Genres::decode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genres(Vec<String>);

impl Genres {
    /// Build a tag set, trimming each tag and dropping blanks and repeats.
    /// Repeats are matched ignoring case; the first spelling of a tag is kept
    /// and decides its position.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            let folded = fold_case(tag);
            if tag.is_empty() || out.iter().any(|existing| fold_case(existing) == folded) {
                continue;
            }
            out.push(tag.to_string());
        }
        Genres(out)
    }

    pub fn decode(raw: &str) -> Self {
        Genres::new(raw.split(GENRE_DELIMITER))
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (idx, tag) in self.0.iter().enumerate() {
            if idx > 0 {
                out.push(GENRE_DELIMITER);
            }
            out.push_str(tag);
        }
        out
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags may not contain the delimiter, otherwise a round trip through the
    /// database would split them.
    pub(crate) fn validate(&self) -> Result<()> {
        match self.0.iter().find(|tag| tag.contains(GENRE_DELIMITER)) {
            Some(tag) => Err(StoreError::validation(format!(
                "Genre '{tag}' may not contain '{GENRE_DELIMITER}'."
            ))),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Genres {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A location that can host shows.
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Genres,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A performer who can be booked into shows.
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Genres,
    pub facebook_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A booking of one artist at one venue. Venues and artists may each have any
/// number of shows.
pub struct Show {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub artist_id: i64,
    pub venue_id: i64,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Fields accepted when listing a new venue.
#[derive(Debug, Clone, Default)]
pub struct NewVenue {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Genres,
}

/// Fields accepted when listing a new artist.
#[derive(Debug, Clone, Default)]
pub struct NewArtist {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub genres: Genres,
    pub facebook_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewShow {
    pub start_time: DateTime<Utc>,
    pub artist_id: i64,
    pub venue_id: i64,
}

/// Partial update for a venue. `None` leaves a field untouched; for optional
/// columns `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct VenueChanges {
    pub name: Option<String>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub facebook_link: Option<Option<String>>,
    pub genres: Option<Genres>,
}

/// Partial update for an artist, same conventions as [`VenueChanges`].
#[derive(Debug, Clone, Default)]
pub struct ArtistChanges {
    pub name: Option<String>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub genres: Option<Genres>,
    pub facebook_link: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ShowChanges {
    pub start_time: Option<DateTime<Utc>>,
    pub artist_id: Option<i64>,
    pub venue_id: Option<i64>,
}

/// The two kinds of record that own shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOwner {
    Venue,
    Artist,
}

impl From<ShowOwner> for EntityKind {
    fn from(owner: ShowOwner) -> Self {
        match owner {
            ShowOwner::Venue => EntityKind::Venue,
            ShowOwner::Artist => EntityKind::Artist,
        }
    }
}

/// Id and name only, used by search results and index listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
}

impl From<&Venue> for EntitySummary {
    fn from(venue: &Venue) -> Self {
        Self {
            id: venue.id,
            name: venue.name.clone(),
        }
    }
}

impl From<&Artist> for EntitySummary {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> SearchResults<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// A show flattened together with the names of its venue and artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowDetail {
    pub show_id: i64,
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub start_time: DateTime<Utc>,
}

/// A venue's shows split around a reference time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowAggregate {
    pub past: Vec<ShowDetail>,
    pub upcoming: Vec<ShowDetail>,
    pub past_count: usize,
    pub upcoming_count: usize,
}

impl ShowAggregate {
    /// Shows strictly before `now` are past; everything else is upcoming.
    pub fn partition(shows: Vec<ShowDetail>, now: DateTime<Utc>) -> Self {
        let (past, upcoming): (Vec<_>, Vec<_>) =
            shows.into_iter().partition(|show| show.start_time < now);
        Self {
            past_count: past.len(),
            upcoming_count: upcoming.len(),
            past,
            upcoming,
        }
    }

    pub fn total(&self) -> usize {
        self.past_count + self.upcoming_count
    }
}

/// Venue entry inside a location group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueListing {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: usize,
}

/// Venues that share the same (city, state) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGroup {
    pub city: Option<String>,
    pub state: Option<String>,
    pub venues: Vec<VenueListing>,
}

impl LocationGroup {
    /// `City, ST` with graceful fallbacks when either half is missing.
    pub fn label(&self) -> String {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) => format!("{city}, {state}"),
            (Some(city), None) => city.to_string(),
            (None, Some(state)) => state.to_string(),
            (None, None) => "Unknown location".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueDetail {
    pub venue: Venue,
    pub shows: ShowAggregate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistDetail {
    pub artist: Artist,
    pub shows: ShowAggregate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn genres_decode_trims_and_dedupes() {
        let genres = Genres::decode(" Jazz,Reggae ,, Jazz,Swing");
        assert_eq!(genres.tags(), ["Jazz", "Reggae", "Swing"]);
        assert_eq!(genres.encode(), "Jazz,Reggae,Swing");
    }

    #[test]
    fn genres_dedupe_ignores_case() {
        let genres = Genres::decode("Jazz,jazz, JAZZ ,Hip-Hop,hip-hop");
        assert_eq!(genres.tags(), ["Jazz", "Hip-Hop"]);
    }

    #[test]
    fn empty_genre_string_decodes_to_empty_set() {
        assert!(Genres::decode("").is_empty());
        assert_eq!(Genres::default().encode(), "");
    }

    #[test]
    fn genre_with_delimiter_is_rejected() {
        let genres = Genres(vec!["Rock,Roll".to_string()]);
        assert!(genres.validate().is_err());
    }

    #[test]
    fn partition_puts_boundary_show_in_upcoming() {
        let now = Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap();
        let show = |id, start_time| ShowDetail {
            show_id: id,
            venue_id: 1,
            venue_name: "The Musical Hop".to_string(),
            artist_id: 1,
            artist_name: "Guns N Petals".to_string(),
            start_time,
        };
        let aggregate = ShowAggregate::partition(
            vec![
                show(1, now - chrono::Duration::seconds(1)),
                show(2, now),
                show(3, now + chrono::Duration::days(3)),
            ],
            now,
        );
        assert_eq!(aggregate.past_count, 1);
        assert_eq!(aggregate.upcoming_count, 2);
        assert_eq!(aggregate.upcoming[0].show_id, 2);
        assert_eq!(aggregate.total(), 3);
    }

    #[test]
    fn location_label_falls_back() {
        let group = LocationGroup {
            city: Some("San Francisco".to_string()),
            state: None,
            venues: Vec::new(),
        };
        assert_eq!(group.label(), "San Francisco");
    }
}
