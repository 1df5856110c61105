//! Read-only operations over the store. Every public method runs inside one
//! read transaction and propagates not-found and integrity errors unchanged.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::db::{self, Store};
use crate::error::{EntityKind, Result, StoreError};
use crate::models::{
    fold_case, Artist, ArtistDetail, EntitySummary, LocationGroup, SearchResults, Show,
    ShowAggregate, ShowDetail, ShowOwner, Venue, VenueDetail, VenueListing,
};

pub struct QueryService<'a> {
    store: &'a Store,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Case-insensitive substring search over venue or artist names. An empty
    /// term matches everything. Shows have no name and cannot be searched.
    pub fn search(&self, kind: EntityKind, term: &str) -> Result<SearchResults<EntitySummary>> {
        let data = match kind {
            EntityKind::Venue => self
                .search_venues(term)?
                .data
                .iter()
                .map(EntitySummary::from)
                .collect(),
            EntityKind::Artist => self
                .search_artists(term)?
                .data
                .iter()
                .map(EntitySummary::from)
                .collect(),
            EntityKind::Show => {
                return Err(StoreError::validation("Shows cannot be searched by name."))
            }
        };
        Ok(SearchResults::new(data))
    }

    pub fn search_venues(&self, term: &str) -> Result<SearchResults<Venue>> {
        let venues = self.store.read(db::fetch_venues)?;
        let results = SearchResults::new(filter_by_name(venues, term, |v| &v.name));
        debug!(term, count = results.count, "searched venues");
        Ok(results)
    }

    pub fn search_artists(&self, term: &str) -> Result<SearchResults<Artist>> {
        let artists = self.store.read(db::fetch_artists)?;
        let results = SearchResults::new(filter_by_name(artists, term, |a| &a.name));
        debug!(term, count = results.count, "searched artists");
        Ok(results)
    }

    /// Venues grouped by (city, state) in the order each pair first appears,
    /// each venue annotated with its upcoming show count relative to `now`.
    pub fn list_grouped_by_location(&self, now: DateTime<Utc>) -> Result<Vec<LocationGroup>> {
        self.store.read(|conn| {
            let venues = db::fetch_venues(conn)?;
            let upcoming = db::upcoming_counts_by_venue(conn, now)?;

            let mut groups: Vec<LocationGroup> = Vec::new();
            for venue in venues {
                let listing = VenueListing {
                    id: venue.id,
                    num_upcoming_shows: upcoming.get(&venue.id).copied().unwrap_or(0),
                    name: venue.name,
                };
                match groups
                    .iter_mut()
                    .find(|g| g.city == venue.city && g.state == venue.state)
                {
                    Some(group) => group.venues.push(listing),
                    None => groups.push(LocationGroup {
                        city: venue.city,
                        state: venue.state,
                        venues: vec![listing],
                    }),
                }
            }
            Ok(groups)
        })
    }

    /// Split the owner's shows into past (before `now`) and upcoming (at or
    /// after `now`).
    pub fn aggregate_shows(
        &self,
        id: i64,
        owner: ShowOwner,
        now: DateTime<Utc>,
    ) -> Result<ShowAggregate> {
        self.store
            .read(|conn| owned_shows(conn, id, owner))
            .map(|shows| ShowAggregate::partition(shows, now))
    }

    pub fn list_shows_with_details(&self) -> Result<Vec<ShowDetail>> {
        self.store.read(db::fetch_show_details)
    }

    /// Venue record together with its show aggregate.
    pub fn venue_detail(&self, id: i64, now: DateTime<Utc>) -> Result<VenueDetail> {
        self.store.read(|conn| {
            let venue = db::fetch_venue(conn, id)?;
            let shows = db::fetch_shows_for_venue(conn, id)?;
            Ok(VenueDetail {
                venue,
                shows: ShowAggregate::partition(shows, now),
            })
        })
    }

    pub fn artist_detail(&self, id: i64, now: DateTime<Utc>) -> Result<ArtistDetail> {
        self.store.read(|conn| {
            let artist = db::fetch_artist(conn, id)?;
            let shows = db::fetch_shows_for_artist(conn, id)?;
            Ok(ArtistDetail {
                artist,
                shows: ShowAggregate::partition(shows, now),
            })
        })
    }

    /// Id and name of every artist, for index pages and pickers.
    pub fn list_artists(&self) -> Result<Vec<EntitySummary>> {
        let artists = self.store.read(db::fetch_artists)?;
        Ok(artists.iter().map(EntitySummary::from).collect())
    }

    pub fn list_venues(&self) -> Result<Vec<EntitySummary>> {
        let venues = self.store.read(db::fetch_venues)?;
        Ok(venues.iter().map(EntitySummary::from).collect())
    }

    pub fn get_venue(&self, id: i64) -> Result<Venue> {
        self.store.read(|conn| db::fetch_venue(conn, id))
    }

    pub fn get_artist(&self, id: i64) -> Result<Artist> {
        self.store.read(|conn| db::fetch_artist(conn, id))
    }

    pub fn get_show(&self, id: i64) -> Result<Show> {
        self.store.read(|conn| db::fetch_show(conn, id))
    }
}

/// The owner must exist; an owner with no shows yields an empty list.
fn owned_shows(conn: &Connection, id: i64, owner: ShowOwner) -> Result<Vec<ShowDetail>> {
    match owner {
        ShowOwner::Venue => {
            db::fetch_venue(conn, id)?;
            db::fetch_shows_for_venue(conn, id)
        }
        ShowOwner::Artist => {
            db::fetch_artist(conn, id)?;
            db::fetch_shows_for_artist(conn, id)
        }
    }
}

fn filter_by_name<T>(records: Vec<T>, term: &str, name: impl Fn(&T) -> &str) -> Vec<T> {
    let needle = fold_case(term);
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| fold_case(name(record)).contains(&needle))
        .collect()
}
