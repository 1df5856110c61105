use chrono::{DateTime, Duration, TimeZone, Utc};
use showbook::models::{ArtistChanges, Genres, NewArtist, NewShow, NewVenue, ShowOwner};
use showbook::{EntityKind, ErrorKind, MutationService, QueryService, Store};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2035, 6, 15, 20, 0, 0).unwrap()
}

fn open(dir: &TempDir) -> Store {
    Store::open(&dir.path().join("data").join("showbook.sqlite")).unwrap()
}

fn musical_hop() -> NewVenue {
    NewVenue {
        name: "The Musical Hop".to_string(),
        city: Some("San Francisco".to_string()),
        state: Some("CA".to_string()),
        address: Some("1015 Folsom Street".to_string()),
        genres: Genres::new(["Jazz", "Reggae", "Swing"]),
        facebook_link: Some("https://www.facebook.com/TheMusicalHop".to_string()),
        ..NewVenue::default()
    }
}

fn guns_n_petals() -> NewArtist {
    NewArtist {
        name: "Guns N Petals".to_string(),
        city: Some("San Francisco".to_string()),
        state: Some("CA".to_string()),
        phone: Some("326-123-5000".to_string()),
        genres: Genres::new(["Rock n Roll"]),
        ..NewArtist::default()
    }
}

/// Venue 1, artist 1 and one show at `t0()` between them.
fn booked(store: &Store) {
    let mutations = MutationService::new(store);
    assert_eq!(mutations.create_venue(musical_hop()).id(), Some(1));
    assert_eq!(mutations.create_artist(guns_n_petals()).id(), Some(1));
    let outcome = mutations.create_show(NewShow {
        start_time: t0(),
        artist_id: 1,
        venue_id: 1,
    });
    assert!(outcome.is_success(), "{}", outcome.message());
}

#[test]
fn created_venue_is_found_by_name() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let outcome = MutationService::new(&store).create_venue(musical_hop());
    assert_eq!(outcome.id(), Some(1));

    let results = QueryService::new(&store)
        .search(EntityKind::Venue, "Hop")
        .unwrap();
    assert_eq!(results.count, 1);
    assert_eq!(results.data[0].name, "The Musical Hop");
}

#[test]
fn show_is_past_or_upcoming_relative_to_now() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);
    let queries = QueryService::new(&store);

    let later = queries
        .aggregate_shows(1, ShowOwner::Venue, t0() + Duration::days(1))
        .unwrap();
    assert_eq!((later.past_count, later.upcoming_count), (1, 0));

    let earlier = queries
        .aggregate_shows(1, ShowOwner::Venue, t0() - Duration::days(1))
        .unwrap();
    assert_eq!((earlier.past_count, earlier.upcoming_count), (0, 1));

    let exact = queries.aggregate_shows(1, ShowOwner::Artist, t0()).unwrap();
    assert_eq!(exact.upcoming_count, 1);
}

#[test]
fn venue_with_shows_cannot_be_deleted() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);

    let outcome = MutationService::new(&store).delete_venue(1);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Integrity));

    let venue = QueryService::new(&store).get_venue(1).unwrap();
    assert_eq!(venue.name, "The Musical Hop");
}

#[test]
fn phone_update_leaves_other_fields_alone() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);
    let before = QueryService::new(&store).get_artist(1).unwrap();

    let outcome = MutationService::new(&store).update_artist(
        1,
        ArtistChanges {
            phone: Some(Some("555-0000".to_string())),
            ..ArtistChanges::default()
        },
    );
    assert!(outcome.is_success());

    let after = QueryService::new(&store).get_artist(1).unwrap();
    assert_eq!(after.phone.as_deref(), Some("555-0000"));
    assert_eq!(after.name, before.name);
    assert_eq!(after.city, before.city);
    assert_eq!(after.state, before.state);
    assert_eq!(after.genres, before.genres);
    assert_eq!(after.facebook_link, before.facebook_link);
}

#[test]
fn records_survive_reopening_the_file() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        booked(&store);
    }

    let store = open(&dir);
    let shows = QueryService::new(&store).list_shows_with_details().unwrap();
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].venue_name, "The Musical Hop");
    assert_eq!(shows[0].artist_name, "Guns N Petals");
    assert_eq!(shows[0].start_time, t0());

    let venue = QueryService::new(&store).get_venue(1).unwrap();
    assert_eq!(venue.genres.tags(), ["Jazz", "Reggae", "Swing"]);
}

#[test]
fn show_for_unknown_artist_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    MutationService::new(&store).create_venue(musical_hop());

    let outcome = MutationService::new(&store).create_show(NewShow {
        start_time: t0(),
        artist_id: 42,
        venue_id: 1,
    });
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Integrity));
    assert_eq!(outcome.message(), "Artist 42 does not exist.");
}

#[test]
fn deleting_shows_first_unblocks_venue_delete() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);
    let mutations = MutationService::new(&store);

    assert!(mutations.delete_show(1).is_success());
    let outcome = mutations.delete_venue(1);
    assert!(outcome.is_success());
    assert_eq!(
        outcome.message(),
        "Venue The Musical Hop was successfully deleted!"
    );

    let err = QueryService::new(&store).get_venue(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn grouped_listing_counts_upcoming_shows() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);

    let groups = QueryService::new(&store)
        .list_grouped_by_location(t0() - Duration::hours(1))
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label(), "San Francisco, CA");
    assert_eq!(groups[0].venues[0].num_upcoming_shows, 1);
}

#[test]
fn index_listings_follow_insertion_order() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    booked(&store);
    let mutations = MutationService::new(&store);
    mutations.create_artist(NewArtist {
        name: "Matt Quevedo".to_string(),
        ..NewArtist::default()
    });

    let queries = QueryService::new(&store);
    let names: Vec<_> = queries
        .list_artists()
        .unwrap()
        .into_iter()
        .map(|summary| summary.name)
        .collect();
    assert_eq!(names, ["Guns N Petals", "Matt Quevedo"]);
    assert_eq!(queries.list_venues().unwrap().len(), 1);
}
