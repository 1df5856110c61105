use chrono::{DateTime, Local, Utc};

use crate::db::Store;
use crate::error::{EntityKind, Result};
use crate::models::{ArtistDetail, ShowAggregate, ShowDetail, VenueDetail};
use crate::query::QueryService;

/// Tabs of the directory screen, in display order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Tab {
    Venues,
    Artists,
    Shows,
}

impl Tab {
    pub(crate) const ALL: [Tab; 3] = [Tab::Venues, Tab::Artists, Tab::Shows];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Venues => "Venues",
            Tab::Artists => "Artists",
            Tab::Shows => "Shows",
        }
    }

    pub(crate) fn kind(self) -> EntityKind {
        match self {
            Tab::Venues => EntityKind::Venue,
            Tab::Artists => EntityKind::Artist,
            Tab::Shows => EntityKind::Show,
        }
    }

    fn offset(self, delta: isize) -> Tab {
        let idx = Tab::ALL.iter().position(|t| *t == self).unwrap_or(0) as isize;
        let len = Tab::ALL.len() as isize;
        Tab::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

/// A record a row or detail view points at.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Target {
    Venue(i64),
    Artist(i64),
    Show { id: i64, venue_id: i64 },
}

impl Target {
    /// Same record, ignoring the venue a show row carries along.
    pub(crate) fn same_record(self, other: Target) -> bool {
        match (self, other) {
            (Target::Show { id: a, .. }, Target::Show { id: b, .. }) => a == b,
            (a, b) => a == b,
        }
    }
}

/// One line of the directory list. Rows without a target are group headers
/// and cannot be selected.
#[derive(Clone, Debug)]
pub(crate) struct DirectoryRow {
    pub(crate) target: Option<Target>,
    pub(crate) label: String,
    pub(crate) hint: String,
}

impl DirectoryRow {
    fn header(label: String) -> Self {
        Self {
            target: None,
            label,
            hint: String::new(),
        }
    }

    fn item(target: Target, label: String, hint: String) -> Self {
        Self {
            target: Some(target),
            label,
            hint,
        }
    }
}

/// Tabbed listing of venues (grouped by location), artists, and shows.
pub(crate) struct DirectoryScreen {
    pub(crate) tab: Tab,
    pub(crate) rows: Vec<DirectoryRow>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl DirectoryScreen {
    pub(crate) fn new() -> Self {
        Self {
            tab: Tab::Venues,
            rows: Vec::new(),
            filter: None,
            selected: 0,
        }
    }

    /// Rebuild rows for the active tab and filter.
    pub(crate) fn reload(&mut self, store: &Store, now: DateTime<Utc>) -> Result<()> {
        let queries = QueryService::new(store);
        let term = self.filter.as_deref().unwrap_or("").trim().to_string();

        self.rows = match self.tab {
            Tab::Venues if term.is_empty() => {
                let mut rows = Vec::new();
                for group in queries.list_grouped_by_location(now)? {
                    rows.push(DirectoryRow::header(group.label()));
                    for venue in group.venues {
                        rows.push(DirectoryRow::item(
                            Target::Venue(venue.id),
                            venue.name,
                            upcoming_hint(venue.num_upcoming_shows),
                        ));
                    }
                }
                rows
            }
            Tab::Venues | Tab::Artists => {
                let results = queries.search(self.tab.kind(), &term)?;
                let mut rows = vec![DirectoryRow::header(format!(
                    "{} result(s) for \"{term}\"",
                    results.count
                ))];
                rows.extend(results.data.into_iter().map(|summary| {
                    let target = match self.tab {
                        Tab::Venues => Target::Venue(summary.id),
                        _ => Target::Artist(summary.id),
                    };
                    DirectoryRow::item(target, summary.name, String::new())
                }));
                rows
            }
            Tab::Shows => {
                let needle = term.to_lowercase();
                queries
                    .list_shows_with_details()?
                    .into_iter()
                    .filter(|show| {
                        needle.is_empty()
                            || show.venue_name.to_lowercase().contains(&needle)
                            || show.artist_name.to_lowercase().contains(&needle)
                    })
                    .map(|show| show_row(&show, now))
                    .collect()
            }
        };
        self.ensure_in_bounds();
        Ok(())
    }

    pub(crate) fn switch_tab(&mut self, delta: isize) {
        self.tab = self.tab.offset(delta);
        self.filter = None;
        self.selected = 0;
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.selected = 0;
    }

    pub(crate) fn current(&self) -> Option<Target> {
        self.rows.get(self.selected).and_then(|row| row.target)
    }

    /// Move over selectable rows only; headers are skipped.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        let selectable = self.selectable();
        if selectable.is_empty() {
            return;
        }
        let pos = selectable
            .iter()
            .position(|idx| *idx == self.selected)
            .unwrap_or(0) as isize;
        let last = selectable.len() as isize - 1;
        let new = (pos + offset).clamp(0, last);
        self.selected = selectable[new as usize];
    }

    pub(crate) fn select_first(&mut self) {
        if let Some(first) = self.selectable().first() {
            self.selected = *first;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if let Some(last) = self.selectable().last() {
            self.selected = *last;
        }
    }

    /// Point the selection at `target` if it is listed.
    pub(crate) fn focus(&mut self, target: Target) {
        if let Some(idx) = self
            .rows
            .iter()
            .position(|row| row.target.is_some_and(|t| t.same_record(target)))
        {
            self.selected = idx;
        }
    }

    fn selectable(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.target.is_some())
            .map(|(idx, _)| idx)
            .collect()
    }

    fn ensure_in_bounds(&mut self) {
        let selectable = self.selectable();
        if selectable.contains(&self.selected) {
            return;
        }
        self.selected = selectable
            .iter()
            .copied()
            .find(|idx| *idx > self.selected)
            .or_else(|| selectable.last().copied())
            .unwrap_or(0);
    }
}

/// Venue or artist page: the record's fields plus its past and upcoming
/// shows.
pub(crate) struct DetailScreen {
    pub(crate) target: Target,
    pub(crate) title: String,
    pub(crate) facts: Vec<(&'static str, String)>,
    pub(crate) facebook_link: Option<String>,
    pub(crate) shows: ShowAggregate,
    pub(crate) scroll: u16,
}

impl DetailScreen {
    pub(crate) fn from_venue(detail: VenueDetail) -> Self {
        let venue = detail.venue;
        let facts = vec![
            ("Genres", venue.genres.to_string()),
            ("Address", venue.address.unwrap_or_default()),
            ("City", venue.city.unwrap_or_default()),
            ("State", venue.state.unwrap_or_default()),
            ("Phone", venue.phone.unwrap_or_default()),
        ];
        Self {
            target: Target::Venue(venue.id),
            title: venue.name,
            facts,
            facebook_link: venue.facebook_link,
            shows: detail.shows,
            scroll: 0,
        }
    }

    pub(crate) fn from_artist(detail: ArtistDetail) -> Self {
        let artist = detail.artist;
        let facts = vec![
            ("Genres", artist.genres.to_string()),
            ("City", artist.city.unwrap_or_default()),
            ("State", artist.state.unwrap_or_default()),
            ("Phone", artist.phone.unwrap_or_default()),
        ];
        Self {
            target: Target::Artist(artist.id),
            title: artist.name,
            facts,
            facebook_link: artist.facebook_link,
            shows: detail.shows,
            scroll: 0,
        }
    }

    /// Who the other side of each show is: artists on a venue page, venues
    /// on an artist page.
    pub(crate) fn counterpart<'s>(&self, show: &'s ShowDetail) -> &'s str {
        match self.target {
            Target::Venue(_) => &show.artist_name,
            _ => &show.venue_name,
        }
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).max(0);
        self.scroll = next.min(u16::MAX as i32) as u16;
    }
}

fn upcoming_hint(count: usize) -> String {
    match count {
        0 => "no upcoming shows".to_string(),
        1 => "1 upcoming show".to_string(),
        n => format!("{n} upcoming shows"),
    }
}

fn show_row(show: &ShowDetail, now: DateTime<Utc>) -> DirectoryRow {
    let when = if show.start_time < now { "past" } else { "upcoming" };
    DirectoryRow::item(
        Target::Show {
            id: show.show_id,
            venue_id: show.venue_id,
        },
        format!("{} @ {}", show.artist_name, show.venue_name),
        format!("{}  ({when})", format_start(show.start_time)),
    )
}

/// Local wall-clock rendering of a show's start.
pub(crate) fn format_start(start: DateTime<Utc>) -> String {
    start
        .with_timezone(&Local)
        .format("%a %b %d, %Y %H:%M")
        .to_string()
}
