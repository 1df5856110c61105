use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use super::screens::Target;
use crate::models::{
    Artist, ArtistChanges, Genres, NewArtist, NewShow, NewVenue, Show, ShowChanges, Venue,
    VenueChanges,
};

/// Accepted start-time layout, read as local wall-clock time.
pub(crate) const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// What submitting the form will do.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum FormTarget {
    NewVenue,
    EditVenue(i64),
    NewArtist,
    EditArtist(i64),
    NewShow,
    EditShow(i64),
}

impl FormTarget {
    pub(crate) fn title(self) -> &'static str {
        match self {
            FormTarget::NewVenue => "List a Venue",
            FormTarget::EditVenue(_) => "Edit Venue",
            FormTarget::NewArtist => "List an Artist",
            FormTarget::EditArtist(_) => "Edit Artist",
            FormTarget::NewShow => "List a Show",
            FormTarget::EditShow(_) => "Edit Show",
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) required: bool,
}

impl FormField {
    fn new(label: &'static str, value: Option<&str>, required: bool) -> Self {
        Self {
            label,
            value: value.unwrap_or_default().to_string(),
            required,
        }
    }
}

/// Text-entry state for creating or editing one record. Values stay raw
/// strings until submit; the store does the real validation.
#[derive(Clone, Debug)]
pub(crate) struct EntityForm {
    pub(crate) target: FormTarget,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl EntityForm {
    fn with_fields(target: FormTarget, fields: Vec<FormField>) -> Self {
        Self {
            target,
            fields,
            active: 0,
            error: None,
        }
    }

    pub(crate) fn new_venue() -> Self {
        Self::venue_fields(FormTarget::NewVenue, None)
    }

    pub(crate) fn edit_venue(venue: &Venue) -> Self {
        Self::venue_fields(FormTarget::EditVenue(venue.id), Some(venue))
    }

    fn venue_fields(target: FormTarget, venue: Option<&Venue>) -> Self {
        let genres = venue.map(|v| v.genres.encode());
        Self::with_fields(
            target,
            vec![
                FormField::new("Name", venue.map(|v| v.name.as_str()), true),
                FormField::new("City", venue.and_then(|v| v.city.as_deref()), false),
                FormField::new("State", venue.and_then(|v| v.state.as_deref()), false),
                FormField::new("Address", venue.and_then(|v| v.address.as_deref()), false),
                FormField::new("Phone", venue.and_then(|v| v.phone.as_deref()), false),
                FormField::new("Genres", genres.as_deref(), false),
                FormField::new(
                    "Facebook link",
                    venue.and_then(|v| v.facebook_link.as_deref()),
                    false,
                ),
            ],
        )
    }

    pub(crate) fn new_artist() -> Self {
        Self::artist_fields(FormTarget::NewArtist, None)
    }

    pub(crate) fn edit_artist(artist: &Artist) -> Self {
        Self::artist_fields(FormTarget::EditArtist(artist.id), Some(artist))
    }

    fn artist_fields(target: FormTarget, artist: Option<&Artist>) -> Self {
        let genres = artist.map(|a| a.genres.encode());
        Self::with_fields(
            target,
            vec![
                FormField::new("Name", artist.map(|a| a.name.as_str()), true),
                FormField::new("City", artist.and_then(|a| a.city.as_deref()), false),
                FormField::new("State", artist.and_then(|a| a.state.as_deref()), false),
                FormField::new("Phone", artist.and_then(|a| a.phone.as_deref()), false),
                FormField::new("Genres", genres.as_deref(), false),
                FormField::new(
                    "Facebook link",
                    artist.and_then(|a| a.facebook_link.as_deref()),
                    false,
                ),
            ],
        )
    }

    /// New show form, optionally pre-filled with the artist or venue whose
    /// page it was opened from.
    pub(crate) fn new_show(artist_id: Option<i64>, venue_id: Option<i64>) -> Self {
        let artist = artist_id.map(|id| id.to_string());
        let venue = venue_id.map(|id| id.to_string());
        Self::with_fields(
            FormTarget::NewShow,
            vec![
                FormField::new("Artist ID", artist.as_deref(), true),
                FormField::new("Venue ID", venue.as_deref(), true),
                FormField::new("Start time", None, true),
            ],
        )
    }

    pub(crate) fn edit_show(show: &Show) -> Self {
        let artist = show.artist_id.to_string();
        let venue = show.venue_id.to_string();
        let start = show
            .start_time
            .with_timezone(&Local)
            .format(START_TIME_FORMAT)
            .to_string();
        Self::with_fields(
            FormTarget::EditShow(show.id),
            vec![
                FormField::new("Artist ID", Some(&artist), true),
                FormField::new("Venue ID", Some(&venue), true),
                FormField::new("Start time", Some(&start), true),
            ],
        )
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn prev_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field, refusing control characters.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
    }

    fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
            .unwrap_or_default()
    }

    fn optional(&self, label: &str) -> Option<String> {
        let value = self.value(label).trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn genres(&self) -> Genres {
        Genres::decode(self.value("Genres"))
    }

    pub(crate) fn to_new_venue(&self) -> NewVenue {
        NewVenue {
            name: self.value("Name").to_string(),
            city: self.optional("City"),
            state: self.optional("State"),
            address: self.optional("Address"),
            phone: self.optional("Phone"),
            facebook_link: self.optional("Facebook link"),
            genres: self.genres(),
        }
    }

    /// Edits overwrite every field shown in the form.
    pub(crate) fn to_venue_changes(&self) -> VenueChanges {
        VenueChanges {
            name: Some(self.value("Name").to_string()),
            city: Some(self.optional("City")),
            state: Some(self.optional("State")),
            address: Some(self.optional("Address")),
            phone: Some(self.optional("Phone")),
            facebook_link: Some(self.optional("Facebook link")),
            genres: Some(self.genres()),
        }
    }

    pub(crate) fn to_new_artist(&self) -> NewArtist {
        NewArtist {
            name: self.value("Name").to_string(),
            city: self.optional("City"),
            state: self.optional("State"),
            phone: self.optional("Phone"),
            genres: self.genres(),
            facebook_link: self.optional("Facebook link"),
        }
    }

    pub(crate) fn to_artist_changes(&self) -> ArtistChanges {
        ArtistChanges {
            name: Some(self.value("Name").to_string()),
            city: Some(self.optional("City")),
            state: Some(self.optional("State")),
            phone: Some(self.optional("Phone")),
            genres: Some(self.genres()),
            facebook_link: Some(self.optional("Facebook link")),
        }
    }

    /// Parse the show fields. Ids must be integers and the start time must
    /// match [`START_TIME_FORMAT`].
    pub(crate) fn to_new_show(&self) -> Result<NewShow> {
        Ok(NewShow {
            artist_id: parse_id(self.value("Artist ID"), "Artist ID")?,
            venue_id: parse_id(self.value("Venue ID"), "Venue ID")?,
            start_time: parse_start(self.value("Start time"))?,
        })
    }

    pub(crate) fn to_show_changes(&self) -> Result<ShowChanges> {
        let show = self.to_new_show()?;
        Ok(ShowChanges {
            start_time: Some(show.start_time),
            artist_id: Some(show.artist_id),
            venue_id: Some(show.venue_id),
        })
    }

    /// Record a successful submit should select, given the id it produced.
    pub(crate) fn saved_target(&self, id: i64) -> Target {
        match self.target {
            FormTarget::NewVenue | FormTarget::EditVenue(_) => Target::Venue(id),
            FormTarget::NewArtist | FormTarget::EditArtist(_) => Target::Artist(id),
            FormTarget::NewShow | FormTarget::EditShow(_) => Target::Show {
                id,
                venue_id: parse_id(self.value("Venue ID"), "Venue ID").unwrap_or_default(),
            },
        }
    }

    /// Render one field line, highlighting the focused field.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                String::new()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Column where the cursor sits on the active line.
    pub(crate) fn cursor_offset(&self) -> usize {
        let field = &self.fields[self.active];
        field.label.chars().count() + 2 + field.value.chars().count()
    }
}

fn parse_id(raw: &str, label: &str) -> Result<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("{label} is required."));
    }
    raw.parse::<i64>()
        .map_err(|_| anyhow!("{label} must be a number."))
}

fn parse_start(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("Start time is required."));
    }
    let naive = NaiveDateTime::parse_from_str(raw, START_TIME_FORMAT)
        .map_err(|_| anyhow!("Start time must look like YYYY-MM-DD HH:MM."))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Start time {raw} does not exist in the local time zone."))
}

/// Pending delete awaiting confirmation.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) target: Target,
    pub(crate) label: String,
}
