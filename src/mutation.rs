//! Transactional writes. Each call runs in its own transaction and reports a
//! [`MutationOutcome`] instead of an error: expected failures (bad input,
//! missing ids, blocked deletes) are ordinary results for the caller to show.

use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::db::{self, Store};
use crate::error::{EntityKind, ErrorKind, Result, StoreError};
use crate::models::{ArtistChanges, NewArtist, NewShow, NewVenue, ShowChanges, VenueChanges};

/// Tagged result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Success { id: i64, message: String },
    Failure { kind: ErrorKind, message: String },
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MutationOutcome::Success { .. })
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            MutationOutcome::Success { id, .. } => Some(*id),
            MutationOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            MutationOutcome::Success { .. } => None,
            MutationOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            MutationOutcome::Success { message, .. } | MutationOutcome::Failure { message, .. } => {
                message
            }
        }
    }
}

/// What a mutation was attempting, used to phrase its outcome.
#[derive(Clone, Copy)]
enum Action {
    List,
    Update,
    Delete,
}

impl Action {
    fn done(self) -> &'static str {
        match self {
            Action::List => "listed",
            Action::Update => "updated",
            Action::Delete => "deleted",
        }
    }
}

pub struct MutationService<'a> {
    store: &'a Store,
}

/// Id of the record a mutation touched plus the name to report it by.
struct Applied {
    id: i64,
    subject: String,
}

impl Applied {
    fn new(id: i64, subject: String) -> Self {
        Self { id, subject }
    }
}

impl<'a> MutationService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn create_venue(&self, new: NewVenue) -> MutationOutcome {
        let subject = format!("Venue {}", new.name.trim());
        self.run(EntityKind::Venue, Action::List, subject, |conn| {
            let venue = db::create_venue(conn, new)?;
            Ok(Applied::new(venue.id, format!("Venue {}", venue.name)))
        })
    }

    pub fn update_venue(&self, id: i64, changes: VenueChanges) -> MutationOutcome {
        self.run(EntityKind::Venue, Action::Update, format!("Venue {id}"), |conn| {
            let venue = db::update_venue(conn, id, changes)?;
            Ok(Applied::new(venue.id, format!("Venue {}", venue.name)))
        })
    }

    /// Venues that still host shows are refused; nothing is cascaded.
    pub fn delete_venue(&self, id: i64) -> MutationOutcome {
        self.run(EntityKind::Venue, Action::Delete, format!("Venue {id}"), |conn| {
            let venue = db::delete_venue(conn, id)?;
            Ok(Applied::new(venue.id, format!("Venue {}", venue.name)))
        })
    }

    pub fn create_artist(&self, new: NewArtist) -> MutationOutcome {
        let subject = format!("Artist {}", new.name.trim());
        self.run(EntityKind::Artist, Action::List, subject, |conn| {
            let artist = db::create_artist(conn, new)?;
            Ok(Applied::new(artist.id, format!("Artist {}", artist.name)))
        })
    }

    pub fn update_artist(&self, id: i64, changes: ArtistChanges) -> MutationOutcome {
        self.run(EntityKind::Artist, Action::Update, format!("Artist {id}"), |conn| {
            let artist = db::update_artist(conn, id, changes)?;
            Ok(Applied::new(artist.id, format!("Artist {}", artist.name)))
        })
    }

    pub fn delete_artist(&self, id: i64) -> MutationOutcome {
        self.run(EntityKind::Artist, Action::Delete, format!("Artist {id}"), |conn| {
            let artist = db::delete_artist(conn, id)?;
            Ok(Applied::new(artist.id, format!("Artist {}", artist.name)))
        })
    }

    pub fn create_show(&self, new: NewShow) -> MutationOutcome {
        self.run(EntityKind::Show, Action::List, "Show".to_string(), |conn| {
            let show = db::create_show(conn, new)?;
            Ok(Applied::new(show.id, "Show".to_string()))
        })
    }

    pub fn update_show(&self, id: i64, changes: ShowChanges) -> MutationOutcome {
        self.run(EntityKind::Show, Action::Update, format!("Show {id}"), |conn| {
            let show = db::update_show(conn, id, changes)?;
            Ok(Applied::new(show.id, format!("Show {}", show.id)))
        })
    }

    pub fn delete_show(&self, id: i64) -> MutationOutcome {
        self.run(EntityKind::Show, Action::Delete, format!("Show {id}"), |conn| {
            let show = db::delete_show(conn, id)?;
            Ok(Applied::new(show.id, format!("Show {}", show.id)))
        })
    }

    /// Book several shows at once. Either every show is created or none is;
    /// the success id is the last show created.
    pub fn book_shows(&self, shows: Vec<NewShow>) -> MutationOutcome {
        let subject = format!("{} show(s)", shows.len());
        self.run(EntityKind::Show, Action::List, subject.clone(), |conn| {
            if shows.is_empty() {
                return Err(StoreError::validation("No shows to book."));
            }
            let mut last = 0;
            for new in shows {
                last = db::create_show(conn, new)?.id;
            }
            Ok(Applied::new(last, subject))
        })
    }

    /// Run `op` in one transaction and turn its result into an outcome. Each
    /// error kind is reported as itself; `fallback` names the record when the
    /// operation never got far enough to load it.
    fn run(
        &self,
        kind: EntityKind,
        action: Action,
        fallback: String,
        op: impl FnOnce(&Connection) -> Result<Applied>,
    ) -> MutationOutcome {
        match self.store.write(op) {
            Ok(applied) => {
                info!(entity = %kind, id = applied.id, action = action.done(), "mutation committed");
                MutationOutcome::Success {
                    id: applied.id,
                    message: format!("{} was successfully {}!", applied.subject, action.done()),
                }
            }
            Err(err) => {
                let error_kind = err.kind();
                let message = match &err {
                    StoreError::Transient(source) => {
                        error!(entity = %kind, error = %source, "mutation failed");
                        format!("An error occurred. {fallback} could not be {}.", action.done())
                    }
                    other => {
                        warn!(entity = %kind, error_kind = ?error_kind, reason = %other, "mutation rejected");
                        other.to_string()
                    }
                };
                MutationOutcome::Failure {
                    kind: error_kind,
                    message,
                }
            }
        }
    }
}
