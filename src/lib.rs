//! Booking directory for live music: venues, artists, and the shows that
//! connect them, kept in an embedded SQLite file.
//!
//! [`QueryService`] answers read-only questions, [`MutationService`] performs
//! transactional writes and reports a [`MutationOutcome`]. Both borrow a
//! [`Store`]. The `ui` module drives them from a terminal front-end.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod query;
pub mod ui;

pub use config::Config;
pub use db::Store;
pub use error::{EntityKind, ErrorKind, StoreError};
pub use logging::init_logging;
pub use mutation::{MutationOutcome, MutationService};
pub use query::QueryService;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
