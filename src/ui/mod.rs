//! Ratatui front-end: a tabbed directory of venues, artists, and shows, with
//! detail pages and popup forms layered on top.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
