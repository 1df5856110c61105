//! Binary entry point: resolve settings, start logging, open the store, and
//! drive the Ratatui event loop until the user exits.
use showbook::{init_logging, run_app, App, Config, Store};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = init_logging(&config)?;
    info!(db = %config.db_path.display(), "starting showbook");

    let store = Store::open(&config.db_path)?;
    let mut app = App::new(store)?;
    run_app(&mut app)
}
