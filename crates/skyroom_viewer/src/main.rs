//! Walk around a procedurally built room lit by an HDR sky.
//!
//! Usage: `skyroom [config.toml]` (defaults to `skyroom.toml`).

mod config;
mod viewer;

use std::path::PathBuf;

use skyroom_app::{config::load_toml_or_default, logging, App};

use crate::config::ViewerConfig;
use crate::viewer::Viewer;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("skyroom.toml"));
    let config: ViewerConfig = load_toml_or_default(&path)?;
    logging::init(&config.app.log)?;
    log::info!("Starting with configuration from {}", path.display());

    App::new(Viewer::new(config.scene))
        .with_config(config.app)
        .run()
}
