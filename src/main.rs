use std::time::Duration;

use anyhow::{Context, Result};
use skylook_core::{AppError, Config};
use skylook_ui::tui::{self, TuiApp};
use skylook_ui::AppServices;

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    skylook_core::init_logging(Some(&config.storage.log_path()))?;
    if let Err(e) = config.check() {
        let error = AppError::from(e);
        tracing::error!("{}", error);
        eprintln!("{}", error.user_message());
        return Err(error.into());
    }

    let services = AppServices::new(&config)?;
    let mut app = TuiApp::new(services.build_model());

    tracing::info!("Skylook started");
    tui::run_ui(
        &mut app,
        &services,
        Duration::from_millis(config.ui.tick_rate_ms),
    )?;
    tracing::info!("Skylook stopped");

    Ok(())
}
