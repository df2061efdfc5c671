pub mod clear;
pub mod status;
pub mod sync;

use std::sync::Arc;

use anyhow::{Context, Result};
use lectio_core::{JsonScheduleSource, SyncConfig, Synchronizer};
use lectio_google::GoogleCalendarStore;

/// Wires the schedule file and the Google calendar into a synchronizer.
async fn connect(config: SyncConfig) -> Result<Synchronizer> {
    let source = JsonScheduleSource::new(config.schedule_path());

    let store = GoogleCalendarStore::connect(
        &config.session_path(),
        &config.credentials_path(),
        &config.calendar_id,
        &config.timezone,
    )
    .await
    .context("Failed to connect to Google Calendar")?;

    Ok(Synchronizer::new(Arc::new(source), Arc::new(store), config))
}
