use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use lectio_core::SyncConfig;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use super::connect;
use crate::render::render_report;
use crate::utils::tui::create_spinner;

pub async fn run(config: SyncConfig, cancel: &CancellationToken) -> Result<ExitCode> {
    let calendar_id = config.calendar_id.clone();
    let synchronizer = connect(config).await?;

    let spinner = create_spinner(format!("Syncing into {calendar_id}"));
    let result = synchronizer.run(Utc::now(), cancel).await;
    spinner.finish_and_clear();

    let report = result?;

    println!("📅 {}", calendar_id.bold());
    println!("{}", render_report(&report));

    if report.result.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
