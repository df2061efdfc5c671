use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use lectio_core::SyncConfig;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use super::connect;
use crate::render::render_plan;
use crate::utils::tui::create_spinner;

pub async fn run(config: SyncConfig, all: bool, cancel: &CancellationToken) -> Result<ExitCode> {
    let calendar_id = config.calendar_id.clone();
    let weeks = config.weeks;
    let synchronizer = connect(config).await?;
    let range = synchronizer.window(Utc::now())?;

    let spinner = create_spinner(format!("Comparing schedule with {calendar_id}"));
    let result = synchronizer.plan(&range, cancel).await;
    spinner.finish_and_clear();

    let plan = result?;

    println!(
        "📅 {} {}",
        calendar_id.bold(),
        format!("({weeks} {})", if weeks == 1 { "week" } else { "weeks" }).dimmed()
    );
    println!("{}", render_plan(&plan, all));

    Ok(ExitCode::SUCCESS)
}
