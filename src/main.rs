mod commands;
mod render;
mod utils;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lectio_core::SyncConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lectio-sync")]
#[command(about = "Sync your Lectio schedule into Google Calendar")]
struct Cli {
    /// Config file (defaults to ~/.config/lectio-sync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the calendar in line with the schedule
    Sync {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Show what a sync would change, without writing
    Status {
        #[command(flatten)]
        overrides: Overrides,

        /// List every event even when there are many
        #[arg(long)]
        all: bool,
    },
    /// Remove every event this tool has created
    Clear {
        /// Calendar to clear
        #[arg(long)]
        calendar_id: Option<String>,
    },
}

/// Flags that take precedence over the config file and environment.
#[derive(Args)]
struct Overrides {
    /// Number of weeks to sync, starting from this week's Monday
    #[arg(short, long)]
    weeks: Option<u32>,

    /// Google calendar to sync into
    #[arg(long)]
    calendar_id: Option<String>,

    /// Schedule file exported from Lectio
    #[arg(long)]
    schedule: Option<PathBuf>,

    /// Parallel calendar writes
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut SyncConfig) {
        if let Some(weeks) = self.weeks {
            config.weeks = weeks;
        }
        if let Some(calendar_id) = &self.calendar_id {
            config.calendar_id = calendar_id.clone();
        }
        if let Some(schedule) = &self.schedule {
            config.schedule_path = schedule.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(cli.config.as_deref(), &cli.command)?;
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Commands::Sync { .. } => commands::sync::run(config, &cancel).await,
        Commands::Status { all, .. } => commands::status::run(config, all, &cancel).await,
        Commands::Clear { .. } => commands::clear::run(config, &cancel).await,
    }
}

/// File and environment first, then the command's flags. Validated last.
fn resolve_config(path: Option<&Path>, command: &Commands) -> Result<SyncConfig> {
    let mut config = load_config(path)?;

    match command {
        Commands::Sync { overrides } | Commands::Status { overrides, .. } => {
            overrides.apply(&mut config)
        }
        Commands::Clear { calendar_id } => {
            if let Some(calendar_id) = calendar_id {
                config.calendar_id = calendar_id.clone();
            }
        }
    }

    config.validate()?;
    debug!(calendar_id = %config.calendar_id, weeks = config.weeks, "Resolved config");
    Ok(config)
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => SyncConfig::load().context("Failed to load config"),
    }
}

/// Logs go to stderr so stdout only carries the report.
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A token that fires on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending calendar writes");
            token.cancel();
        }
    });

    cancel
}
