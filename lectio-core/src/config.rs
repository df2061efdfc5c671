//! Sync configuration at ~/.config/lectio-sync/config.toml
//!
//! Values are layered: built-in defaults, then the config file, then
//! `LECTIO_SYNC_*` environment variables. The CLI applies its flags last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::executor::ExecutorOptions;
use crate::namespace::{self, Namespace};

const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_WEEKS: u32 = 2;
const DEFAULT_TIMEZONE: &str = "Europe/Copenhagen";
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCHEDULE_PATH: &str = "~/.local/share/lectio-sync/modules.json";
const DEFAULT_SESSION_PATH: &str = "~/.config/lectio-sync/session.toml";
const DEFAULT_CREDENTIALS_PATH: &str = "~/.config/lectio-sync/credentials.toml";

const ENV_PREFIX: &str = "LECTIO_SYNC";

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_weeks() -> u32 {
    DEFAULT_WEEKS
}

fn default_namespace_tag() -> String {
    namespace::DEFAULT_TAG.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

fn default_schedule_path() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEDULE_PATH)
}

fn default_session_path() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_PATH)
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_PATH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Google calendar to write into.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Number of weeks to sync, starting from the most recent Monday.
    #[serde(default = "default_weeks")]
    pub weeks: u32,

    /// Prefix marking the events this tool owns.
    #[serde(default = "default_namespace_tag")]
    pub namespace_tag: String,

    /// IANA zone the week boundaries are computed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    #[serde(default = "default_schedule_path")]
    pub schedule_path: PathBuf,

    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,

    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            calendar_id: default_calendar_id(),
            weeks: default_weeks(),
            namespace_tag: default_namespace_tag(),
            timezone: default_timezone(),
            concurrency: default_concurrency(),
            operation_timeout_secs: default_operation_timeout_secs(),
            schedule_path: default_schedule_path(),
            session_path: default_session_path(),
            credentials_path: default_credentials_path(),
        }
    }
}

impl SyncConfig {
    pub fn config_dir() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("lectio-sync");

        Ok(config_dir)
    }

    pub fn config_path() -> SyncResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, creating a commented default file on first use.
    pub fn load() -> SyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (which may be missing) overlaid with the environment.
    ///
    /// Not validated here: callers apply their own overrides, then call
    /// [`SyncConfig::validate`].
    pub fn load_from(path: &Path) -> SyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.weeks == 0 {
            return Err(SyncError::Config("weeks must be at least 1".into()));
        }

        if !namespace::is_valid_tag(&self.namespace_tag) {
            return Err(SyncError::Config(format!(
                "namespace_tag '{}' must be non-empty and use only 0-9 and a-v",
                self.namespace_tag
            )));
        }

        if self.calendar_id.trim().is_empty() {
            return Err(SyncError::Config("calendar_id must not be empty".into()));
        }

        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> SyncResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| SyncError::Config(format!("Unknown time zone '{}'", self.timezone)))
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.namespace_tag)
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            concurrency: self.concurrency.max(1),
            operation_timeout: Duration::from_secs(self.operation_timeout_secs),
        }
    }

    pub fn schedule_path(&self) -> PathBuf {
        expand(&self.schedule_path)
    }

    pub fn session_path(&self) -> PathBuf {
        expand(&self.session_path)
    }

    pub fn credentials_path(&self) -> PathBuf {
        expand(&self.credentials_path)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SyncResult<()> {
        let contents = format!(
            "\
# lectio-sync configuration

# Google calendar to sync into:
# calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# Weeks to sync, starting from this week's Monday:
# weeks = {DEFAULT_WEEKS}

# Prefix of every event id this tool manages.
# Changing it orphans events created under the old prefix.
# namespace_tag = \"{tag}\"

# timezone = \"{DEFAULT_TIMEZONE}\"

# Parallel calendar writes, and the time limit for each:
# concurrency = {DEFAULT_CONCURRENCY}
# operation_timeout_secs = {DEFAULT_OPERATION_TIMEOUT_SECS}

# schedule_path = \"{DEFAULT_SCHEDULE_PATH}\"
# session_path = \"{DEFAULT_SESSION_PATH}\"
# credentials_path = \"{DEFAULT_CREDENTIALS_PATH}\"
",
            tag = namespace::DEFAULT_TAG,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
