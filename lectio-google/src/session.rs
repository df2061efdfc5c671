//! Google OAuth session stored in a TOML token file.
//!
//! The session is created outside this tool. Here it is only loaded, and
//! refreshed through the OAuth token endpoint once the access token expires.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use lectio_core::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth client credentials (user-provided).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Err(StoreError::Auth(format!(
                "Google credentials not found.\n\n\
                Create {} with:\n\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Auth(format!("Failed to read credentials from {}: {e}", path.display()))
        })?;

        toml::from_str(&contents).map_err(|e| {
            StoreError::Auth(format!("Failed to parse credentials from {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct Session {
    path: PathBuf,
    data: SessionData,
}

impl Session {
    pub fn new(path: impl Into<PathBuf>, data: SessionData) -> Self {
        Session {
            path: path.into(),
            data,
        }
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Err(StoreError::Auth(format!(
                "Google session not found at {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Auth(format!("Failed to read Google session from {}: {e}", path.display()))
        })?;

        let data: SessionData = toml::from_str(&contents).map_err(|e| {
            StoreError::Auth(format!("Failed to parse Google session from {}: {e}", path.display()))
        })?;

        Ok(Session::new(path, data))
    }

    /// Load a session, refreshing it if it has expired.
    pub async fn load_valid(
        path: &Path,
        credentials_path: &Path,
        http: &reqwest::Client,
    ) -> StoreResult<Self> {
        let mut session = Self::load(path)?;

        if session.is_expired(Utc::now()) {
            let credentials = Credentials::load(credentials_path)?;
            session.refresh(http, &credentials).await?;
        } else {
            debug!(expires_at = %session.data.expires_at, "Using stored Google session");
        }

        Ok(session)
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    pub fn save(&self) -> StoreResult<()> {
        let contents = toml::to_string_pretty(&self.data)
            .map_err(|e| StoreError::Auth(format!("Failed to serialize session: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Auth(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        std::fs::write(&self.path, contents).map_err(|e| {
            StoreError::Auth(format!("Failed to write session to {}: {e}", self.path.display()))
        })?;

        // Owner-only, the file holds OAuth tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).map_err(
                |e| {
                    StoreError::Auth(format!(
                        "Failed to set permissions on {}: {e}",
                        self.path.display()
                    ))
                },
            )?;
        }

        Ok(())
    }

    async fn refresh(
        &mut self,
        http: &reqwest::Client,
        credentials: &Credentials,
    ) -> StoreResult<()> {
        info!("Refreshing Google access token");

        let response = http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", self.data.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to send token refresh: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "Failed to refresh Google token ({status}): {error_text}"
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("Token refresh response: {e}")))?;

        self.apply_refresh(refreshed, Utc::now());
        self.save()
    }

    fn apply_refresh(&mut self, refreshed: RefreshResponse, now: DateTime<Utc>) {
        self.data.access_token = refreshed.access_token;
        self.data.expires_at = now + Duration::seconds(refreshed.expires_in);

        // Google usually omits the refresh token on refresh.
        if let Some(refresh_token) = refreshed.refresh_token.filter(|t| !t.is_empty()) {
            self.data.refresh_token = refresh_token;
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}
