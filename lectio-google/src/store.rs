//! `CalendarStore` backed by the Google Calendar v3 REST API.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use lectio_core::store::{Page, drain_pages};
use lectio_core::{
    CalendarEvent, CalendarStore, DateRange, Namespace, StoreError, StoreResult,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::event::{EventsPage, GoogleEvent};
use crate::retry::{RetryPolicy, parse_retry_after};
use crate::session::Session;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
const PAGE_SIZE: &str = "250";

pub struct GoogleCalendarStore {
    http: reqwest::Client,
    base_url: Url,
    calendar_id: String,
    access_token: String,
    time_zone: String,
    retry: RetryPolicy,
}

impl GoogleCalendarStore {
    pub fn new(
        http: reqwest::Client,
        access_token: impl Into<String>,
        calendar_id: impl Into<String>,
        time_zone: impl Into<String>,
    ) -> StoreResult<Self> {
        let base_url = Url::parse(API_BASE).map_err(|e| StoreError::Malformed(e.to_string()))?;

        Ok(GoogleCalendarStore {
            http,
            base_url,
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
            time_zone: time_zone.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Load (and refresh if needed) the session, then build the store.
    pub async fn connect(
        session_path: &Path,
        credentials_path: &Path,
        calendar_id: &str,
        time_zone: &str,
    ) -> StoreResult<Self> {
        let http = reqwest::Client::new();
        let session = Session::load_valid(session_path, credentials_path, &http).await?;
        let access_token = session.access_token().to_string();
        Self::new(http, access_token, calendar_id, time_zone)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `…/calendars/{calendar_id}/events[/{event_id}]`, each segment percent-encoded.
    fn events_url(&self, event_id: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Malformed(format!("Unusable base URL {}", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .push("calendars")
                .push(&self.calendar_id)
                .push("events");
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }

    fn list_url(&self, range: &DateRange, page_token: Option<&str>) -> StoreResult<Url> {
        let mut url = self.events_url(None)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("showDeleted", "true")
                .append_pair("maxResults", PAGE_SIZE);
            if let Some(time_min) = range.from_rfc3339() {
                query.append_pair("timeMin", &time_min);
            }
            if let Some(time_max) = range.to_rfc3339() {
                query.append_pair("timeMax", &time_max);
            }
            if let Some(page_token) = page_token {
                query.append_pair("pageToken", page_token);
            }
        }
        Ok(url)
    }

    /// Sends a request, retrying transient failures. Non-2xx responses become errors.
    async fn send<F>(&self, build: F) -> StoreResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            let (error, retry_after) = match build().bearer_auth(&self.access_token).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after);
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    (error_for_status(status, &body), retry_after)
                }
                Err(e) => (StoreError::Transport(e.to_string()), None),
            };

            attempt += 1;
            if !self.retry.should_retry(&error, attempt) {
                return Err(error);
            }

            let delay = self.retry.delay(attempt, retry_after);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Calendar request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_page(
        &self,
        range: &DateRange,
        page_token: Option<String>,
    ) -> StoreResult<Page<GoogleEvent>> {
        let url = self.list_url(range, page_token.as_deref())?;
        let response = self.send(|| self.http.get(url.clone())).await?;

        let page: EventsPage = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("events.list response: {e}")))?;

        Ok(Page {
            items: page.items,
            next_page_token: page.next_page_token,
        })
    }

    async fn write(&self, method: Method, url: Url, event: &CalendarEvent) -> StoreResult<()> {
        let body = GoogleEvent::from_calendar_event(event, &self.time_zone);
        self.send(|| self.http.request(method.clone(), url.clone()).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for GoogleCalendarStore {
    async fn list_events(
        &self,
        namespace: &Namespace,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> StoreResult<HashMap<String, CalendarEvent>> {
        let items = drain_pages(cancel, |page_token| self.fetch_page(range, page_token)).await?;
        let total = items.len();

        let events: HashMap<String, CalendarEvent> = items
            .into_iter()
            .filter(|item| namespace.owns(&item.id))
            .map(|item| {
                let event = item.into_calendar_event();
                (event.external_id.clone(), event)
            })
            .collect();

        debug!(total, owned = events.len(), "Listed calendar events");
        Ok(events)
    }

    async fn insert_event(&self, event: &CalendarEvent) -> StoreResult<()> {
        let url = self.events_url(None)?;
        self.write(Method::POST, url, event)
            .await
            .map_err(|e| with_event_id(e, &event.external_id))
    }

    async fn update_event(&self, external_id: &str, event: &CalendarEvent) -> StoreResult<()> {
        let url = self.events_url(Some(external_id))?;
        self.write(Method::PUT, url, event)
            .await
            .map_err(|e| with_event_id(e, external_id))
    }

    async fn delete_event(&self, external_id: &str) -> StoreResult<()> {
        let url = self.events_url(Some(external_id))?;

        match self.send(|| self.http.delete(url.clone())).await {
            Ok(_) => Ok(()),
            // Already deleted.
            Err(StoreError::Http { status: 410, .. }) => Ok(()),
            Err(e) => Err(with_event_id(e, external_id)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

/// Maps an API error response onto `StoreError`.
fn error_for_status(status: StatusCode, body: &str) -> StoreError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();
    let message = if detail.message.is_empty() {
        body.trim().to_string()
    } else {
        detail.message
    };
    let rate_limited = detail
        .errors
        .iter()
        .any(|e| matches!(e.reason.as_str(), "rateLimitExceeded" | "userRateLimitExceeded"));

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::CONFLICT => StoreError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
        StatusCode::FORBIDDEN if rate_limited => StoreError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(message),
        _ => StoreError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Not-found and conflict errors name the event rather than the API message.
fn with_event_id(error: StoreError, external_id: &str) -> StoreError {
    match error {
        StoreError::NotFound(_) => StoreError::NotFound(external_id.to_string()),
        StoreError::Conflict(_) => StoreError::Conflict(external_id.to_string()),
        other => other,
    }
}
