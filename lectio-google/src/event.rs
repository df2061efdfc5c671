//! Calendar v3 event resource and its mapping to `CalendarEvent`.

use chrono::{DateTime, FixedOffset};
use lectio_core::{CalendarEvent, ColorMarker, LifecycleState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// Set on all-day events only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// One page of `events.list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl GoogleEvent {
    /// Request body for insert/update. `time_zone` only affects how the
    /// calendar UI displays the times, the instants are fixed by the offset.
    pub fn from_calendar_event(event: &CalendarEvent, time_zone: &str) -> Self {
        let to_google = |dt: Option<DateTime<FixedOffset>>| {
            dt.map(|dt| EventDateTime {
                date_time: Some(dt.to_rfc3339()),
                date: None,
                time_zone: Some(time_zone.to_string()),
            })
        };

        GoogleEvent {
            id: event.external_id.clone(),
            summary: Some(event.title.clone()),
            location: Some(event.room.clone()),
            description: Some(event.description.clone()),
            color_id: event.color.color_id().map(str::to_string),
            status: Some(event.lifecycle.as_str().to_string()),
            start: to_google(event.start),
            end: to_google(event.end),
        }
    }

    /// Unparsable or all-day times become `None`; the planner rewrites such events.
    pub fn into_calendar_event(self) -> CalendarEvent {
        CalendarEvent {
            external_id: self.id,
            title: self.summary.unwrap_or_default(),
            room: self.location.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            start: self.start.as_ref().and_then(parse_date_time),
            end: self.end.as_ref().and_then(parse_date_time),
            color: ColorMarker::from_color_id(self.color_id.as_deref()),
            lifecycle: LifecycleState::from_remote(self.status.as_deref()),
        }
    }
}

fn parse_date_time(time: &EventDateTime) -> Option<DateTime<FixedOffset>> {
    time.date_time
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}
