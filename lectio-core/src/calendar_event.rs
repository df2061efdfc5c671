//! Calendar-side projection of a module.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::module::{Module, ModuleStatus};
use crate::namespace::Namespace;

/// Google colour id used for cancelled modules (red).
pub const CANCELLED_COLOR_ID: &str = "4";
/// Google colour id used for changed modules (green).
pub const CHANGED_COLOR_ID: &str = "2";

/// Visual marker carrying the module status on the calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMarker {
    #[default]
    Default,
    Green,
    Red,
    /// Any colour this tool never writes (e.g. recoloured by the user).
    Other(String),
}

impl ColorMarker {
    pub fn for_status(status: ModuleStatus) -> Self {
        match status {
            ModuleStatus::Cancelled => ColorMarker::Red,
            ModuleStatus::Changed => ColorMarker::Green,
            ModuleStatus::Unchanged => ColorMarker::Default,
        }
    }

    /// Recovers a status from the marker. Unknown colours read as unchanged,
    /// so the mapping is total but not injective.
    pub fn status(&self) -> ModuleStatus {
        match self {
            ColorMarker::Red => ModuleStatus::Cancelled,
            ColorMarker::Green => ModuleStatus::Changed,
            ColorMarker::Default | ColorMarker::Other(_) => ModuleStatus::Unchanged,
        }
    }

    pub fn from_color_id(color_id: Option<&str>) -> Self {
        match color_id {
            None | Some("") => ColorMarker::Default,
            Some(CANCELLED_COLOR_ID) => ColorMarker::Red,
            Some(CHANGED_COLOR_ID) => ColorMarker::Green,
            Some(other) => ColorMarker::Other(other.to_string()),
        }
    }

    pub fn color_id(&self) -> Option<&str> {
        match self {
            ColorMarker::Default => None,
            ColorMarker::Red => Some(CANCELLED_COLOR_ID),
            ColorMarker::Green => Some(CHANGED_COLOR_ID),
            ColorMarker::Other(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Confirmed,
    Cancelled,
}

impl LifecycleState {
    /// Anything the remote reports other than "cancelled" is a live event.
    pub fn from_remote(status: Option<&str>) -> Self {
        match status {
            Some("cancelled") => LifecycleState::Cancelled,
            _ => LifecycleState::Confirmed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Confirmed => "confirmed",
            LifecycleState::Cancelled => "cancelled",
        }
    }
}

/// An event as stored in (or about to be written to) the calendar.
///
/// `start`/`end` are `None` when the stored timestamps were missing or could
/// not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub external_id: String,
    pub title: String,
    pub room: String,
    pub description: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub color: ColorMarker,
    pub lifecycle: LifecycleState,
}

impl CalendarEvent {
    pub fn from_module(module: &Module, namespace: &Namespace) -> Self {
        CalendarEvent {
            external_id: namespace.to_external_id(&module.id),
            title: module.title.clone(),
            room: module.room.clone(),
            description: module.description(),
            start: Some(module.start),
            end: Some(module.end),
            color: ColorMarker::for_status(module.status),
            lifecycle: LifecycleState::Confirmed,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.lifecycle == LifecycleState::Cancelled
    }

    pub fn is_well_formed(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if end >= start)
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "({})", self.external_id)
        } else {
            write!(f, "{}", self.title)
        }
    }
}
