use std::fmt;

use crate::calendar_event::CalendarEvent;
use crate::diff::DiffKind;

/// One write against the calendar store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Insert(CalendarEvent),
    Update(CalendarEvent),
    Delete(String),
}

impl Operation {
    pub fn kind(&self) -> DiffKind {
        match self {
            Operation::Insert(_) => DiffKind::Insert,
            Operation::Update(_) => DiffKind::Update,
            Operation::Delete(_) => DiffKind::Delete,
        }
    }

    pub fn external_id(&self) -> &str {
        match self {
            Operation::Insert(event) | Operation::Update(event) => &event.external_id,
            Operation::Delete(external_id) => external_id,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.external_id())
    }
}
