//! Schedule entries as reported by Lectio.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The status Lectio attaches to a class period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleStatus {
    #[default]
    #[serde(rename = "unchanged", alias = "uændret")]
    Unchanged,
    #[serde(rename = "changed", alias = "ændret")]
    Changed,
    #[serde(rename = "cancelled", alias = "aflyst")]
    Cancelled,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Unchanged => write!(f, "unchanged"),
            ModuleStatus::Changed => write!(f, "changed"),
            ModuleStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single class period ("modul") from the schedule.
///
/// Modules are values: a fresh set is fetched on every run and nothing about
/// them is persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "startDate")]
    pub start: DateTime<FixedOffset>,
    #[serde(rename = "endDate")]
    pub end: DateTime<FixedOffset>,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub homework: String,
    #[serde(default)]
    pub status: ModuleStatus,
}

impl Module {
    /// Calendar description text, labelled the way Lectio labels it.
    pub fn description(&self) -> String {
        let teacher = self.teacher.trim();
        let homework = self.homework.trim();

        match (teacher.is_empty(), homework.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!("Lærer: {teacher}"),
            (true, false) => format!("Lektier:\n{homework}"),
            (false, false) => format!("Lærer: {teacher}\n\nLektier:\n{homework}"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "(untitled module {})", self.id)
        } else {
            write!(f, "{}", self.title)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn make_test_module(id: &str) -> Module {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        Module {
            id: id.to_string(),
            title: "3a Math".to_string(),
            start: tz.with_ymd_and_hms(2025, 3, 20, 8, 15, 0).unwrap(),
            end: tz.with_ymd_and_hms(2025, 3, 20, 9, 15, 0).unwrap(),
            room: "22".to_string(),
            teacher: String::new(),
            homework: String::new(),
            status: ModuleStatus::Unchanged,
        }
    }

    #[test]
    fn test_description_combines_teacher_and_homework() {
        let mut module = make_test_module("42");
        assert_eq!(module.description(), "");

        module.teacher = "ABC".to_string();
        assert_eq!(module.description(), "Lærer: ABC");

        module.homework = "Read chapter 4 ".to_string();
        assert_eq!(
            module.description(),
            "Lærer: ABC\n\nLektier:\nRead chapter 4"
        );

        module.teacher.clear();
        assert_eq!(module.description(), "Lektier:\nRead chapter 4");
    }

    #[test]
    fn test_status_accepts_danish_names() {
        let status: ModuleStatus = serde_json::from_str("\"aflyst\"").unwrap();
        assert_eq!(status, ModuleStatus::Cancelled);
        let status: ModuleStatus = serde_json::from_str("\"ændret\"").unwrap();
        assert_eq!(status, ModuleStatus::Changed);
        let status: ModuleStatus = serde_json::from_str("\"uændret\"").unwrap();
        assert_eq!(status, ModuleStatus::Unchanged);
        let status: ModuleStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, ModuleStatus::Cancelled);
    }

    #[test]
    fn test_module_deserializes_exported_layout() {
        let json = r#"{
            "id": "5512",
            "title": "3a Dansk",
            "startDate": "2025-03-20T09:55:00+01:00",
            "endDate": "2025-03-20T11:25:00+01:00",
            "room": "22",
            "teacher": "",
            "homework": "",
            "status": "ændret"
        }"#;

        let module: Module = serde_json::from_str(json).unwrap();
        assert_eq!(module.id, "5512");
        assert_eq!(module.status, ModuleStatus::Changed);
        assert!(module.end > module.start);
    }
}
