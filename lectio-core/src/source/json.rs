//! Reads modules from a JSON schedule export.
//!
//! Accepts either an array of modules or an object keyed by module id, using
//! the field names of the Lectio export (`startDate`, `endDate`, `status`, ...).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::date_range::DateRange;
use crate::error::SourceError;
use crate::module::Module;
use crate::source::ScheduleSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleFile {
    List(Vec<Module>),
    Map(HashMap<String, Module>),
}

#[derive(Debug, Clone)]
pub struct JsonScheduleSource {
    path: PathBuf,
}

impl JsonScheduleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonScheduleSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses and validates a schedule, keeping modules that overlap `range`.
    pub fn parse(content: &str, range: &DateRange) -> Result<HashMap<String, Module>, SourceError> {
        let file: ScheduleFile =
            serde_json::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))?;

        let modules = match file {
            ScheduleFile::List(list) => list,
            ScheduleFile::Map(map) => map.into_values().collect(),
        };

        let total = modules.len();
        let mut by_id = HashMap::with_capacity(total);

        for module in modules {
            validate(&module)?;

            if !range.overlaps(&module.start, &module.end) {
                continue;
            }

            if by_id.contains_key(&module.id) {
                return Err(SourceError::InvalidModule {
                    id: module.id,
                    reason: "duplicate id".to_string(),
                });
            }
            by_id.insert(module.id.clone(), module);
        }

        debug!(total, in_range = by_id.len(), "Parsed schedule");
        Ok(by_id)
    }
}

fn validate(module: &Module) -> Result<(), SourceError> {
    if module.id.trim().is_empty() {
        return Err(SourceError::InvalidModule {
            id: module.id.clone(),
            reason: "empty id".to_string(),
        });
    }

    if module.end < module.start {
        return Err(SourceError::InvalidModule {
            id: module.id.clone(),
            reason: format!("ends ({}) before it starts ({})", module.end, module.start),
        });
    }

    Ok(())
}

#[async_trait]
impl ScheduleSource for JsonScheduleSource {
    async fn fetch_modules(
        &self,
        range: &DateRange,
    ) -> Result<HashMap<String, Module>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Self::parse(&content, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleStatus;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn week_of_march_17() -> DateRange {
        DateRange {
            from: Some(Utc.with_ymd_and_hms(2025, 3, 16, 23, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 3, 23, 23, 0, 0).unwrap()),
        }
    }

    const LIST: &str = r#"[
        {"id": "1", "title": "3a Dansk", "startDate": "2025-03-17T08:15:00+01:00",
         "endDate": "2025-03-17T09:45:00+01:00", "room": "22", "status": "uændret"},
        {"id": "2", "title": "3a Fysik", "startDate": "2025-03-18T10:00:00+01:00",
         "endDate": "2025-03-18T11:30:00+01:00", "room": "F1", "status": "aflyst"},
        {"id": "3", "title": "3a Matematik", "startDate": "2025-03-25T08:15:00+01:00",
         "endDate": "2025-03-25T09:45:00+01:00", "room": "12", "status": "ændret"}
    ]"#;

    #[test]
    fn test_parse_list_filters_to_range() {
        let modules = JsonScheduleSource::parse(LIST, &week_of_march_17()).unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules["2"].status, ModuleStatus::Cancelled);
        assert!(!modules.contains_key("3"));
    }

    #[test]
    fn test_parse_map_layout() {
        let json = r#"{
            "7": {"id": "7", "title": "Idræt", "startDate": "2025-03-19T12:00:00+01:00",
                  "endDate": "2025-03-19T13:30:00+01:00"}
        }"#;
        let modules = JsonScheduleSource::parse(json, &week_of_march_17()).unwrap();

        assert_eq!(modules["7"].room, "");
        assert_eq!(modules["7"].status, ModuleStatus::Unchanged);
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let json = r#"[
            {"id": "1", "startDate": "2025-03-17T08:15:00+01:00",
             "endDate": "2025-03-17T09:45:00+01:00"},
            {"id": "1", "startDate": "2025-03-18T08:15:00+01:00",
             "endDate": "2025-03-18T09:45:00+01:00"}
        ]"#;
        let err = JsonScheduleSource::parse(json, &week_of_march_17()).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidModule { ref reason, .. } if reason == "duplicate id"
        ));
    }

    #[test]
    fn test_parse_rejects_inverted_times() {
        let json = r#"[
            {"id": "1", "startDate": "2025-03-17T09:45:00+01:00",
             "endDate": "2025-03-17T08:15:00+01:00"}
        ]"#;
        let err = JsonScheduleSource::parse(json, &week_of_march_17()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidModule { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = JsonScheduleSource::parse("{not json", &week_of_march_17()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIST.as_bytes()).unwrap();

        let source = JsonScheduleSource::new(file.path());
        let modules = source.fetch_modules(&week_of_march_17()).await.unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonScheduleSource::new(dir.path().join("missing.json"));
        let err = source
            .fetch_modules(&week_of_march_17())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
