//! Decoding of the board's text-encoded timeline and dependency fields.
//!
//! The board stores a task's date range as `"2025-11-03/2025-11-07"` and its
//! predecessor links as JSON text (`[{"id": 4, "type": "FS"}]`) inside generic
//! value slots. Everything here decodes those once, at the boundary, into the
//! typed model. Absent, empty or malformed data decodes to "no data".

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{DateRange, DependencyLink, DependencyType, RangeError, Task, TaskId};

/// Separator between the two ISO dates of an encoded timeline.
pub const TIMELINE_SEPARATOR: char = '/';

/// Errors from boundary decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("timeline {0:?} has no '/' separator")]
    MissingSeparator(String),
    #[error("invalid date: {0:?}")]
    InvalidDate(String),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot must be a JSON list of tasks")]
    NotAList,
}

/// Parse an ISO date, tolerating a trailing time component.
fn parse_date(s: &str) -> Result<NaiveDate, DecodeError> {
    let s = s.trim();
    let date_part = s.split_once('T').map_or(s, |(date, _)| date);
    date_part
        .parse::<NaiveDate>()
        .map_err(|_| DecodeError::InvalidDate(s.to_string()))
}

/// Decode `"YYYY-MM-DD/YYYY-MM-DD"` into a range.
pub fn decode_timeline(encoded: &str) -> Result<DateRange, DecodeError> {
    let (start, end) = encoded
        .split_once(TIMELINE_SEPARATOR)
        .ok_or_else(|| DecodeError::MissingSeparator(encoded.to_string()))?;
    Ok(DateRange::new(parse_date(start)?, parse_date(end)?)?)
}

/// Encode a range in the board's timeline format.
pub fn encode_timeline(range: &DateRange) -> String {
    format!(
        "{}{}{}",
        range.start().format("%Y-%m-%d"),
        TIMELINE_SEPARATOR,
        range.end().format("%Y-%m-%d")
    )
}

/// Decode one `{id, type}` record; `None` drops just this record.
fn decode_edge(value: &Value) -> Option<DependencyLink> {
    let record = value.as_object()?;
    let id = record.get("id")?.as_i64()?;
    let kind = match record.get("type") {
        // Links created before typed dependencies existed carry no type
        None | Some(Value::Null) => DependencyType::FinishToStart,
        Some(Value::String(code)) => code.parse().ok()?,
        Some(_) => return None,
    };
    Some(DependencyLink::new(TaskId(id), kind))
}

fn decode_edge_list(value: &Value) -> Vec<DependencyLink> {
    match value {
        Value::Array(items) => items.iter().filter_map(decode_edge).collect(),
        // Some writers double-encode the list as a JSON string
        Value::String(inner) => decode_edges(inner),
        _ => Vec::new(),
    }
}

/// Decode a JSON-encoded list of predecessor links.
///
/// Anything that is not a list yields no links; individual records with a
/// wrong-typed id or an unknown type code are dropped on their own.
pub fn decode_edges(encoded: &str) -> Vec<DependencyLink> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(encoded) {
        Ok(value) => decode_edge_list(&value),
        Err(_) => Vec::new(),
    }
}

/// Task as it arrives from the board layer, before decoding.
///
/// Fields are kept as raw JSON values so one malformed field never rejects
/// the whole task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub id: i64,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub timeline: Option<Value>,
    #[serde(default)]
    pub dependency_edges: Option<Value>,
}

fn value_as_date(value: Option<&Value>) -> Option<NaiveDate> {
    value.and_then(Value::as_str).and_then(|s| parse_date(s).ok())
}

impl RawTask {
    /// Decoded range: explicit start/end first, then the timeline field.
    pub fn range(&self) -> Option<DateRange> {
        let explicit = match (
            value_as_date(self.start_date.as_ref()),
            value_as_date(self.end_date.as_ref()),
        ) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        };
        explicit.or_else(|| {
            self.timeline
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|s| decode_timeline(s).ok())
        })
    }

    pub fn dependencies(&self) -> Vec<DependencyLink> {
        self.dependency_edges
            .as_ref()
            .map(decode_edge_list)
            .unwrap_or_default()
    }

    pub fn into_task(self) -> Task {
        Task {
            id: TaskId(self.id),
            range: self.range(),
            dependencies: self.dependencies(),
        }
    }
}

/// Decode a whole snapshot from a JSON list of tasks.
///
/// List entries that are not task records (no integer `id`) are skipped.
pub fn decode_snapshot(json: &str) -> Result<Vec<Task>, DecodeError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(items) = document else {
        return Err(DecodeError::NotAList);
    };
    Ok(items
        .into_iter()
        .filter_map(|item| RawTask::deserialize(item).ok())
        .map(RawTask::into_task)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_decode_timeline() {
        let range = decode_timeline("2025-11-03/2025-11-07").unwrap();
        assert_eq!(range.start(), d(2025, 11, 3));
        assert_eq!(range.end(), d(2025, 11, 7));
        assert_eq!(encode_timeline(&range), "2025-11-03/2025-11-07");
    }

    #[test]
    fn test_decode_timeline_with_time_and_whitespace() {
        let range = decode_timeline(" 2025-11-03T00:00:00Z / 2025-11-04 ").unwrap();
        assert_eq!(range.start(), d(2025, 11, 3));
        assert_eq!(range.end(), d(2025, 11, 4));
    }

    #[test]
    fn test_decode_timeline_malformed() {
        assert!(matches!(
            decode_timeline("2025-11-03"),
            Err(DecodeError::MissingSeparator(_))
        ));
        assert!(matches!(
            decode_timeline("soon/later"),
            Err(DecodeError::InvalidDate(_))
        ));
        assert!(matches!(
            decode_timeline("2025-11-07/2025-11-03"),
            Err(DecodeError::Range(_))
        ));
        assert!(decode_timeline("").is_err());
    }

    #[test]
    fn test_decode_edges() {
        let links = decode_edges(r#"[{"id": 1, "type": "FS"}, {"id": 2, "type": "ss"}]"#);
        assert_eq!(
            links,
            vec![
                DependencyLink::new(TaskId(1), DependencyType::FinishToStart),
                DependencyLink::new(TaskId(2), DependencyType::StartToStart),
            ]
        );
    }

    #[test]
    fn test_decode_edges_missing_type_defaults_to_finish_to_start() {
        let links = decode_edges(r#"[{"id": 7}]"#);
        assert_eq!(links, vec![DependencyLink::new(TaskId(7), DependencyType::FinishToStart)]);
    }

    #[test]
    fn test_decode_edges_drops_bad_records_only() {
        let links = decode_edges(
            r#"[{"id": "3", "type": "FS"}, {"id": 4, "type": "XX"}, {"id": 5, "type": 1}, 6, {"id": 8, "type": "FF"}]"#,
        );
        assert_eq!(links, vec![DependencyLink::new(TaskId(8), DependencyType::FinishToFinish)]);
    }

    #[test]
    fn test_decode_edges_not_a_list() {
        assert!(decode_edges("").is_empty());
        assert!(decode_edges("   ").is_empty());
        assert!(decode_edges("not json").is_empty());
        assert!(decode_edges(r#"{"id": 1, "type": "FS"}"#).is_empty());
        assert!(decode_edges("null").is_empty());
    }

    #[test]
    fn test_decode_edges_double_encoded() {
        let links = decode_edges(r#""[{\"id\": 2, \"type\": \"SF\"}]""#);
        assert_eq!(links, vec![DependencyLink::new(TaskId(2), DependencyType::StartToFinish)]);
    }

    #[test]
    fn test_raw_task_prefers_explicit_dates() {
        let raw: RawTask = serde_json::from_str(
            r#"{"id": 1, "startDate": "2025-01-01", "endDate": "2025-01-05", "timeline": "2025-02-01/2025-02-02"}"#,
        )
        .unwrap();
        let task = raw.into_task();
        assert_eq!(task.range.unwrap().start(), d(2025, 1, 1));
    }

    #[test]
    fn test_raw_task_falls_back_to_timeline() {
        let raw: RawTask = serde_json::from_str(
            r#"{"id": 1, "startDate": 12, "timeline": "2025-02-01/2025-02-02"}"#,
        )
        .unwrap();
        let task = raw.into_task();
        assert_eq!(task.range.unwrap().start(), d(2025, 2, 1));
    }

    #[test]
    fn test_raw_task_without_dates_is_unscheduled() {
        let raw: RawTask = serde_json::from_str(r#"{"id": 9, "timeline": "garbage"}"#).unwrap();
        let task = raw.into_task();
        assert_eq!(task.id, TaskId(9));
        assert!(!task.is_scheduled());
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_decode_snapshot() {
        let tasks = decode_snapshot(
            r#"[
                {"id": 1, "timeline": "2025-01-01/2025-01-05"},
                {"id": 2, "timeline": "2025-01-06/2025-01-10", "dependencyEdges": "[{\"id\": 1, \"type\": \"FS\"}]"},
                {"id": 3, "dependencyEdges": [{"id": 2, "type": "SS"}]},
                {"name": "no id"}
            ]"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(
            tasks[1].dependencies,
            vec![DependencyLink::new(TaskId(1), DependencyType::FinishToStart)]
        );
        assert_eq!(
            tasks[2].dependencies,
            vec![DependencyLink::new(TaskId(2), DependencyType::StartToStart)]
        );
        assert!(!tasks[2].is_scheduled());
    }

    #[test]
    fn test_decode_snapshot_rejects_non_list() {
        assert!(matches!(
            decode_snapshot(r#"{"id": 1}"#),
            Err(DecodeError::NotAList)
        ));
        assert!(matches!(decode_snapshot("{"), Err(DecodeError::Json(_))));
    }
}
