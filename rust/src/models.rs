//! Core data types for the dependency engine.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Integer identity of a task (board item).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Error constructing a date range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("range ends before it starts: {start} > {end}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Inclusive calendar date range of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days between start and end (0 for a single-day task).
    #[inline]
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Move both ends by `delta_days`, preserving duration.
    ///
    /// Returns `None` if either end leaves chrono's representable range.
    pub fn shifted(&self, delta_days: i64) -> Option<Self> {
        let delta = Duration::try_days(delta_days)?;
        Some(Self {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Precedence constraint type between a predecessor and a successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-Start: predecessor finishes before successor starts.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Start-to-Start: successor starts no earlier than predecessor.
    #[serde(rename = "SS")]
    StartToStart,
    /// Finish-to-Finish: successor finishes no earlier than predecessor.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Start-to-Finish: successor finishes no earlier than predecessor starts.
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        Self::FinishToStart,
        Self::StartToStart,
        Self::FinishToFinish,
        Self::StartToFinish,
    ];

    /// Short code used in encodings and messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }

    /// Whether the predecessor's finish (rather than its start) drives this link.
    #[inline]
    pub fn anchored_on_finish(self) -> bool {
        matches!(self, Self::FinishToStart | Self::FinishToFinish)
    }

    /// Anchor date of the predecessor side for this link type.
    #[inline]
    pub fn anchor(self, range: &DateRange) -> NaiveDate {
        if self.anchored_on_finish() {
            range.end()
        } else {
            range.start()
        }
    }

    /// Days by which `successor` overshoots the constraint against `predecessor`.
    ///
    /// Positive means violated by that many days; zero or negative means satisfied.
    ///
    /// | type | rule              |
    /// |------|-------------------|
    /// | FS   | P.end < S.start   |
    /// | SS   | P.start <= S.start|
    /// | FF   | P.end <= S.end    |
    /// | SF   | P.start <= S.end  |
    pub fn overshoot(self, predecessor: &DateRange, successor: &DateRange) -> i64 {
        match self {
            // Strict inequality: sharing a day is already one day over
            Self::FinishToStart => (predecessor.end() - successor.start()).num_days() + 1,
            Self::StartToStart => (predecessor.start() - successor.start()).num_days(),
            Self::FinishToFinish => (predecessor.end() - successor.end()).num_days(),
            Self::StartToFinish => (predecessor.start() - successor.end()).num_days(),
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unrecognized dependency type code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown dependency type: {0:?}")]
pub struct UnknownDependencyType(pub String);

impl FromStr for DependencyType {
    type Err = UnknownDependencyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS" => Ok(Self::FinishToStart),
            "SS" => Ok(Self::StartToStart),
            "FF" => Ok(Self::FinishToFinish),
            "SF" => Ok(Self::StartToFinish),
            _ => Err(UnknownDependencyType(s.to_string())),
        }
    }
}

/// A predecessor link, stored on the successor task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyLink {
    pub predecessor: TaskId,
    pub kind: DependencyType,
}

impl DependencyLink {
    pub fn new(predecessor: TaskId, kind: DependencyType) -> Self {
        Self {
            predecessor,
            kind,
        }
    }
}

/// Inverted link: predecessor -> successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuccessorLink {
    pub successor: TaskId,
    pub kind: DependencyType,
}

/// A task in the caller-provided snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    /// `None` for tasks that are not scheduled yet.
    pub range: Option<DateRange>,
    /// Predecessor links of this task.
    pub dependencies: Vec<DependencyLink>,
}

impl Task {
    pub fn new(id: TaskId, range: Option<DateRange>) -> Self {
        Self {
            id,
            range,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, predecessor: TaskId, kind: DependencyType) -> Self {
        self.dependencies.push(DependencyLink::new(predecessor, kind));
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.range.is_some()
    }
}

/// A precedence constraint that a proposed edit would break.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: DependencyType,
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    pub overshoot_days: i64,
    pub message: String,
}

/// New date range for a task shifted by a cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub task_id: TaskId,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
}

impl ScheduleUpdate {
    pub fn new(task_id: TaskId, range: DateRange) -> Self {
        Self {
            task_id,
            new_start: range.start(),
            new_end: range.end(),
        }
    }

    /// The updated range, if it is well-formed.
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.new_start, self.new_end).ok()
    }

    /// The updated range in the board's `timeline` text form, for writing back.
    pub fn timeline(&self) -> Option<String> {
        self.range().map(|range| crate::encoding::encode_timeline(&range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn r(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        let err = DateRange::new(d(2025, 1, 5), d(2025, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            RangeError::EndBeforeStart {
                start: d(2025, 1, 5),
                end: d(2025, 1, 1)
            }
        );
        assert!(DateRange::new(d(2025, 1, 5), d(2025, 1, 5)).is_ok());
    }

    #[test]
    fn test_shift_preserves_duration() {
        let range = r(d(2025, 1, 6), d(2025, 1, 10));
        let shifted = range.shifted(3).unwrap();
        assert_eq!(shifted.start(), d(2025, 1, 9));
        assert_eq!(shifted.end(), d(2025, 1, 13));
        assert_eq!(shifted.duration_days(), range.duration_days());

        let back = range.shifted(-10).unwrap();
        assert_eq!(back.start(), d(2024, 12, 27));
        assert_eq!(back.duration_days(), 4);
    }

    #[test]
    fn test_shift_out_of_range_is_none() {
        let range = r(NaiveDate::MAX, NaiveDate::MAX);
        assert!(range.shifted(1).is_none());
    }

    #[test]
    fn test_parse_dependency_type() {
        assert_eq!("fs".parse(), Ok(DependencyType::FinishToStart));
        assert_eq!(" SS ".parse(), Ok(DependencyType::StartToStart));
        assert_eq!("FF".parse(), Ok(DependencyType::FinishToFinish));
        assert_eq!("sf".parse(), Ok(DependencyType::StartToFinish));
        assert!("XX".parse::<DependencyType>().is_err());
        for kind in DependencyType::ALL {
            assert_eq!(kind.code().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_finish_to_start_boundaries() {
        let pred = r(d(2025, 1, 1), d(2025, 1, 5));
        let fs = DependencyType::FinishToStart;
        // Starts the day after: satisfied
        assert_eq!(fs.overshoot(&pred, &r(d(2025, 1, 6), d(2025, 1, 8))), 0);
        // Starts on the finish day: one day over
        assert_eq!(fs.overshoot(&pred, &r(d(2025, 1, 5), d(2025, 1, 8))), 1);
        // Two days after: one day of slack
        assert_eq!(fs.overshoot(&pred, &r(d(2025, 1, 7), d(2025, 1, 8))), -1);
    }

    #[test]
    fn test_start_to_start_boundaries() {
        let pred = r(d(2025, 1, 3), d(2025, 1, 5));
        let ss = DependencyType::StartToStart;
        assert_eq!(ss.overshoot(&pred, &r(d(2025, 1, 3), d(2025, 1, 4))), 0);
        assert_eq!(ss.overshoot(&pred, &r(d(2025, 1, 2), d(2025, 1, 4))), 1);
        assert_eq!(ss.overshoot(&pred, &r(d(2025, 1, 4), d(2025, 1, 4))), -1);
    }

    #[test]
    fn test_finish_to_finish_boundaries() {
        let pred = r(d(2025, 1, 3), d(2025, 1, 5));
        let ff = DependencyType::FinishToFinish;
        assert_eq!(ff.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 5))), 0);
        assert_eq!(ff.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 4))), 1);
        assert_eq!(ff.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 6))), -1);
    }

    #[test]
    fn test_start_to_finish_boundaries() {
        let pred = r(d(2025, 1, 3), d(2025, 1, 5));
        let sf = DependencyType::StartToFinish;
        assert_eq!(sf.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 3))), 0);
        assert_eq!(sf.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 2))), 1);
        assert_eq!(sf.overshoot(&pred, &r(d(2025, 1, 1), d(2025, 1, 4))), -1);
    }

    #[test]
    fn test_anchor_selection() {
        let range = r(d(2025, 1, 3), d(2025, 1, 5));
        assert_eq!(DependencyType::FinishToStart.anchor(&range), d(2025, 1, 5));
        assert_eq!(DependencyType::FinishToFinish.anchor(&range), d(2025, 1, 5));
        assert_eq!(DependencyType::StartToStart.anchor(&range), d(2025, 1, 3));
        assert_eq!(DependencyType::StartToFinish.anchor(&range), d(2025, 1, 3));
    }

    #[test]
    fn test_update_timeline_for_write_back() {
        let update = ScheduleUpdate::new(TaskId(7), r(d(2025, 2, 3), d(2025, 2, 7)));
        assert_eq!(update.timeline().as_deref(), Some("2025-02-03/2025-02-07"));

        let inverted = ScheduleUpdate {
            task_id: TaskId(7),
            new_start: d(2025, 2, 7),
            new_end: d(2025, 2, 3),
        };
        assert_eq!(inverted.timeline(), None);
    }
}
