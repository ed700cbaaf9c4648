//! Python bindings for the board backend.
//!
//! The backend holds tasks as rows with text-encoded timeline and dependency
//! fields; these wrappers decode them once and call the engine.

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

use crate::config::{CascadeConfig, CriticalPathConfig, EngineConfig};
use crate::encoding::RawTask;
use crate::engine::ScheduleEngine;
use crate::models::{DateRange, ScheduleUpdate, Task, TaskId, Violation};

/// Task row as the board backend holds it (PyO3 wrapper).
#[pyclass(name = "Task")]
#[derive(Clone, Debug)]
pub struct PyTask {
    #[pyo3(get, set)]
    pub id: i64,
    #[pyo3(get, set)]
    pub start_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub end_date: Option<NaiveDate>,
    /// `"YYYY-MM-DD/YYYY-MM-DD"`, used when start/end are not set.
    #[pyo3(get, set)]
    pub timeline: Option<String>,
    /// JSON list of `{id, type}` predecessor records.
    #[pyo3(get, set)]
    pub dependency_edges: Option<String>,
}

#[pymethods]
impl PyTask {
    #[new]
    #[pyo3(signature = (id, start_date=None, end_date=None, timeline=None, dependency_edges=None))]
    fn new(
        id: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        timeline: Option<String>,
        dependency_edges: Option<String>,
    ) -> Self {
        Self {
            id,
            start_date,
            end_date,
            timeline,
            dependency_edges,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, start={:?}, end={:?}, timeline={:?})",
            self.id, self.start_date, self.end_date, self.timeline
        )
    }
}

impl PyTask {
    fn to_task(&self) -> Task {
        RawTask {
            id: self.id,
            start_date: self.start_date.map(|d| Value::String(d.to_string())),
            end_date: self.end_date.map(|d| Value::String(d.to_string())),
            timeline: self.timeline.clone().map(Value::String),
            dependency_edges: self.dependency_edges.clone().map(Value::String),
        }
        .into_task()
    }
}

/// Violated constraint (PyO3 wrapper).
#[pyclass(name = "Violation")]
#[derive(Clone, Debug)]
pub struct PyViolation {
    /// "FS", "SS", "FF" or "SF".
    #[pyo3(get)]
    pub kind: String,
    #[pyo3(get)]
    pub predecessor_id: i64,
    #[pyo3(get)]
    pub successor_id: i64,
    #[pyo3(get)]
    pub overshoot_days: i64,
    #[pyo3(get)]
    pub message: String,
}

#[pymethods]
impl PyViolation {
    fn __repr__(&self) -> String {
        format!(
            "Violation(type={}, predecessor={}, successor={}, overshoot_days={})",
            self.kind, self.predecessor_id, self.successor_id, self.overshoot_days
        )
    }
}

impl From<Violation> for PyViolation {
    fn from(v: Violation) -> Self {
        Self {
            kind: v.kind.code().to_string(),
            predecessor_id: v.predecessor_id.0,
            successor_id: v.successor_id.0,
            overshoot_days: v.overshoot_days,
            message: v.message,
        }
    }
}

/// Cascaded date change (PyO3 wrapper).
#[pyclass(name = "ScheduleUpdate")]
#[derive(Clone, Debug)]
pub struct PyScheduleUpdate {
    #[pyo3(get)]
    pub task_id: i64,
    #[pyo3(get)]
    pub new_start: NaiveDate,
    #[pyo3(get)]
    pub new_end: NaiveDate,
    /// `"YYYY-MM-DD/YYYY-MM-DD"`, ready to store in the row's timeline field.
    #[pyo3(get)]
    pub timeline: Option<String>,
}

#[pymethods]
impl PyScheduleUpdate {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleUpdate(task_id={}, new_start={}, new_end={})",
            self.task_id, self.new_start, self.new_end
        )
    }
}

impl From<ScheduleUpdate> for PyScheduleUpdate {
    fn from(u: ScheduleUpdate) -> Self {
        Self {
            task_id: u.task_id.0,
            new_start: u.new_start,
            new_end: u.new_end,
            timeline: u.timeline(),
        }
    }
}

/// Engine configuration (PyO3 wrapper).
#[pyclass(name = "EngineConfig")]
#[derive(Clone, Debug)]
pub struct PyEngineConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    #[pyo3(get, set)]
    pub tolerance_days: i64,
    #[pyo3(get, set)]
    pub include_root: bool,
}

#[pymethods]
impl PyEngineConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, tolerance_days=3, include_root=false))]
    fn new(verbosity: u8, tolerance_days: i64, include_root: bool) -> Self {
        Self {
            verbosity,
            tolerance_days,
            include_root,
        }
    }

    /// Load from a (possibly partial) JSON document.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config =
            EngineConfig::from_json(json).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self {
            verbosity: config.verbosity,
            tolerance_days: config.critical_path.tolerance_days,
            include_root: config.cascade.include_root,
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "EngineConfig(verbosity={}, tolerance_days={}, include_root={})",
            self.verbosity, self.tolerance_days, self.include_root
        )
    }
}

impl PyEngineConfig {
    fn to_config(&self) -> PyResult<EngineConfig> {
        let config = EngineConfig {
            verbosity: self.verbosity,
            critical_path: CriticalPathConfig::with_tolerance(self.tolerance_days),
            cascade: CascadeConfig {
                include_root: self.include_root,
            },
        };
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(config)
    }
}

fn resolve_config(config: Option<PyEngineConfig>) -> PyResult<EngineConfig> {
    match config {
        Some(c) => c.to_config(),
        None => Ok(EngineConfig::default()),
    }
}

fn decode_tasks(tasks: &[PyTask]) -> Vec<Task> {
    tasks.iter().map(PyTask::to_task).collect()
}

fn make_range(start: NaiveDate, end: NaiveDate) -> PyResult<DateRange> {
    DateRange::new(start, end).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Check whether moving a task to [start, end] breaks a dependency.
///
/// Returns the first violation found, or None.
///
/// # Raises
/// * ValueError if end is before start or the config is invalid
#[pyfunction]
#[pyo3(name = "check_violation", signature = (tasks, moved_id, start, end, config=None))]
fn py_check_violation(
    tasks: Vec<PyTask>,
    moved_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    config: Option<PyEngineConfig>,
) -> PyResult<Option<PyViolation>> {
    let proposed = make_range(start, end)?;
    let config = resolve_config(config)?;
    let tasks = decode_tasks(&tasks);
    let engine = ScheduleEngine::new(&tasks, config);
    Ok(engine
        .check_violation(TaskId(moved_id), &proposed)
        .map(PyViolation::from))
}

/// Cascade a committed move of `root_id` to [start, end] through its dependents.
///
/// # Raises
/// * ValueError if end is before start or the config is invalid
#[pyfunction]
#[pyo3(name = "propagate", signature = (tasks, root_id, start, end, config=None))]
fn py_propagate(
    tasks: Vec<PyTask>,
    root_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    config: Option<PyEngineConfig>,
) -> PyResult<Vec<PyScheduleUpdate>> {
    let new_range = make_range(start, end)?;
    let config = resolve_config(config)?;
    let tasks = decode_tasks(&tasks);
    let engine = ScheduleEngine::new(&tasks, config);
    Ok(engine
        .propagate(TaskId(root_id), new_range)
        .into_iter()
        .map(PyScheduleUpdate::from)
        .collect())
}

/// Ids of tasks whose float is within `tolerance_days` of the critical path.
///
/// # Raises
/// * ValueError if tolerance_days is negative
#[pyfunction]
#[pyo3(name = "compute_critical_set", signature = (tasks, tolerance_days=3, verbosity=0))]
fn py_compute_critical_set(
    tasks: Vec<PyTask>,
    tolerance_days: i64,
    verbosity: u8,
) -> PyResult<HashSet<i64>> {
    let config = PyEngineConfig::new(verbosity, tolerance_days, false).to_config()?;
    let tasks = decode_tasks(&tasks);
    let engine = ScheduleEngine::new(&tasks, config);
    Ok(engine.critical_set().into_iter().map(|id| id.0).collect())
}

/// The board_schedule Python module.
#[pymodule]
fn board_schedule(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTask>()?;
    m.add_class::<PyViolation>()?;
    m.add_class::<PyScheduleUpdate>()?;
    m.add_class::<PyEngineConfig>()?;

    m.add_function(wrap_pyfunction!(py_check_violation, m)?)?;
    m.add_function(wrap_pyfunction!(py_propagate, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_critical_set, m)?)?;

    Ok(())
}
