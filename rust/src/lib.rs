//! Task-dependency scheduling engine for the project board.
//!
//! Operates on an in-memory snapshot of tasks and their FS/SS/FF/SF
//! predecessor links:
//! - [`check_violation`]: does a proposed date range break a constraint?
//! - [`propagate`]: ripple a committed date change through dependents,
//!   preserving each dependent's duration.
//! - [`compute_critical_set`]: tasks whose float is within a tolerance of
//!   the critical path.
//!
//! Nothing here mutates the snapshot or persists anything; callers decide
//! what to commit.

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

pub mod cascade;
mod config;
pub mod critical_path;
pub mod encoding;
mod engine;
pub mod graph;
mod interner;
pub mod logging;
mod models;
pub mod validator;

#[cfg(feature = "python")]
mod python;

pub use cascade::{apply_updates, propagate};
pub use config::{
    CascadeConfig, ConfigError, CriticalPathConfig, EngineConfig, DEFAULT_TOLERANCE_DAYS,
};
pub use critical_path::{analyze, compute_critical_set, CriticalPathResult, TaskTiming};
pub use encoding::{decode_edges, decode_snapshot, decode_timeline, DecodeError, RawTask};
pub use engine::ScheduleEngine;
pub use graph::DependencyGraph;
pub use models::{
    DateRange, DependencyLink, DependencyType, RangeError, ScheduleUpdate, SuccessorLink, Task,
    TaskId, UnknownDependencyType, Violation,
};
pub use validator::{check_violation, link_overshoot};
