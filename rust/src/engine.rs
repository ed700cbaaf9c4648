//! Engine facade: one dependency graph per analysis call.

use rustc_hash::FxHashSet;

use crate::cascade;
use crate::config::EngineConfig;
use crate::critical_path::{self, CriticalPathResult};
use crate::graph::DependencyGraph;
use crate::log_changes;
use crate::models::{DateRange, ScheduleUpdate, Task, TaskId, Violation};
use crate::validator;

/// Dependency engine bound to one snapshot.
///
/// Build it when an edit starts (drag-end, resize-end, manual date edit, or a
/// critical path refresh) and drop it afterwards. The snapshot is never
/// mutated; every operation returns new values.
pub struct ScheduleEngine<'a> {
    graph: DependencyGraph<'a>,
    config: EngineConfig,
}

impl<'a> ScheduleEngine<'a> {
    pub fn new(tasks: &'a [Task], config: EngineConfig) -> Self {
        let graph = DependencyGraph::with_verbosity(tasks, config.verbosity);
        if config.verbosity > 0 {
            if let Some(cycle) = graph.find_cycle() {
                let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                log_changes!(
                    config.verbosity,
                    "engine: dependency cycle {} (analysis stays bounded)",
                    path.join(" -> ")
                );
            }
        }
        Self { graph, config }
    }

    pub fn graph(&self) -> &DependencyGraph<'a> {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// First constraint that moving `moved` to `proposed` would break.
    pub fn check_violation(&self, moved: TaskId, proposed: &DateRange) -> Option<Violation> {
        validator::check_violation(&self.graph, moved, proposed)
    }

    /// Date shifts for every task dependent on `root` after it moved.
    pub fn propagate(&self, root: TaskId, new_range: DateRange) -> Vec<ScheduleUpdate> {
        cascade::propagate(&self.graph, root, new_range, &self.config.cascade)
    }

    pub fn critical_set(&self) -> FxHashSet<TaskId> {
        self.analyze().critical_tasks
    }

    pub fn analyze(&self) -> CriticalPathResult {
        critical_path::analyze(&self.graph, &self.config.critical_path)
    }

    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        self.graph.find_cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CascadeConfig, CriticalPathConfig};
    use crate::models::DependencyType;
    use chrono::NaiveDate;

    fn r(start: u32, end: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, start).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, end).unwrap(),
        )
        .unwrap()
    }

    fn snapshot() -> Vec<Task> {
        vec![
            Task::new(TaskId(1), Some(r(1, 5))),
            Task::new(TaskId(2), Some(r(6, 10)))
                .with_dependency(TaskId(1), DependencyType::FinishToStart),
            Task::new(TaskId(3), Some(r(20, 21))),
        ]
    }

    #[test]
    fn test_engine_operations() {
        let tasks = snapshot();
        let engine = ScheduleEngine::new(&tasks, EngineConfig::default());

        let violation = engine.check_violation(TaskId(1), &r(1, 8)).unwrap();
        assert_eq!(violation.overshoot_days, 3);

        let updates = engine.propagate(TaskId(1), r(1, 8));
        assert_eq!(updates, vec![ScheduleUpdate::new(TaskId(2), r(9, 13))]);

        // Task 3 ends the project; the 1 -> 2 chain has 11+ days of float
        let critical = engine.critical_set();
        assert!(critical.contains(&TaskId(3)));
        assert!(!critical.contains(&TaskId(1)));
        assert!(engine.find_cycle().is_none());
    }

    #[test]
    fn test_engine_uses_config() {
        let tasks = snapshot();
        let config = EngineConfig {
            verbosity: 0,
            critical_path: CriticalPathConfig::with_tolerance(30),
            cascade: CascadeConfig { include_root: true },
        };
        let engine = ScheduleEngine::new(&tasks, config);

        assert_eq!(engine.critical_set().len(), 3);
        let updates = engine.propagate(TaskId(1), r(1, 8));
        assert_eq!(updates[0].task_id, TaskId(1));
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn test_engine_reports_cycle() {
        let tasks = vec![
            Task::new(TaskId(1), Some(r(1, 2)))
                .with_dependency(TaskId(2), DependencyType::FinishToStart),
            Task::new(TaskId(2), Some(r(3, 4)))
                .with_dependency(TaskId(1), DependencyType::FinishToStart),
        ];
        let engine = ScheduleEngine::new(
            &tasks,
            EngineConfig {
                verbosity: 1,
                ..Default::default()
            },
        );
        assert_eq!(engine.find_cycle(), Some(vec![TaskId(1), TaskId(2)]));
    }
}
