//! Critical path analysis using a backward pass with slack tolerance.
//!
//! Late finish of every scheduled task is derived from its successors:
//!
//! | link | constraint on the predecessor's late finish |
//! |------|---------------------------------------------|
//! | FS   | late_start(s)                               |
//! | SS   | late_start(s) + duration(t)                 |
//! | FF   | late_finish(s)                              |
//! | SF   | late_finish(s) + duration(t)                |
//!
//! with `late_start(s) = late_finish(s) - duration(s)`. A task without
//! successors finishes at the project end. Float is `late_finish - end`; a task
//! is critical when its float is within the configured tolerance.

use chrono::{Datelike, NaiveDate};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::CriticalPathConfig;
use crate::graph::DependencyGraph;
use crate::interner::Slot;
use crate::models::{DependencyType, Task, TaskId};
use crate::{log_checks, log_debug};

/// Late-schedule timing for one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskTiming {
    /// Latest finish that does not delay the project end.
    pub late_finish: NaiveDate,
    /// `late_finish` minus the task's duration.
    pub late_start: NaiveDate,
    /// Days the finish can slip; negative when already behind.
    pub float_days: i64,
}

impl TaskTiming {
    pub fn is_critical(&self, tolerance_days: i64) -> bool {
        self.float_days <= tolerance_days
    }
}

/// Result of a critical path analysis.
#[derive(Clone, Debug, Default)]
pub struct CriticalPathResult {
    /// Latest end date across scheduled tasks; `None` if nothing is scheduled.
    pub project_end: Option<NaiveDate>,
    /// Timing of every scheduled task.
    pub timings: FxHashMap<TaskId, TaskTiming>,
    /// Tasks whose float is within the tolerance.
    pub critical_tasks: FxHashSet<TaskId>,
}

impl CriticalPathResult {
    pub fn is_critical(&self, id: TaskId) -> bool {
        self.critical_tasks.contains(&id)
    }
}

#[inline]
fn day_number(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

/// Convert a day number back to a date, clamped to chrono's range.
fn day_to_date(day: i64) -> NaiveDate {
    let clamped = day.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    NaiveDate::from_num_days_from_ce_opt(clamped).unwrap_or(if day < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

const UNVISITED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const DONE: u8 = 2;

/// Scheduled task data in day numbers, indexed by slot.
struct DayRange {
    end: i64,
    duration: i64,
}

/// Constraint a successor puts on the predecessor's late finish.
#[inline]
fn late_finish_constraint(
    kind: DependencyType,
    succ_late_finish: i64,
    succ_duration: i64,
    task_duration: i64,
) -> i64 {
    let succ_late_start = succ_late_finish - succ_duration;
    match kind {
        DependencyType::FinishToStart => succ_late_start,
        DependencyType::StartToStart => succ_late_start + task_duration,
        DependencyType::FinishToFinish => succ_late_finish,
        DependencyType::StartToFinish => succ_late_finish + task_duration,
    }
}

/// Backward pass over the scheduled part of the graph.
struct BackwardPass<'g, 'a> {
    graph: &'g DependencyGraph<'a>,
    ranges: Vec<Option<DayRange>>,
    project_end: i64,
    state: Vec<u8>,
    late_finish: Vec<i64>,
}

impl<'g, 'a> BackwardPass<'g, 'a> {
    fn new(
        graph: &'g DependencyGraph<'a>,
        ranges: Vec<Option<DayRange>>,
        project_end: i64,
    ) -> Self {
        let n = ranges.len();
        Self {
            graph,
            ranges,
            project_end,
            state: vec![UNVISITED; n],
            late_finish: vec![project_end; n],
        }
    }

    /// Compute late finish of `root` and every scheduled task it reaches.
    ///
    /// Depth-first with an explicit stack so long chains cannot overflow the
    /// thread stack. Edges are visited in the same order a recursive
    /// definition would; a successor still in progress (a cycle) counts as
    /// finishing at the project end.
    fn visit(&mut self, root: Slot) {
        if self.state[root as usize] != UNVISITED {
            return;
        }
        let graph = self.graph;
        // (slot, next successor edge, tightest constraint so far)
        let mut stack: Vec<(Slot, usize, Option<i64>)> = vec![(root, 0, None)];
        self.state[root as usize] = IN_PROGRESS;

        while let Some((slot, cursor, best)) = stack.last().copied() {
            let edges = graph.successor_edges(slot);
            if cursor == edges.len() {
                self.late_finish[slot as usize] = best.unwrap_or(self.project_end);
                self.state[slot as usize] = DONE;
                stack.pop();
                continue;
            }

            let edge = edges[cursor];
            let succ_duration = match self.ranges[edge.slot as usize].as_ref() {
                Some(range) => range.duration,
                None => {
                    // Unscheduled successors put no constraint on the task
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    continue;
                }
            };

            let succ_late_finish = match self.state[edge.slot as usize] {
                DONE => self.late_finish[edge.slot as usize],
                IN_PROGRESS => {
                    log_checks!(
                        graph.verbosity(),
                        "critical path: cycle through {}, using project end",
                        graph.id_at(edge.slot)
                    );
                    self.project_end
                }
                _ => {
                    self.state[edge.slot as usize] = IN_PROGRESS;
                    stack.push((edge.slot, 0, None));
                    continue;
                }
            };

            let task_duration = self.ranges[slot as usize]
                .as_ref()
                .map_or(0, |range| range.duration);
            let constraint =
                late_finish_constraint(edge.kind, succ_late_finish, succ_duration, task_duration);
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
                frame.2 = Some(best.map_or(constraint, |b| b.min(constraint)));
            }
        }
    }
}

/// Analyze the graph's critical path.
///
/// Unscheduled tasks are skipped entirely, and links to them are ignored.
pub fn analyze(graph: &DependencyGraph<'_>, config: &CriticalPathConfig) -> CriticalPathResult {
    let verbosity = graph.verbosity();

    let ranges: Vec<Option<DayRange>> = graph
        .slots()
        .map(|slot| {
            graph.range_at(slot).map(|r| DayRange {
                end: day_number(r.end()),
                duration: r.duration_days(),
            })
        })
        .collect();

    let Some(project_end) = ranges.iter().flatten().map(|r| r.end).max() else {
        return CriticalPathResult::default();
    };

    let mut pass = BackwardPass::new(graph, ranges, project_end);
    for slot in graph.slots() {
        if pass.ranges[slot as usize].is_some() {
            pass.visit(slot);
        }
    }

    let mut result = CriticalPathResult {
        project_end: Some(day_to_date(project_end)),
        ..Default::default()
    };

    for slot in graph.slots() {
        let Some(range) = pass.ranges[slot as usize].as_ref() else {
            continue;
        };
        let id = graph.id_at(slot);
        let late_finish = pass.late_finish[slot as usize];
        let timing = TaskTiming {
            late_finish: day_to_date(late_finish),
            late_start: day_to_date(late_finish - range.duration),
            float_days: late_finish - range.end,
        };
        log_debug!(
            verbosity,
            "critical path: {} late finish {} float {}",
            id,
            timing.late_finish,
            timing.float_days
        );
        if timing.is_critical(config.tolerance_days) {
            result.critical_tasks.insert(id);
        }
        result.timings.insert(id, timing);
    }

    log_checks!(
        verbosity,
        "critical path: {} of {} scheduled tasks critical (tolerance {} days)",
        result.critical_tasks.len(),
        result.timings.len(),
        config.tolerance_days
    );
    result
}

/// Ids of the tasks on, or within tolerance of, the critical path.
pub fn compute_critical_set(tasks: &[Task], config: &CriticalPathConfig) -> FxHashSet<TaskId> {
    let graph = DependencyGraph::new(tasks);
    analyze(&graph, config).critical_tasks
}
