//! Cascade of a committed date change through dependent tasks.

use std::collections::VecDeque;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::config::CascadeConfig;
use crate::graph::DependencyGraph;
use crate::interner::Slot;
use crate::models::{DateRange, ScheduleUpdate, Task, TaskId};
use crate::{log_changes, log_checks};

/// Whole days the anchor moved between two dates.
fn anchor_delta(old_anchor: NaiveDate, new_anchor: NaiveDate) -> i64 {
    (new_anchor - old_anchor).num_days()
}

/// Propagate `root`'s move to `new_range` through its successors.
///
/// Breadth-first from the root. For each successor link, the predecessor's
/// anchor (finish for FS/FF, start for SS/SF) is compared before and after the
/// move; a non-zero delta shifts the successor's whole range by that many
/// days and the successor is enqueued so the shift keeps rippling. A zero
/// delta leaves the successor alone and stops propagation through that link.
///
/// Each task is shifted at most once (first arrival wins), the root is never
/// shifted, and unscheduled successors are skipped, so cycles terminate.
///
/// The root's own update is only included when `config.include_root` is set.
/// An unknown or unscheduled root yields no updates.
pub fn propagate(
    graph: &DependencyGraph<'_>,
    root: TaskId,
    new_range: DateRange,
    config: &CascadeConfig,
) -> Vec<ScheduleUpdate> {
    let verbosity = graph.verbosity();
    let Some(root_slot) = graph.slot(root) else {
        log_checks!(verbosity, "cascade: root {} not in snapshot", root);
        return Vec::new();
    };
    let Some(old_range) = graph.range_at(root_slot) else {
        log_checks!(verbosity, "cascade: root {} has no previous range", root);
        return Vec::new();
    };

    let mut updates = Vec::new();
    if config.include_root {
        updates.push(ScheduleUpdate::new(root, new_range));
    }

    let mut finalized = vec![false; graph.len()];
    finalized[root_slot as usize] = true;

    // (slot, range before the move, range after the move)
    let mut queue: VecDeque<(Slot, DateRange, DateRange)> = VecDeque::new();
    queue.push_back((root_slot, old_range, new_range));

    while let Some((slot, old, new)) = queue.pop_front() {
        let current = graph.id_at(slot);
        for edge in graph.successor_edges(slot) {
            let succ_id = graph.id_at(edge.slot);
            let delta = anchor_delta(edge.kind.anchor(&old), edge.kind.anchor(&new));
            if delta == 0 {
                log_checks!(
                    verbosity,
                    "cascade: {} anchor of {} unchanged, {} untouched",
                    edge.kind,
                    current,
                    succ_id
                );
                continue;
            }
            if finalized[edge.slot as usize] {
                log_checks!(verbosity, "cascade: {} already moved, skipping", succ_id);
                continue;
            }
            let Some(succ_old) = graph.range_at(edge.slot) else {
                log_checks!(verbosity, "cascade: {} unscheduled, skipping", succ_id);
                continue;
            };
            let Some(succ_new) = succ_old.shifted(delta) else {
                log_checks!(
                    verbosity,
                    "cascade: shifting {} by {} days leaves the calendar, skipping",
                    succ_id,
                    delta
                );
                continue;
            };

            finalized[edge.slot as usize] = true;
            log_changes!(
                verbosity,
                "cascade: {} {} -> {} ({:+} days via {} from {})",
                succ_id,
                succ_old,
                succ_new,
                delta,
                edge.kind,
                current
            );
            updates.push(ScheduleUpdate::new(succ_id, succ_new));
            queue.push_back((edge.slot, succ_old, succ_new));
        }
    }

    updates
}

/// Return a copy of `tasks` with `updates` applied.
///
/// Updates naming unknown tasks or carrying an inverted range are ignored.
pub fn apply_updates(tasks: &[Task], updates: &[ScheduleUpdate]) -> Vec<Task> {
    let by_id: FxHashMap<TaskId, DateRange> = updates
        .iter()
        .filter_map(|u| u.range().map(|range| (u.task_id, range)))
        .collect();

    tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if let Some(&range) = by_id.get(&task.id) {
                task.range = Some(range);
            }
            task
        })
        .collect()
}
