//! Precedence constraint validation for a proposed date-range edit.
//!
//! The validator is a short-circuiting existence check: it returns the first
//! violated link it meets, checking the moved task's own predecessors before
//! the tasks that depend on it. The interactive editor blocks the edit on any
//! violation, so it never needs the full list.

use crate::graph::DependencyGraph;
use crate::models::{DateRange, DependencyType, TaskId, Violation};
use crate::{log_changes, log_checks};

/// Overshoot in days of a single link; positive means violated.
///
/// Public so callers that need an exhaustive report can loop over links
/// themselves.
pub fn link_overshoot(
    predecessor: &DateRange,
    successor: &DateRange,
    kind: DependencyType,
) -> i64 {
    kind.overshoot(predecessor, successor)
}

fn describe(kind: DependencyType, successor: TaskId, predecessor: TaskId) -> String {
    match kind {
        DependencyType::FinishToStart => {
            format!("task {successor} must start after task {predecessor} finishes")
        }
        DependencyType::StartToStart => {
            format!("task {successor} cannot start before task {predecessor} starts")
        }
        DependencyType::FinishToFinish => {
            format!("task {successor} cannot finish before task {predecessor} finishes")
        }
        DependencyType::StartToFinish => {
            format!("task {successor} cannot finish before task {predecessor} starts")
        }
    }
}

/// Check whether moving `moved` to `proposed` would violate a constraint.
///
/// 1. As successor: each predecessor's actual range against the proposed range.
/// 2. As predecessor: the proposed range against each dependent's actual range.
///
/// Unscheduled tasks on the other side of a link are skipped. Returns the
/// first violation found, or `None`.
pub fn check_violation(
    graph: &DependencyGraph<'_>,
    moved: TaskId,
    proposed: &DateRange,
) -> Option<Violation> {
    let verbosity = graph.verbosity();
    let Some(slot) = graph.slot(moved) else {
        log_checks!(verbosity, "validate: task {} not in snapshot", moved);
        return None;
    };

    for edge in graph.predecessor_edges(slot) {
        let pred_id = graph.id_at(edge.slot);
        let Some(pred_range) = graph.range_at(edge.slot) else {
            log_checks!(verbosity, "validate: predecessor {} unscheduled, skipping", pred_id);
            continue;
        };
        let overshoot = edge.kind.overshoot(&pred_range, proposed);
        log_checks!(
            verbosity,
            "validate: {} {} -> {} overshoot {}",
            edge.kind,
            pred_id,
            moved,
            overshoot
        );
        if overshoot > 0 {
            let violation = Violation {
                kind: edge.kind,
                predecessor_id: pred_id,
                successor_id: moved,
                overshoot_days: overshoot,
                message: format!(
                    "Task {} conflicts with its predecessor {}: {} ({} link, {} day(s) over)",
                    moved,
                    pred_id,
                    describe(edge.kind, moved, pred_id),
                    edge.kind,
                    overshoot
                ),
            };
            log_changes!(verbosity, "validate: {}", violation.message);
            return Some(violation);
        }
    }

    for edge in graph.successor_edges(slot) {
        let succ_id = graph.id_at(edge.slot);
        let Some(succ_range) = graph.range_at(edge.slot) else {
            log_checks!(verbosity, "validate: dependent {} unscheduled, skipping", succ_id);
            continue;
        };
        let overshoot = edge.kind.overshoot(proposed, &succ_range);
        log_checks!(
            verbosity,
            "validate: {} {} -> {} overshoot {}",
            edge.kind,
            moved,
            succ_id,
            overshoot
        );
        if overshoot > 0 {
            let violation = Violation {
                kind: edge.kind,
                predecessor_id: moved,
                successor_id: succ_id,
                overshoot_days: overshoot,
                message: format!(
                    "Moving task {} conflicts with dependent task {}: {} ({} link, {} day(s) over)",
                    moved,
                    succ_id,
                    describe(edge.kind, succ_id, moved),
                    edge.kind,
                    overshoot
                ),
            };
            log_changes!(verbosity, "validate: {}", violation.message);
            return Some(violation);
        }
    }

    None
}
