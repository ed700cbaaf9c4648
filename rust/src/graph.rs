//! Dependency graph built from a task snapshot.
//!
//! Each task's predecessor links are resolved against the snapshot and the
//! inverse (successor) adjacency is built once, so the validator, cascade and
//! critical path analysis never re-walk the whole snapshot per lookup.

use rustc_hash::FxHashMap;

use crate::interner::{Slot, TaskIndex};
use crate::log_debug;
use crate::models::{DateRange, DependencyLink, DependencyType, SuccessorLink, Task, TaskId};

/// Resolved link to another task in the same graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    pub slot: Slot,
    pub kind: DependencyType,
}

/// Dependency graph over an immutable snapshot.
///
/// Dangling links (predecessor not in the snapshot) are dropped during the
/// build. Cycles are kept, self links included: consumers guard against them.
pub struct DependencyGraph<'a> {
    tasks: &'a [Task],
    index: TaskIndex,
    /// Position in `tasks` for each slot.
    positions: Vec<usize>,
    /// Predecessor edges indexed by slot.
    predecessors: Vec<Vec<Edge>>,
    /// Successor edges indexed by slot, in snapshot order of the successor.
    successors: Vec<Vec<Edge>>,
    dropped_links: usize,
    verbosity: u8,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self::with_verbosity(tasks, 0)
    }

    pub fn with_verbosity(tasks: &'a [Task], verbosity: u8) -> Self {
        let mut index = TaskIndex::with_capacity(tasks.len());
        let mut positions = Vec::with_capacity(tasks.len());
        let mut dropped_links = 0;

        for (position, task) in tasks.iter().enumerate() {
            let (_, inserted) = index.insert(task.id);
            if inserted {
                positions.push(position);
            } else {
                // First occurrence wins; the duplicate's links go with it
                dropped_links += task.dependencies.len();
                log_debug!(verbosity, "graph: ignoring duplicate task {}", task.id);
            }
        }

        let n = index.len();
        let mut predecessors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<Edge>> = vec![Vec::new(); n];

        for slot in index.slots() {
            let task = &tasks[positions[slot as usize]];
            for link in &task.dependencies {
                let Some(pred_slot) = index.slot(link.predecessor) else {
                    dropped_links += 1;
                    log_debug!(
                        verbosity,
                        "graph: dropping dangling link {} -> {} ({})",
                        link.predecessor,
                        task.id,
                        link.kind
                    );
                    continue;
                };
                predecessors[slot as usize].push(Edge {
                    slot: pred_slot,
                    kind: link.kind,
                });
                successors[pred_slot as usize].push(Edge {
                    slot,
                    kind: link.kind,
                });
            }
        }

        Self {
            tasks,
            index,
            positions,
            predecessors,
            successors,
            dropped_links,
            verbosity,
        }
    }

    #[inline]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Number of distinct tasks in the graph.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Links discarded while building (dangling, self, or on duplicate tasks).
    pub fn dropped_links(&self) -> usize {
        self.dropped_links
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.slot(id).is_some()
    }

    pub fn task(&self, id: TaskId) -> Option<&'a Task> {
        self.index.slot(id).map(|slot| self.task_at(slot))
    }

    pub fn range(&self, id: TaskId) -> Option<DateRange> {
        self.task(id).and_then(|t| t.range)
    }

    /// Tasks in snapshot order (duplicates excluded).
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.index.slots().map(move |slot| self.task_at(slot))
    }

    /// Resolved predecessor links of a task.
    pub fn predecessors(&self, id: TaskId) -> impl Iterator<Item = DependencyLink> + '_ {
        self.index
            .slot(id)
            .into_iter()
            .flat_map(move |slot| self.predecessor_edges(slot))
            .map(move |edge| DependencyLink::new(self.index.id(edge.slot), edge.kind))
    }

    /// Tasks that list `id` as a predecessor, in snapshot order.
    pub fn successors(&self, id: TaskId) -> impl Iterator<Item = SuccessorLink> + '_ {
        self.index
            .slot(id)
            .into_iter()
            .flat_map(move |slot| self.successor_edges(slot))
            .map(move |edge| SuccessorLink {
                successor: self.index.id(edge.slot),
                kind: edge.kind,
            })
    }

    /// Owned successor adjacency: predecessor id -> its successor links.
    ///
    /// Tasks without successors are absent from the map.
    pub fn successor_map(&self) -> FxHashMap<TaskId, Vec<SuccessorLink>> {
        self.index
            .slots()
            .filter(|&slot| !self.successors[slot as usize].is_empty())
            .map(|slot| {
                let id = self.index.id(slot);
                (id, self.successors(id).collect())
            })
            .collect()
    }

    /// Find one dependency cycle, if any, as the ids along it.
    ///
    /// Diagnostic only: no component rejects cyclic graphs.
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        const UNVISITED: u8 = 0;
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNVISITED; self.len()];
        // (slot, next successor edge to try)
        let mut stack: Vec<(Slot, usize)> = Vec::new();

        for root in self.index.slots() {
            if state[root as usize] != UNVISITED {
                continue;
            }
            state[root as usize] = ON_PATH;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (slot, cursor) = *frame;
                let edges = &self.successors[slot as usize];
                if cursor == edges.len() {
                    state[slot as usize] = DONE;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let next = edges[cursor].slot;
                match state[next as usize] {
                    UNVISITED => {
                        state[next as usize] = ON_PATH;
                        stack.push((next, 0));
                    }
                    ON_PATH => {
                        let start = stack.iter().position(|&(s, _)| s == next).unwrap_or(0);
                        return Some(
                            stack[start..]
                                .iter()
                                .map(|&(s, _)| self.index.id(s))
                                .collect(),
                        );
                    }
                    _ => {}
                }
            }
        }
        None
    }

    // Slot-level accessors for the analysis modules.

    #[inline]
    pub(crate) fn slot(&self, id: TaskId) -> Option<Slot> {
        self.index.slot(id)
    }

    #[inline]
    pub(crate) fn id_at(&self, slot: Slot) -> TaskId {
        self.index.id(slot)
    }

    #[inline]
    pub(crate) fn task_at(&self, slot: Slot) -> &'a Task {
        &self.tasks[self.positions[slot as usize]]
    }

    #[inline]
    pub(crate) fn range_at(&self, slot: Slot) -> Option<DateRange> {
        self.task_at(slot).range
    }

    #[inline]
    pub(crate) fn predecessor_edges(&self, slot: Slot) -> &[Edge] {
        &self.predecessors[slot as usize]
    }

    #[inline]
    pub(crate) fn successor_edges(&self, slot: Slot) -> &[Edge] {
        &self.successors[slot as usize]
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = Slot> {
        self.index.slots()
    }
}
