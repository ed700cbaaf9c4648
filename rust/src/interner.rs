//! Dense slot index for task ids.
//!
//! Maps board task ids (sparse 64-bit integers) to contiguous `u32` slots so
//! graph data can live in plain vectors indexed by slot.

use rustc_hash::FxHashMap;

use crate::models::TaskId;

/// Dense slot of a task within one snapshot.
pub type Slot = u32;

/// Bidirectional TaskId <-> slot mapping.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    to_slot: FxHashMap<TaskId, Slot>,
    from_slot: Vec<TaskId>,
}

impl TaskIndex {
    /// Create a new index with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_slot: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_slot: Vec::with_capacity(capacity),
        }
    }

    /// Register an id, returning `(slot, newly_inserted)`.
    pub fn insert(&mut self, id: TaskId) -> (Slot, bool) {
        if let Some(&slot) = self.to_slot.get(&id) {
            return (slot, false);
        }
        let slot = self.from_slot.len() as Slot;
        self.from_slot.push(id);
        self.to_slot.insert(id, slot);
        (slot, true)
    }

    #[inline]
    pub fn slot(&self, id: TaskId) -> Option<Slot> {
        self.to_slot.get(&id).copied()
    }

    #[inline]
    pub fn id(&self, slot: Slot) -> TaskId {
        self.from_slot[slot as usize]
    }

    pub fn len(&self) -> usize {
        self.from_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_slot.is_empty()
    }

    /// Slots in insertion order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> {
        0..self.from_slot.len() as Slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let mut index = TaskIndex::with_capacity(4);

        let (a, new_a) = index.insert(TaskId(40));
        let (b, new_b) = index.insert(TaskId(7));
        let (a_again, new_again) = index.insert(TaskId(40));

        assert!(new_a && new_b);
        assert!(!new_again);
        assert_eq!(a, a_again);
        assert_ne!(a, b);

        assert_eq!(index.id(a), TaskId(40));
        assert_eq!(index.id(b), TaskId(7));
        assert_eq!(index.slot(TaskId(7)), Some(b));
        assert_eq!(index.slot(TaskId(99)), None);
        assert_eq!(index.slots().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(index.len(), 2);
    }
}
