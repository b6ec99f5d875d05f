// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

/// Sentinel slot value for nodes not currently in the heap.
const NO_SLOT: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Entry {
    node: usize,
    key: f64,
}

/// Min-priority queue of trial points, keyed by tentative distance magnitude.
///
/// A binary heap over (key, node) pairs augmented with a side table mapping
/// each node's flat grid index to its current heap slot, so an existing
/// entry's key can be decreased and re-sifted in O(log n) without removal
/// and reinsertion. Ties in key are broken by node index, which makes the
/// extraction order fully deterministic.
///
/// Each trial point owns exactly one entry; it is removed exactly once, when
/// the point is promoted to known.
#[derive(Debug)]
pub struct TrialHeap {
    entries: Vec<Entry>,
    slots: Vec<usize>,
}

impl TrialHeap {
    /// Create an empty heap able to track nodes with flat indices below
    /// `num_nodes`.
    pub fn new(num_nodes: usize) -> Self {
        TrialHeap {
            entries: Vec::new(),
            slots: vec![NO_SLOT; num_nodes],
        }
    }

    /// Number of trial entries currently in the heap.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the heap holds no entries. Loop-termination signal for the
    /// marching driver, not an error.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the node currently has an entry.
    pub fn contains(&self, node: usize) -> bool {
        self.slots[node] != NO_SLOT
    }

    /// Insert a node with the given key.
    ///
    /// The node must not already be in the heap.
    pub fn insert(&mut self, node: usize, key: f64) {
        debug_assert_eq!(self.slots[node], NO_SLOT, "node {} already queued", node);
        let slot = self.entries.len();
        self.entries.push(Entry { node, key });
        self.slots[node] = slot;
        self.sift_up(slot);
    }

    /// Remove and return the entry with the minimal (key, node) pair, or
    /// `None` if the heap is empty.
    pub fn pop_min(&mut self) -> Option<(usize, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let min = self.entries[0];
        self.slots[min.node] = NO_SLOT;
        let last = self.entries.pop().expect("heap is non-empty");
        if !self.entries.is_empty() {
            self.entries[0] = last;
            self.slots[last.node] = 0;
            self.sift_down(0);
        }
        Some((min.node, min.key))
    }

    /// Decrease the key of an existing entry and restore heap order.
    ///
    /// Keys equal to or larger than the current key leave the entry
    /// untouched (tentative distances are non-increasing over time).
    /// Returns whether the key changed.
    pub fn decrease_key(&mut self, node: usize, key: f64) -> bool {
        let slot = self.slots[node];
        debug_assert_ne!(slot, NO_SLOT, "node {} not in heap", node);
        if key >= self.entries[slot].key {
            return false;
        }
        self.entries[slot].key = key;
        self.sift_up(slot);
        true
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let (ea, eb) = (&self.entries[a], &self.entries[b]);
        ea.key < eb.key || (ea.key == eb.key && ea.node < eb.node)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].node] = a;
        self.slots[self.entries[b].node] = b;
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * slot + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.less(right, left) {
                child = right;
            }
            if !self.less(child, slot) {
                break;
            }
            self.swap(slot, child);
            slot = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_in_key_order() {
        let mut heap = TrialHeap::new(8);
        heap.insert(3, 2.5);
        heap.insert(0, 1.0);
        heap.insert(5, 0.25);
        heap.insert(7, 4.0);

        assert_eq!(heap.pop_min(), Some((5, 0.25)));
        assert_eq!(heap.pop_min(), Some((0, 1.0)));
        assert_eq!(heap.pop_min(), Some((3, 2.5)));
        assert_eq!(heap.pop_min(), Some((7, 4.0)));
        assert_eq!(heap.pop_min(), None);
    }

    #[test]
    fn ties_broken_by_node_index() {
        let mut heap = TrialHeap::new(8);
        heap.insert(6, 1.0);
        heap.insert(2, 1.0);
        heap.insert(4, 1.0);

        assert_eq!(heap.pop_min(), Some((2, 1.0)));
        assert_eq!(heap.pop_min(), Some((4, 1.0)));
        assert_eq!(heap.pop_min(), Some((6, 1.0)));
    }

    #[test]
    fn decrease_key_reorders() {
        let mut heap = TrialHeap::new(8);
        heap.insert(0, 3.0);
        heap.insert(1, 2.0);
        heap.insert(2, 1.0);

        assert!(heap.decrease_key(0, 0.5));
        assert_eq!(heap.pop_min(), Some((0, 0.5)));
        assert_eq!(heap.pop_min(), Some((2, 1.0)));
        assert_eq!(heap.pop_min(), Some((1, 2.0)));
    }

    #[test]
    fn decrease_key_ignores_larger_values() {
        let mut heap = TrialHeap::new(4);
        heap.insert(1, 2.0);
        assert!(!heap.decrease_key(1, 2.0));
        assert!(!heap.decrease_key(1, 5.0));
        assert_eq!(heap.pop_min(), Some((1, 2.0)));
    }

    #[test]
    fn membership_tracking() {
        let mut heap = TrialHeap::new(4);
        assert!(!heap.contains(2));
        heap.insert(2, 1.5);
        assert!(heap.contains(2));
        assert_eq!(heap.len(), 1);
        heap.pop_min();
        assert!(!heap.contains(2));
        assert!(heap.is_empty());
    }

    #[test]
    fn interleaved_operations_stay_consistent() {
        let mut heap = TrialHeap::new(64);
        // Insert in a scrambled order, decrease a few, then drain.
        for i in 0..64usize {
            let key = ((i * 37) % 64) as f64;
            heap.insert(i, key);
        }
        for i in (0..64usize).step_by(7) {
            heap.decrease_key(i, -1.0 - i as f64);
        }

        let mut prev = f64::NEG_INFINITY;
        let mut count = 0;
        while let Some((_, key)) = heap.pop_min() {
            assert!(key >= prev, "heap order violated: {} after {}", key, prev);
            prev = key;
            count += 1;
        }
        assert_eq!(count, 64);
    }
}
