//! Bounded linear undo/redo history of action-list snapshots.
//!
//! Entries are full deep copies; the cursor points at the snapshot matching
//! the current registry. Pushing after an undo drops the redo tail.

use std::collections::VecDeque;

use log::trace;

use crate::entities::Action;

pub const HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Vec<Action>>,
    /// None while empty
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Record a snapshot, discarding any redo tail and evicting the oldest
    /// entry past capacity.
    pub fn push(&mut self, snapshot: &[Action]) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot.to_vec());
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
        trace!("History push: {} entries, cursor {:?}", self.entries.len(), self.cursor);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Step back; returns a copy of the snapshot now under the cursor.
    pub fn undo(&mut self) -> Option<Vec<Action>> {
        if !self.can_undo() {
            return None;
        }
        let c = self.cursor? - 1;
        self.cursor = Some(c);
        trace!("History undo -> {}", c);
        self.entries.get(c).cloned()
    }

    /// Step forward; returns a copy of the snapshot now under the cursor.
    pub fn redo(&mut self) -> Option<Vec<Action>> {
        if !self.can_redo() {
            return None;
        }
        let c = self.cursor? + 1;
        self.cursor = Some(c);
        trace!("History redo -> {}", c);
        self.entries.get(c).cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(n: u32) -> Vec<Action> {
        (0..n).map(|i| Action::new("M", format!("a{i}"), 0, i, 10.0)).collect()
    }

    #[test]
    fn test_empty_history() {
        let mut h = History::new();
        assert!(h.is_empty());
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut h = History::new();
        let (s0, s1, s2) = (snap(0), snap(1), snap(2));
        h.push(&s0);
        h.push(&s1);
        h.push(&s2);

        assert_eq!(h.undo(), Some(s1.clone()));
        assert_eq!(h.undo(), Some(s0.clone()));
        // Beyond the oldest entry
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), Some(s1));
        assert_eq!(h.redo(), Some(s2));
        // Beyond the newest entry
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_push_after_undo_discards_redo() {
        let mut h = History::new();
        h.push(&snap(0));
        h.push(&snap(1));
        h.push(&snap(2));
        h.undo();
        h.undo();
        let branch = snap(5);
        h.push(&branch);
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(h.redo(), None);
        assert_eq!(h.undo().map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = History::new();
        for i in 0..(HISTORY_CAPACITY as u32 + 5) {
            h.push(&snap(i % 3));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        assert_eq!(h.cursor(), Some(HISTORY_CAPACITY - 1));
        let mut undos = 0;
        while h.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, HISTORY_CAPACITY - 1);
    }

    #[test]
    fn test_snapshots_are_independent_copies() {
        let mut h = History::new();
        let mut live = snap(2);
        h.push(&live);
        live[0].move_count = 99;
        h.push(&live);

        let mut restored = h.undo().unwrap();
        assert_eq!(restored[0].move_count, 0);
        restored[0].move_count = 42;
        let again = h.redo().unwrap();
        assert_eq!(again[0].move_count, 99);
        assert_eq!(h.undo().unwrap()[0].move_count, 0);
    }

    #[test]
    fn test_clear() {
        let mut h = History::new();
        h.push(&snap(1));
        h.push(&snap(2));
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.cursor(), None);
        assert!(!h.can_undo());
    }
}
