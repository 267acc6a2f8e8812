use crate::GroupTable;
use std::collections::VecDeque;

pub const UNDO_DEPTH: usize = 50;

/// Bounded history of whole-table snapshots, most recent last.
///
/// Only the group table is kept here. Fixture changes live in the remote store
/// and are not undone.
#[derive(Debug, Clone)]
pub struct UndoStack {
    snapshots: VecDeque<GroupTable>,
    depth: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_depth(UNDO_DEPTH)
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(depth.min(UNDO_DEPTH)),
            depth: depth.max(1),
        }
    }

    /// Deep-copies `table` onto the stack, dropping the oldest beyond the depth.
    pub fn snapshot(&mut self, table: &GroupTable) {
        self.push(table.clone());
    }

    pub fn push(&mut self, table: GroupTable) {
        self.snapshots.push_back(table);
        while self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
    }

    /// Pops the most recent snapshot, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<GroupTable> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, TeamId, TeamRecord};

    fn table_numbered(n: usize) -> GroupTable {
        let mut table = GroupTable::new();
        table
            .teams_mut(Group::A)
            .push(TeamRecord::new(TeamId::from("t"), format!("team {n}")));
        table
    }

    #[test]
    fn undo_on_empty_stack_reports_nothing() {
        let mut stack = UndoStack::new();
        assert!(stack.undo().is_none());
    }

    #[test]
    fn snapshots_come_back_most_recent_first() {
        let mut stack = UndoStack::new();
        stack.snapshot(&table_numbered(1));
        stack.snapshot(&table_numbered(2));
        assert_eq!(stack.undo(), Some(table_numbered(2)));
        assert_eq!(stack.undo(), Some(table_numbered(1)));
        assert!(stack.is_empty());
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let mut stack = UndoStack::new();
        let mut table = table_numbered(1);
        stack.snapshot(&table);
        table.teams_mut(Group::A)[0].points = 99;
        assert_eq!(stack.undo().unwrap().teams(Group::A)[0].points, 0);
    }

    #[test]
    fn fifty_steps_are_recoverable_and_the_fifty_first_is_gone() {
        let mut stack = UndoStack::new();
        for n in 0..=UNDO_DEPTH {
            stack.snapshot(&table_numbered(n));
        }
        assert_eq!(stack.len(), UNDO_DEPTH);

        for n in (1..=UNDO_DEPTH).rev() {
            assert_eq!(stack.undo(), Some(table_numbered(n)));
        }
        assert!(stack.undo().is_none());
    }
}
