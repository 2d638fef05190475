// SPDX-License-Identifier: MIT

//! Linear undo/redo history over graph snapshots

use std::collections::VecDeque;

use super::graph::GraphSnapshot;

/// Default number of retained snapshots
pub const MAX_HISTORY: usize = 50;

/// Bounded history with branch-discard semantics.
///
/// `cursor` addresses the snapshot matching the current graph. Committing
/// from a non-tip position drops everything after the cursor.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<GraphSnapshot>,
    cursor: usize,
    limit: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_limit(MAX_HISTORY)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.max(1) + 1),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn commit(&mut self, snapshot: GraphSnapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back; the caller applies the returned snapshot
    pub fn undo(&mut self) -> Option<&GraphSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&GraphSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    pub fn current(&self) -> Option<&GraphSnapshot> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::graph::{GraphModel, NodeKind, Point};

    /// Graph with `n` input nodes, committed after each add
    fn build(history: &mut HistoryStack, n: usize) -> GraphModel {
        let mut graph = GraphModel::new();
        history.commit(graph.snapshot());
        for i in 0..n {
            graph.add_node(NodeKind::Input, Point::new(i as f64, 0.0), None);
            history.commit(graph.snapshot());
        }
        graph
    }

    #[test]
    fn test_empty_history_cannot_move() {
        let mut history = HistoryStack::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_then_redo_restores_state() {
        let mut history = HistoryStack::new();
        let mut graph = build(&mut history, 3);
        let before = graph.snapshot();

        let snap = history.undo().cloned().unwrap();
        graph.restore(&snap);
        assert_eq!(graph.len(), 2);

        let snap = history.redo().cloned().unwrap();
        graph.restore(&snap);
        assert_eq!(graph.snapshot(), before);
        assert_eq!(graph.next_id(), before.next_id());
    }

    #[test]
    fn test_undo_stops_at_first_entry() {
        let mut history = HistoryStack::new();
        build(&mut history, 2);
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
        assert_eq!(history.current().unwrap().nodes().count(), 0);
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let mut history = HistoryStack::new();
        let mut graph = build(&mut history, 3);
        let snap = history.undo().cloned().unwrap();
        graph.restore(&snap);
        let snap = history.undo().cloned().unwrap();
        graph.restore(&snap);

        graph.add_node(NodeKind::Output, Point::default(), None);
        history.commit(graph.snapshot());

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_history_capped_and_oldest_evicted() {
        let mut history = HistoryStack::new();
        build(&mut history, 60);
        assert_eq!(history.len(), MAX_HISTORY);

        let mut steps = 0;
        while history.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, MAX_HISTORY - 1);
        // 61 states were committed; the oldest retained one has 11 nodes
        assert_eq!(history.current().unwrap().nodes().count(), 11);
    }

    #[test]
    fn test_custom_limit() {
        let mut history = HistoryStack::with_limit(3);
        build(&mut history, 10);
        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
    }
}
