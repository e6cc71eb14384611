use std::collections::VecDeque;

use super::segment::Segment;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Bounded undo/redo stacks of whole-timeline snapshots.
///
/// Segment counts are small (tens), so full snapshots are cheaper to reason
/// about than inverse operations.
pub struct EditHistory {
    undo: VecDeque<Vec<Segment>>,
    redo: Vec<Vec<Segment>>,
    limit: usize,
}

impl EditHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records the state before a successful edit. Invalidates redo.
    pub fn record(&mut self, before: Vec<Segment>) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
        self.redo.clear();
    }

    /// Pops the latest snapshot, stashing `current` for redo.
    pub fn undo(&mut self, current: Vec<Segment>) -> Option<Vec<Segment>> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Vec<Segment>) -> Option<Vec<Segment>> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
