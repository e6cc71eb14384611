use std::collections::BTreeSet;

use super::edit_error::EditError;
use super::segment_list::SegmentList;

/// Transient set of segment indices picked for a merge.
///
/// Any index may be toggled; adjacency and lock checks belong to
/// [`SegmentList::merge`], whose rejection is passed through unchanged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes `index`. Returns true when it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn can_merge(&self) -> bool {
        self.indices.len() >= 2
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.indices.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Merges the selected segments; the selection is cleared only on success.
    pub fn merge_into(&mut self, segments: &mut SegmentList) -> Result<usize, EditError> {
        if !self.can_merge() {
            return Err(EditError::TooFewSelected);
        }
        let merged = segments.merge(&self.indices())?;
        self.clear();
        Ok(merged)
    }
}
