use super::edit_error::{DegenerateRange, EditError, SaveValidationError};
use super::segment::{Segment, TextField};

/// Outcome of a boundary update coming from a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionUpdate {
    Applied,
    /// The target is locked; dragging a locked region has no effect.
    IgnoredLocked,
}

/// Ordered, index-consistent collection of segments.
///
/// Every successful mutation bumps `version`; failed operations leave both
/// the segments and the version untouched. Structural operations (split,
/// merge, add, delete) renumber all indices before returning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentList {
    segments: Vec<Segment>,
    version: u64,
    saved_version: u64,
}

impl SegmentList {
    /// Builds a list from ingested segments: stable sort by start, then
    /// dense re-indexing. The result is considered clean.
    pub fn from_segments(mut segments: Vec<Segment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        let mut list = Self {
            segments,
            version: 0,
            saved_version: 0,
        };
        list.reindex();
        list
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.version != self.saved_version
    }

    /// Marks the state that was submitted at `version` as persisted. Edits
    /// made after that version keep the list dirty.
    ///
    /// When `version` is the current one, the list adopts the normalized
    /// order that was submitted, so positions match what the server stores.
    /// Returns whether that reordered the list.
    pub fn mark_saved(&mut self, version: u64) -> bool {
        if version <= self.saved_version || version > self.version {
            return false;
        }
        self.saved_version = version;
        if version != self.version {
            return false;
        }
        match self.validate_for_save() {
            Ok(normalized) if normalized != self.segments => {
                self.segments = normalized;
                true
            }
            _ => false,
        }
    }

    /// First segment whose half-open range contains `time`.
    pub fn segment_at(&self, time: f64) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(time))
    }

    /// Replaces the segment at `index` with two halves split at its midpoint.
    /// The first half keeps text, translation and lock state; the second
    /// starts empty and unlocked.
    pub fn split(&mut self, index: usize) -> Result<(), EditError> {
        let segment = self.unlocked(index)?;
        let mid = segment.midpoint();
        let second = Segment::new(index + 1, mid, segment.end, String::new());

        self.segments[index].end = mid;
        self.segments.insert(index + 1, second);
        self.commit_structural();
        Ok(())
    }

    /// Merges strictly consecutive, unlocked segments into one spanning
    /// their combined range. Returns the index of the merged segment.
    pub fn merge(&mut self, indices: &[usize]) -> Result<usize, EditError> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        if sorted.len() < 2 {
            return Err(EditError::TooFewSelected);
        }
        for &index in &sorted {
            self.existing(index)?;
        }
        if sorted.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(EditError::NotConsecutive);
        }
        if let Some(&index) = sorted.iter().find(|&&i| self.segments[i].locked) {
            return Err(EditError::Locked { index });
        }

        let first = sorted[0];
        let last = sorted[sorted.len() - 1];
        let members = &self.segments[first..=last];

        let start = members.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
        let end = members.iter().map(|s| s.end).fold(f64::NEG_INFINITY, f64::max);
        let text = join_non_empty(members.iter().map(|s| s.text.as_str()));
        let translated = join_non_empty(
            members
                .iter()
                .filter_map(|s| s.translated_text.as_deref()),
        );

        let mut merged = Segment::new(first, start, end, text);
        merged.translated_text = if translated.is_empty() {
            None
        } else {
            Some(translated)
        };

        self.segments.drain(first..=last);
        self.segments.insert(first, merged);
        self.commit_structural();
        Ok(first)
    }

    /// Appends a segment of `duration` seconds right after the last one.
    /// Returns the new segment's index.
    pub fn add_segment(&mut self, duration: f64) -> usize {
        let start = self.segments.last().map_or(0.0, |s| s.end);
        let index = self.segments.len();
        self.segments
            .push(Segment::new(index, start, start + duration, String::new()));
        self.commit_structural();
        index
    }

    /// Removes the segment at `index`.
    pub fn delete(&mut self, index: usize) -> Result<Segment, EditError> {
        self.unlocked(index)?;
        let removed = self.segments.remove(index);
        self.commit_structural();
        Ok(removed)
    }

    /// Overwrites a segment's bounds. Clamping is the caller's job; the
    /// range may be transiently inverted until save-time validation.
    pub fn update_region(
        &mut self,
        index: usize,
        start: f64,
        end: f64,
    ) -> Result<RegionUpdate, EditError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(EditError::NonFiniteBounds);
        }
        if self.existing(index)?.locked {
            return Ok(RegionUpdate::IgnoredLocked);
        }

        let segment = &mut self.segments[index];
        segment.start = start;
        segment.end = end;
        self.version += 1;
        Ok(RegionUpdate::Applied)
    }

    /// Flips the lock flag and returns the new state.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, EditError> {
        self.existing(index)?;
        let segment = &mut self.segments[index];
        segment.locked = !segment.locked;
        self.version += 1;
        Ok(segment.locked)
    }

    pub fn update_text(
        &mut self,
        index: usize,
        field: TextField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        self.existing(index)?;
        self.segments[index].set_text(field, value.into());
        self.version += 1;
        Ok(())
    }

    /// Checks every range and returns a start-sorted, re-indexed copy
    /// ready for submission. Does not mutate the list.
    pub fn validate_for_save(&self) -> Result<Vec<Segment>, SaveValidationError> {
        let degenerate: Vec<DegenerateRange> = self
            .segments
            .iter()
            .filter(|s| s.is_degenerate())
            .map(|s| DegenerateRange {
                index: s.index,
                start: s.start,
                end: s.end,
            })
            .collect();
        if !degenerate.is_empty() {
            return Err(SaveValidationError::DegenerateRanges(degenerate));
        }

        let mut normalized = self.segments.clone();
        normalized.sort_by(|a, b| a.start.total_cmp(&b.start));
        for (i, segment) in normalized.iter_mut().enumerate() {
            segment.index = i;
        }
        Ok(normalized)
    }

    /// Swaps in a whole new segment vector (undo/redo, refine results).
    /// Counts as a mutation.
    pub fn replace_all(&mut self, mut segments: Vec<Segment>) {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.segments = segments;
        self.commit_structural();
    }

    fn existing(&self, index: usize) -> Result<&Segment, EditError> {
        self.segments.get(index).ok_or(EditError::OutOfRange {
            index,
            len: self.segments.len(),
        })
    }

    fn unlocked(&self, index: usize) -> Result<Segment, EditError> {
        let segment = self.existing(index)?;
        if segment.locked {
            return Err(EditError::Locked { index });
        }
        Ok(segment.clone())
    }

    fn commit_structural(&mut self) {
        self.reindex();
        self.version += 1;
    }

    fn reindex(&mut self) {
        for (i, segment) in self.segments.iter_mut().enumerate() {
            segment.index = i;
        }
    }
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
