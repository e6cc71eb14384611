use thiserror::Error;

/// Precondition failures for segment edits. The model is left untouched
/// whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("segment {index} does not exist (timeline has {len} segments)")]
    OutOfRange { index: usize, len: usize },
    #[error("segment {index} is locked; unlock it to change its timing")]
    Locked { index: usize },
    #[error("select at least two segments to merge")]
    TooFewSelected,
    #[error("select consecutive segments to merge")]
    NotConsecutive,
    #[error("segment bounds must be finite numbers")]
    NonFiniteBounds,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// A segment whose range cannot be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DegenerateRange {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveValidationError {
    #[error("{} segment(s) end at or before their start: {}", .0.len(), describe(.0))]
    DegenerateRanges(Vec<DegenerateRange>),
}

fn describe(ranges: &[DegenerateRange]) -> String {
    ranges
        .iter()
        .map(|r| format!("#{} [{:.3}, {:.3}]", r.index + 1, r.start, r.end))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_consecutive_message() {
        assert_eq!(
            EditError::NotConsecutive.to_string(),
            "select consecutive segments to merge"
        );
    }

    #[test]
    fn test_degenerate_message_lists_segments_one_based() {
        let err = SaveValidationError::DegenerateRanges(vec![DegenerateRange {
            index: 0,
            start: 3.0,
            end: 2.0,
        }]);
        let msg = err.to_string();
        assert!(msg.starts_with("1 segment(s)"));
        assert!(msg.contains("#1 [3.000, 2.000]"));
    }
}
