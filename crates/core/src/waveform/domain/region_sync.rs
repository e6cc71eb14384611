use crate::timeline::domain::edit_error::EditError;
use crate::timeline::domain::segment_list::{RegionUpdate, SegmentList};

use super::region::{RegionPalette, RegionState, WaveRegion};
use super::waveform_view::{RegionDragEnd, WaveformView};

/// What happened to a drag-end event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Applied { index: usize },
    IgnoredLocked { index: usize },
    /// Region id was not an index, pointed past the end of the timeline,
    /// or carried non-finite bounds.
    IgnoredStale,
    /// The editor is read-only.
    IgnoredReadOnly,
}

/// Keeps waveform regions in step with the segment model.
///
/// Regions are always derived from the model on demand; the adapter holds
/// only presentation settings, never segment state.
pub struct RegionSyncAdapter {
    palette: RegionPalette,
    editable: bool,
    audio_duration: Option<f64>,
}

impl RegionSyncAdapter {
    pub fn new(palette: RegionPalette, editable: bool) -> Self {
        Self {
            palette,
            editable,
            audio_duration: None,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Known audio length, used to clamp drags. Non-positive values are ignored.
    pub fn set_audio_duration(&mut self, duration: Option<f64>) {
        self.audio_duration = duration.filter(|d| d.is_finite() && *d > 0.0);
    }

    pub fn audio_duration(&self) -> Option<f64> {
        self.audio_duration
    }

    pub fn derive_regions(&self, segments: &SegmentList, active: Option<usize>) -> Vec<WaveRegion> {
        segments
            .segments()
            .iter()
            .map(|s| {
                let state = if s.locked {
                    RegionState::Locked
                } else if active == Some(s.index) {
                    RegionState::Active
                } else {
                    RegionState::Idle
                };
                let interactive = self.editable && !s.locked;
                WaveRegion {
                    id: WaveRegion::id_for(s.index),
                    start: s.start,
                    end: s.end,
                    color: self.palette.color_for(state).to_string(),
                    draggable: interactive,
                    resizable: interactive,
                }
            })
            .collect()
    }

    /// Pushes the current model state and interactivity to `view`.
    pub fn sync(&self, view: &mut dyn WaveformView, segments: &SegmentList, active: Option<usize>) {
        view.set_interactive(self.editable);
        view.render_regions(&self.derive_regions(segments, active));
    }

    /// Applies a drag-end gesture to the model.
    ///
    /// Stale or malformed events are dropped rather than reported: the
    /// renderer may still be showing regions from before a split or merge.
    pub fn handle_drag_end(&self, segments: &mut SegmentList, event: &RegionDragEnd) -> DragOutcome {
        if !self.editable {
            return DragOutcome::IgnoredReadOnly;
        }
        let Some(index) = WaveRegion::parse_id(&event.region_id) else {
            log::debug!("ignoring drag on unknown region id {:?}", event.region_id);
            return DragOutcome::IgnoredStale;
        };
        if !event.start.is_finite() || !event.end.is_finite() {
            return DragOutcome::IgnoredStale;
        }

        let (start, end) = self.clamp(event.start, event.end);
        match segments.update_region(index, start, end) {
            Ok(RegionUpdate::Applied) => DragOutcome::Applied { index },
            Ok(RegionUpdate::IgnoredLocked) => DragOutcome::IgnoredLocked { index },
            Err(EditError::OutOfRange { .. }) | Err(EditError::NonFiniteBounds) => {
                log::debug!("ignoring stale drag on region {index}");
                DragOutcome::IgnoredStale
            }
            Err(e) => {
                log::warn!("unexpected drag rejection on region {index}: {e}");
                DragOutcome::IgnoredStale
            }
        }
    }

    fn clamp(&self, start: f64, end: f64) -> (f64, f64) {
        let upper = self.audio_duration.unwrap_or(f64::INFINITY);
        (start.max(0.0).min(upper), end.max(0.0).min(upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::domain::segment::Segment;
    use crate::waveform::domain::region::{
        DEFAULT_ACTIVE_COLOR, DEFAULT_LOCKED_COLOR, DEFAULT_REGION_COLOR,
    };

    fn timeline() -> SegmentList {
        SegmentList::from_segments(vec![
            Segment::new(0, 0.0, 2.0, "a"),
            Segment::new(1, 2.0, 5.0, "b"),
            Segment::new(2, 5.0, 7.0, "c"),
        ])
    }

    fn adapter() -> RegionSyncAdapter {
        RegionSyncAdapter::new(RegionPalette::default(), true)
    }

    #[derive(Default)]
    struct RecordingView {
        regions: Vec<WaveRegion>,
        interactive: Option<bool>,
        renders: usize,
    }

    impl WaveformView for RecordingView {
        fn render_regions(&mut self, regions: &[WaveRegion]) {
            self.regions = regions.to_vec();
            self.renders += 1;
        }

        fn set_interactive(&mut self, interactive: bool) {
            self.interactive = Some(interactive);
        }
    }

    #[test]
    fn test_derive_one_region_per_segment() {
        let regions = adapter().derive_regions(&timeline(), None);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[1].id, "1");
        assert_eq!((regions[1].start, regions[1].end), (2.0, 5.0));
        assert!(regions.iter().all(|r| r.color == DEFAULT_REGION_COLOR));
    }

    #[test]
    fn test_derive_colors_active_and_locked() {
        let mut segments = timeline();
        segments.toggle_lock(2).unwrap();
        let regions = adapter().derive_regions(&segments, Some(1));
        assert_eq!(regions[0].color, DEFAULT_REGION_COLOR);
        assert_eq!(regions[1].color, DEFAULT_ACTIVE_COLOR);
        assert_eq!(regions[2].color, DEFAULT_LOCKED_COLOR);
        assert!(!regions[2].draggable);
        assert!(regions[1].draggable);
    }

    #[test]
    fn test_locked_takes_precedence_over_active() {
        let mut segments = timeline();
        segments.toggle_lock(0).unwrap();
        let regions = adapter().derive_regions(&segments, Some(0));
        assert_eq!(regions[0].color, DEFAULT_LOCKED_COLOR);
    }

    #[test]
    fn test_read_only_disables_handles_but_keeps_regions() {
        let mut a = adapter();
        a.set_editable(false);
        let regions = a.derive_regions(&timeline(), None);
        assert_eq!(regions.len(), 3);
        assert!(regions.iter().all(|r| !r.draggable && !r.resizable));
    }

    #[test]
    fn test_drag_end_updates_model() {
        let mut segments = timeline();
        let outcome = adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("1", 2.5, 4.5));
        assert_eq!(outcome, DragOutcome::Applied { index: 1 });
        assert_eq!((segments.segments()[1].start, segments.segments()[1].end), (2.5, 4.5));
    }

    #[test]
    fn test_drag_end_with_malformed_id_ignored() {
        let mut segments = timeline();
        let before = segments.clone();
        let outcome = adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("abc", 0.0, 1.0));
        assert_eq!(outcome, DragOutcome::IgnoredStale);
        assert_eq!(segments, before);
    }

    #[test]
    fn test_drag_end_after_merge_is_tolerated() {
        let mut segments = timeline();
        segments.merge(&[1, 2]).unwrap();
        let before = segments.clone();
        let outcome = adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("2", 5.0, 6.0));
        assert_eq!(outcome, DragOutcome::IgnoredStale);
        assert_eq!(segments, before);
    }

    #[test]
    fn test_drag_end_on_locked_region_is_noop() {
        let mut segments = timeline();
        segments.toggle_lock(0).unwrap();
        let before = segments.clone();
        let outcome = adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("0", 0.0, 5.0));
        assert_eq!(outcome, DragOutcome::IgnoredLocked { index: 0 });
        assert_eq!(segments, before);
    }

    #[test]
    fn test_drag_end_read_only_ignored() {
        let mut segments = timeline();
        let mut a = adapter();
        a.set_editable(false);
        let outcome = a.handle_drag_end(&mut segments, &RegionDragEnd::new("0", 0.0, 1.0));
        assert_eq!(outcome, DragOutcome::IgnoredReadOnly);
    }

    #[test]
    fn test_drag_end_clamped_to_audio_bounds() {
        let mut segments = timeline();
        let mut a = adapter();
        a.set_audio_duration(Some(6.0));
        a.handle_drag_end(&mut segments, &RegionDragEnd::new("2", -1.0, 9.0));
        assert_eq!((segments.segments()[2].start, segments.segments()[2].end), (0.0, 6.0));
    }

    #[test]
    fn test_drag_end_unknown_duration_only_clamps_negative() {
        let mut segments = timeline();
        adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("2", -1.0, 90.0));
        assert_eq!((segments.segments()[2].start, segments.segments()[2].end), (0.0, 90.0));
    }

    #[test]
    fn test_drag_end_nan_is_ignored() {
        let mut segments = timeline();
        let outcome =
            adapter().handle_drag_end(&mut segments, &RegionDragEnd::new("0", f64::NAN, 1.0));
        assert_eq!(outcome, DragOutcome::IgnoredStale);
    }

    #[test]
    fn test_sync_survives_view_recreation() {
        let mut segments = timeline();
        let a = adapter();
        let mut first = RecordingView::default();
        a.sync(&mut first, &segments, None);

        a.handle_drag_end(&mut segments, &RegionDragEnd::new("0", 0.5, 1.5));
        drop(first);

        let mut recreated = RecordingView::default();
        a.sync(&mut recreated, &segments, Some(0));
        assert_eq!(recreated.renders, 1);
        assert_eq!(recreated.interactive, Some(true));
        assert_eq!((recreated.regions[0].start, recreated.regions[0].end), (0.5, 1.5));
        assert_eq!(recreated.regions[0].color, DEFAULT_ACTIVE_COLOR);
    }

    #[test]
    fn test_set_audio_duration_rejects_non_positive() {
        let mut a = adapter();
        a.set_audio_duration(Some(0.0));
        assert!(a.audio_duration().is_none());
        a.set_audio_duration(Some(f64::NAN));
        assert!(a.audio_duration().is_none());
        a.set_audio_duration(Some(3.0));
        assert_eq!(a.audio_duration(), Some(3.0));
    }
}
