use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::persistence::domain::audio_url_resolver::AudioSource;
use crate::persistence::infrastructure::persistence_worker::{
    self, PersistenceJob, PersistenceMessage,
};
use crate::persistence::persistence_coordinator::{
    PersistenceCoordinator, PersistenceError, RefineAttempt, RefineOutcome,
};
use crate::playback::domain::audio_player::AudioPlayer;
use crate::playback::domain::bounded_playback::{BoundedPlayback, PlaybackError, Tick};
use crate::shared::settings::EditorSettings;
use crate::timeline::domain::edit_error::EditError;
use crate::timeline::domain::edit_history::EditHistory;
use crate::timeline::domain::segment::{Segment, TextField};
use crate::timeline::domain::segment_list::SegmentList;
use crate::timeline::domain::selection::Selection;
use crate::waveform::domain::region::WaveRegion;
use crate::waveform::domain::region_sync::{DragOutcome, RegionSyncAdapter};
use crate::waveform::domain::waveform_view::{RegionDragEnd, WaveformView};

use super::session_logger::SessionLogger;

/// Effect of a persistence result on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceUpdate {
    Saved { version: u64 },
    Refined(RefineOutcome),
    /// The result belonged to another job.
    Ignored,
}

/// Everything the editor holds for one open job.
///
/// The segment list is the single source of truth; regions, the active
/// indicator and the dirty flag are all derived from it. Dropping the
/// session tears down the playback monitor.
pub struct EditorSession {
    job_id: String,
    segments: SegmentList,
    selection: Selection,
    history: EditHistory,
    regions: RegionSyncAdapter,
    playback: BoundedPlayback,
    audio: AudioSource,
    coordinator: Arc<PersistenceCoordinator>,
    logger: Box<dyn SessionLogger>,
    default_duration: f64,
    in_flight: Option<Receiver<PersistenceMessage>>,
}

impl EditorSession {
    pub fn open(
        job_id: impl Into<String>,
        segments: SegmentList,
        audio: AudioSource,
        player: Box<dyn AudioPlayer>,
        coordinator: Arc<PersistenceCoordinator>,
        settings: &EditorSettings,
        mut logger: Box<dyn SessionLogger>,
    ) -> Self {
        let job_id = job_id.into();
        logger.info(&format!(
            "opened with {} segments, audio {}",
            segments.len(),
            audio.url().unwrap_or("unavailable")
        ));
        Self {
            job_id,
            segments,
            selection: Selection::new(),
            history: EditHistory::new(settings.history_limit),
            regions: RegionSyncAdapter::new(settings.palette.clone(), !settings.read_only),
            playback: BoundedPlayback::new(player),
            audio,
            coordinator,
            logger,
            default_duration: settings.default_segment_duration,
            in_flight: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn audio(&self) -> &AudioSource {
        &self.audio
    }

    pub fn is_dirty(&self) -> bool {
        self.segments.is_dirty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn active_segment(&self) -> Option<usize> {
        self.playback.active_segment()
    }

    // ─── Edits ───

    pub fn split(&mut self, index: usize) -> Result<(), EditError> {
        let before = self.snapshot();
        let result = self.segments.split(index);
        if result.is_ok() {
            self.selection.clear();
        }
        self.finish("split", before, result)
    }

    pub fn toggle_select(&mut self, index: usize) -> Result<bool, EditError> {
        if index >= self.segments.len() {
            return Err(EditError::OutOfRange {
                index,
                len: self.segments.len(),
            });
        }
        Ok(self.selection.toggle(index))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn merge_selected(&mut self) -> Result<usize, EditError> {
        let before = self.snapshot();
        let result = self.selection.merge_into(&mut self.segments);
        self.finish("merge", before, result)
    }

    pub fn add_segment(&mut self) -> usize {
        let before = self.snapshot();
        let index = self.segments.add_segment(self.default_duration);
        self.history.record(before);
        self.logger.operation("add");
        index
    }

    pub fn delete(&mut self, index: usize) -> Result<Segment, EditError> {
        let before = self.snapshot();
        let result = self.segments.delete(index);
        if result.is_ok() {
            self.selection.clear();
        }
        self.finish("delete", before, result)
    }

    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, EditError> {
        let before = self.snapshot();
        let result = self.segments.toggle_lock(index);
        self.finish("lock", before, result)
    }

    pub fn update_text(
        &mut self,
        index: usize,
        field: TextField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        let before = self.snapshot();
        let result = self.segments.update_text(index, field, value);
        self.finish("text", before, result)
    }

    pub fn handle_drag_end(&mut self, event: &RegionDragEnd) -> DragOutcome {
        let before = self.snapshot();
        let outcome = self.regions.handle_drag_end(&mut self.segments, event);
        match outcome {
            DragOutcome::Applied { .. } => {
                self.history.record(before);
                self.logger.operation("drag");
            }
            DragOutcome::IgnoredLocked { index } => {
                self.logger
                    .rejected("drag", &format!("segment {index} is locked"));
            }
            DragOutcome::IgnoredStale | DragOutcome::IgnoredReadOnly => {}
        }
        outcome
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        let current = self.snapshot();
        let Some(previous) = self.history.undo(current) else {
            return Err(EditError::NothingToUndo);
        };
        self.restore("undo", previous);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EditError> {
        let current = self.snapshot();
        let Some(next) = self.history.redo(current) else {
            return Err(EditError::NothingToRedo);
        };
        self.restore("redo", next);
        Ok(())
    }

    // ─── Waveform ───

    pub fn set_editable(&mut self, editable: bool) {
        self.regions.set_editable(editable);
    }

    pub fn is_editable(&self) -> bool {
        self.regions.is_editable()
    }

    pub fn set_audio_duration(&mut self, duration: Option<f64>) {
        self.regions.set_audio_duration(duration);
    }

    pub fn regions(&self) -> Vec<WaveRegion> {
        self.regions
            .derive_regions(&self.segments, self.playback.active_segment())
    }

    pub fn sync_view(&self, view: &mut dyn WaveformView) {
        self.regions
            .sync(view, &self.segments, self.playback.active_segment());
    }

    // ─── Playback ───

    pub fn play_segment(&mut self, index: usize) -> Result<(), PlaybackError> {
        if !self.audio.is_available() {
            self.logger
                .rejected("play", &PlaybackError::AudioUnavailable.to_string());
            return Err(PlaybackError::AudioUnavailable);
        }
        self.playback.play_segment(&self.segments, index)
    }

    pub fn on_time_update(&mut self, time: f64) -> Tick {
        self.playback.on_time_update(time, &self.segments)
    }

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if !self.audio.is_available() {
            return Err(PlaybackError::AudioUnavailable);
        }
        self.playback.play();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn seek(&mut self, seconds: f64) {
        self.playback.seek(seconds);
    }

    // ─── Persistence ───

    /// Validates and saves on the calling thread.
    pub fn save(&mut self) -> Result<u64, PersistenceError> {
        if self.in_flight.is_some() {
            return Err(PersistenceError::Busy);
        }
        let before = self.snapshot();
        let result = self.coordinator.save(&self.job_id, &mut self.segments);
        if result.is_ok() {
            self.after_save(&before);
        }
        self.report("save", &result);
        result
    }

    /// Saves, refines and applies the result on the calling thread.
    pub fn refine(&mut self) -> Result<RefineOutcome, PersistenceError> {
        if self.in_flight.is_some() {
            return Err(PersistenceError::Busy);
        }
        let before = self.snapshot();
        let result = self
            .coordinator
            .refine_boundaries(&self.job_id, &mut self.segments);
        match result {
            Ok(RefineOutcome::Replaced { .. }) => self.after_replace(),
            _ => self.after_save(&before),
        }
        self.report("refine", &result);
        result
    }

    /// Starts a save (or save-then-refine) on a worker thread. Validation
    /// runs here, so an invalid timeline never reaches the worker.
    pub fn start_background(&mut self, job: PersistenceJob) -> Result<(), PersistenceError> {
        if self.in_flight.is_some() || self.coordinator.is_busy(&self.job_id) {
            return Err(PersistenceError::Busy);
        }
        let pending = PersistenceCoordinator::prepare_save(&self.segments).map_err(|e| {
            self.logger.rejected("save", &e.to_string());
            PersistenceError::Validation(e)
        })?;
        self.in_flight = Some(persistence_worker::spawn(
            self.coordinator.clone(),
            self.job_id.clone(),
            pending,
            job,
        ));
        Ok(())
    }

    pub fn is_persisting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies the background result if it has arrived.
    pub fn poll_persistence(&mut self) -> Option<Result<PersistenceUpdate, PersistenceError>> {
        let rx = self.in_flight.as_ref()?;
        match rx.try_recv() {
            Ok(message) => {
                self.in_flight = None;
                Some(self.apply_persistence_message(message))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("persistence worker for job {} exited without a result", self.job_id);
                self.in_flight = None;
                None
            }
        }
    }

    /// Applies a worker result. Results tagged with another job id are
    /// dropped.
    pub fn apply_persistence_message(
        &mut self,
        message: PersistenceMessage,
    ) -> Result<PersistenceUpdate, PersistenceError> {
        if message.job_id() != self.job_id {
            log::debug!(
                "dropping persistence result for job {} in session {}",
                message.job_id(),
                self.job_id
            );
            return Ok(PersistenceUpdate::Ignored);
        }

        match message {
            PersistenceMessage::Saved { version, .. } => {
                if self.segments.mark_saved(version) {
                    self.after_reorder();
                }
                self.logger.operation("save");
                Ok(PersistenceUpdate::Saved { version })
            }
            PersistenceMessage::Refined {
                saved_version,
                segments,
                ..
            } => {
                let result = self.apply_refine(Some(saved_version), Ok(Some(segments)));
                result.map(PersistenceUpdate::Refined)
            }
            PersistenceMessage::RefineUnchanged { saved_version, .. } => {
                let result = self.apply_refine(Some(saved_version), Ok(None));
                result.map(PersistenceUpdate::Refined)
            }
            PersistenceMessage::Failed {
                saved_version,
                error,
                ..
            } => {
                if let Some(version) = saved_version {
                    if self.segments.mark_saved(version) {
                        self.after_reorder();
                    }
                }
                self.logger.rejected("save", &error.to_string());
                Err(error)
            }
        }
    }

    fn apply_refine(
        &mut self,
        saved_version: Option<u64>,
        result: Result<Option<Vec<Segment>>, PersistenceError>,
    ) -> Result<RefineOutcome, PersistenceError> {
        let before = self.snapshot();
        let outcome = PersistenceCoordinator::apply_refine(
            &mut self.segments,
            RefineAttempt {
                saved_version,
                result,
            },
        );
        match outcome {
            Ok(RefineOutcome::Replaced { .. }) => self.after_replace(),
            _ => self.after_save(&before),
        }
        self.report("refine", &outcome);
        outcome
    }

    // ─── Internals ───

    fn snapshot(&self) -> Vec<Segment> {
        self.segments.segments().to_vec()
    }

    fn finish<T>(
        &mut self,
        name: &str,
        before: Vec<Segment>,
        result: Result<T, EditError>,
    ) -> Result<T, EditError> {
        match &result {
            Ok(_) => {
                self.history.record(before);
                self.logger.operation(name);
            }
            Err(e) => self.logger.rejected(name, &e.to_string()),
        }
        result
    }

    fn restore(&mut self, name: &str, segments: Vec<Segment>) {
        self.segments.replace_all(segments);
        self.selection.clear();
        self.playback.clear_active();
        self.logger.operation(name);
    }

    fn after_replace(&mut self) {
        self.history.clear();
        self.after_reorder();
    }

    /// A save may have normalized the segment order.
    fn after_save(&mut self, before: &[Segment]) {
        if self.segments.segments() != before {
            self.after_reorder();
        }
    }

    /// Positions changed, so selected indices and the active indicator no
    /// longer point at the same segments.
    fn after_reorder(&mut self) {
        self.selection.clear();
        self.playback.clear_active();
    }

    fn report<T>(&mut self, name: &str, result: &Result<T, PersistenceError>) {
        match result {
            Ok(_) => self.logger.operation(name),
            Err(e) => self.logger.rejected(name, &e.to_string()),
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.playback.shutdown();
        self.logger.summary();
    }
}
