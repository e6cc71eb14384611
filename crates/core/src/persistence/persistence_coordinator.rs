use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::persistence::domain::job::{
    segments_from_sentences, sentences_from_segments, Job, Sentence,
};
use crate::persistence::domain::job_service::{JobService, JobServiceError};
use crate::timeline::domain::edit_error::SaveValidationError;
use crate::timeline::domain::segment::Segment;
use crate::timeline::domain::segment_list::SegmentList;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error(transparent)]
    Validation(#[from] SaveValidationError),
    #[error(transparent)]
    Service(#[from] JobServiceError),
    #[error("a save or refine is already in progress for this job")]
    Busy,
}

/// A validated snapshot ready to submit, tagged with the model version it
/// was taken from.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSave {
    pub version: u64,
    pub sentences: Vec<Sentence>,
}

/// Outcome of save-then-refine. `saved_version` is set whenever the save
/// step reached the server, even if refinement then failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineAttempt {
    pub saved_version: Option<u64>,
    pub result: Result<Option<Vec<Segment>>, PersistenceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineOutcome {
    Replaced { segments: usize },
    Unchanged,
}

/// A freshly loaded job: metadata plus a clean segment list.
pub struct LoadedJob {
    pub job: Job,
    pub segments: SegmentList,
}

/// Boundary between the in-memory timeline and the job service.
///
/// Validation happens before any network I/O. Saves and refines are
/// serialized per job: while one is running, another for the same job is
/// rejected with [`PersistenceError::Busy`] rather than racing it. Other
/// jobs are unaffected.
pub struct PersistenceCoordinator {
    service: Arc<dyn JobService>,
    in_flight: Mutex<HashSet<String>>,
}

impl PersistenceCoordinator {
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self {
            service,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_busy(&self, job_id: &str) -> bool {
        self.jobs_in_flight().contains(job_id)
    }

    pub fn load(&self, job_id: &str) -> Result<LoadedJob, JobServiceError> {
        let mut job = self.service.load_job(job_id)?;
        let sentences = job.sentences.take().unwrap_or_default();
        let segments = SegmentList::from_segments(segments_from_sentences(sentences));
        log::info!("loaded job {job_id}: {} segments", segments.len());
        Ok(LoadedJob { job, segments })
    }

    /// Validates `segments` and snapshots the normalized result.
    pub fn prepare_save(segments: &SegmentList) -> Result<PendingSave, SaveValidationError> {
        let normalized = segments.validate_for_save()?;
        Ok(PendingSave {
            version: segments.version(),
            sentences: sentences_from_segments(&normalized),
        })
    }

    /// Submits a prepared snapshot. Returns the version that is now persisted.
    pub fn submit(&self, job_id: &str, pending: &PendingSave) -> Result<u64, PersistenceError> {
        let _gate = self.acquire(job_id)?;
        self.submit_unguarded(job_id, pending)
    }

    /// Submits a prepared snapshot, then asks the service to refine it.
    pub fn submit_then_refine(&self, job_id: &str, pending: &PendingSave) -> RefineAttempt {
        let _gate = match self.acquire(job_id) {
            Ok(gate) => gate,
            Err(e) => {
                return RefineAttempt {
                    saved_version: None,
                    result: Err(e),
                }
            }
        };

        let saved_version = match self.submit_unguarded(job_id, pending) {
            Ok(version) => version,
            Err(e) => {
                return RefineAttempt {
                    saved_version: None,
                    result: Err(e),
                }
            }
        };

        let result = match self.service.refine(job_id) {
            Ok(sentences) if sentences.is_empty() => {
                log::info!("refine for job {job_id} returned no sentences; keeping timeline");
                Ok(None)
            }
            Ok(sentences) => {
                log::info!("refine for job {job_id} returned {} sentences", sentences.len());
                Ok(Some(segments_from_sentences(sentences)))
            }
            Err(e) => {
                log::warn!("refine for job {job_id} failed: {e}");
                Err(PersistenceError::Service(e))
            }
        };

        RefineAttempt {
            saved_version: Some(saved_version),
            result,
        }
    }

    /// Validates and submits `segments`, marking them clean on success.
    pub fn save(&self, job_id: &str, segments: &mut SegmentList) -> Result<u64, PersistenceError> {
        let pending = Self::prepare_save(segments)?;
        let version = self.submit(job_id, &pending)?;
        segments.mark_saved(version);
        Ok(version)
    }

    /// Saves, refines, and on a non-empty result replaces the whole
    /// timeline. Prior locks and accuracy scores are not carried over.
    pub fn refine_boundaries(
        &self,
        job_id: &str,
        segments: &mut SegmentList,
    ) -> Result<RefineOutcome, PersistenceError> {
        let pending = Self::prepare_save(segments)?;
        let attempt = self.submit_then_refine(job_id, &pending);
        Self::apply_refine(segments, attempt)
    }

    /// Applies a refine attempt to `segments`. A committed save is
    /// recorded even when refinement itself failed.
    pub fn apply_refine(
        segments: &mut SegmentList,
        attempt: RefineAttempt,
    ) -> Result<RefineOutcome, PersistenceError> {
        if let Some(version) = attempt.saved_version {
            segments.mark_saved(version);
        }
        match attempt.result? {
            Some(refined) => {
                let count = refined.len();
                segments.replace_all(refined);
                segments.mark_saved(segments.version());
                Ok(RefineOutcome::Replaced { segments: count })
            }
            None => Ok(RefineOutcome::Unchanged),
        }
    }

    fn submit_unguarded(&self, job_id: &str, pending: &PendingSave) -> Result<u64, PersistenceError> {
        self.service
            .update_sentences(job_id, &pending.sentences)
            .map_err(|e| {
                log::warn!("saving job {job_id} failed: {e}");
                PersistenceError::Service(e)
            })?;
        log::info!(
            "saved {} sentences for job {job_id} (version {})",
            pending.sentences.len(),
            pending.version
        );
        Ok(pending.version)
    }

    fn acquire(&self, job_id: &str) -> Result<InFlightGate<'_>, PersistenceError> {
        if !self.jobs_in_flight().insert(job_id.to_string()) {
            return Err(PersistenceError::Busy);
        }
        Ok(InFlightGate {
            coordinator: self,
            job_id: job_id.to_string(),
        })
    }

    fn jobs_in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct InFlightGate<'a> {
    coordinator: &'a PersistenceCoordinator,
    job_id: String,
}

impl Drop for InFlightGate<'_> {
    fn drop(&mut self) {
        self.coordinator.jobs_in_flight().remove(&self.job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::domain::segment::TextField;
    use std::sync::Mutex;

    // ─── Stubs ───

    #[derive(Default)]
    struct StubJobService {
        stored: Mutex<Option<Vec<Sentence>>>,
        updates: Mutex<usize>,
        update_error: Option<JobServiceError>,
        refine_result: Mutex<Option<Result<Vec<Sentence>, JobServiceError>>>,
    }

    impl JobService for StubJobService {
        fn load_job(&self, job_id: &str) -> Result<Job, JobServiceError> {
            Ok(Job {
                id: job_id.to_string(),
                audio_url: None,
                sentences: self.stored.lock().unwrap().clone(),
                status: None,
            })
        }

        fn update_sentences(&self, _: &str, sentences: &[Sentence]) -> Result<(), JobServiceError> {
            *self.updates.lock().unwrap() += 1;
            if let Some(e) = &self.update_error {
                return Err(e.clone());
            }
            *self.stored.lock().unwrap() = Some(sentences.to_vec());
            Ok(())
        }

        fn refine(&self, _: &str) -> Result<Vec<Sentence>, JobServiceError> {
            self.refine_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn sentence(start: f64, end: f64, text: &str) -> Sentence {
        Sentence {
            index: None,
            start,
            end,
            text: text.to_string(),
            translated_text: None,
            accuracy: None,
        }
    }

    fn coordinator(service: StubJobService) -> (PersistenceCoordinator, Arc<StubJobService>) {
        let service = Arc::new(service);
        (PersistenceCoordinator::new(service.clone()), service)
    }

    fn timeline() -> SegmentList {
        SegmentList::from_segments(vec![
            Segment::new(0, 0.0, 2.0, "a"),
            Segment::new(1, 2.0, 5.0, "b"),
        ])
    }

    #[test]
    fn test_save_invalid_range_makes_no_network_call() {
        let (coord, service) = coordinator(StubJobService::default());
        let mut segments = SegmentList::from_segments(vec![Segment::new(0, 3.0, 2.0, "bad")]);

        let err = coord.save("job", &mut segments).unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
        assert_eq!(*service.updates.lock().unwrap(), 0);
    }

    #[test]
    fn test_save_submits_and_marks_clean() {
        let (coord, service) = coordinator(StubJobService::default());
        let mut segments = timeline();
        segments.update_text(0, TextField::Text, "edited").unwrap();
        assert!(segments.is_dirty());

        coord.save("job", &mut segments).unwrap();
        assert!(!segments.is_dirty());
        let stored = service.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "edited");
        assert_eq!(stored[1].index, Some(1));
    }

    #[test]
    fn test_reload_after_save_reproduces_list() {
        let (coord, _service) = coordinator(StubJobService::default());
        let mut segments = timeline();
        segments.split(1).unwrap();
        coord.save("job", &mut segments).unwrap();

        let loaded = coord.load("job").unwrap();
        assert_eq!(loaded.segments.segments(), segments.segments());
        assert!(!loaded.segments.is_dirty());
    }

    #[test]
    fn test_save_after_reordering_drag_matches_reload() {
        let (coord, _service) = coordinator(StubJobService::default());
        let mut segments = SegmentList::from_segments(vec![
            Segment::new(0, 0.0, 1.0, "a"),
            Segment::new(1, 1.0, 2.0, "b"),
            Segment::new(2, 2.0, 3.0, "c"),
        ]);
        segments.update_region(0, 3.5, 3.9).unwrap();

        coord.save("job", &mut segments).unwrap();
        assert!(!segments.is_dirty());
        let texts: Vec<_> = segments.segments().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);

        let loaded = coord.load("job").unwrap();
        assert_eq!(loaded.segments.segments(), segments.segments());
    }

    #[test]
    fn test_save_failure_surfaces_server_message_and_stays_dirty() {
        let (coord, _service) = coordinator(StubJobService {
            update_error: Some(JobServiceError::Server {
                status: 500,
                message: "database is read-only".to_string(),
            }),
            ..Default::default()
        });
        let mut segments = timeline();
        segments.toggle_lock(0).unwrap();
        let before = segments.clone();

        let err = coord.save("job", &mut segments).unwrap_err();
        assert_eq!(err.to_string(), "database is read-only");
        assert_eq!(segments, before);
        assert!(segments.is_dirty());
    }

    #[test]
    fn test_load_tolerates_missing_sentences() {
        let (coord, _service) = coordinator(StubJobService::default());
        let loaded = coord.load("job").unwrap();
        assert!(loaded.segments.is_empty());
        assert_eq!(loaded.job.id, "job");
    }

    #[test]
    fn test_refine_replaces_whole_timeline() {
        let service = StubJobService::default();
        *service.refine_result.lock().unwrap() = Some(Ok(vec![
            sentence(0.1, 1.9, "a"),
            sentence(1.9, 3.0, "b1"),
            sentence(3.0, 5.0, "b2"),
        ]));
        let (coord, service) = coordinator(service);
        let mut segments = timeline();
        segments.toggle_lock(0).unwrap();

        let outcome = coord.refine_boundaries("job", &mut segments).unwrap();
        assert_eq!(outcome, RefineOutcome::Replaced { segments: 3 });
        assert_eq!(segments.len(), 3);
        assert!(segments.segments().iter().all(|s| !s.locked));
        assert_eq!(segments.segments()[2].index, 2);
        assert!(!segments.is_dirty());
        assert_eq!(*service.updates.lock().unwrap(), 1);
    }

    #[test]
    fn test_refine_empty_result_keeps_timeline() {
        let (coord, _service) = coordinator(StubJobService::default());
        let mut segments = timeline();
        segments.update_text(1, TextField::Text, "x").unwrap();
        let expected = segments.segments().to_vec();

        let outcome = coord.refine_boundaries("job", &mut segments).unwrap();
        assert_eq!(outcome, RefineOutcome::Unchanged);
        assert_eq!(segments.segments(), &expected[..]);
        assert!(!segments.is_dirty());
    }

    #[test]
    fn test_refine_failure_keeps_committed_save() {
        let service = StubJobService::default();
        *service.refine_result.lock().unwrap() = Some(Err(JobServiceError::Server {
            status: 503,
            message: "aligner offline".to_string(),
        }));
        let (coord, service) = coordinator(service);
        let mut segments = timeline();
        segments.update_text(0, TextField::Text, "saved first").unwrap();
        let expected = segments.segments().to_vec();

        let err = coord.refine_boundaries("job", &mut segments).unwrap_err();
        assert_eq!(err.to_string(), "aligner offline");
        assert_eq!(segments.segments(), &expected[..]);
        assert!(!segments.is_dirty());
        assert!(service.stored.lock().unwrap().is_some());
    }

    #[test]
    fn test_refine_with_invalid_timeline_is_rejected_before_io() {
        let (coord, service) = coordinator(StubJobService::default());
        let mut segments = timeline();
        segments.update_region(0, 2.0, 2.0).unwrap();
        assert!(matches!(
            coord.refine_boundaries("job", &mut segments),
            Err(PersistenceError::Validation(_))
        ));
        assert_eq!(*service.updates.lock().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_submit_is_rejected() {
        let (coord, service) = coordinator(StubJobService::default());
        let pending = PersistenceCoordinator::prepare_save(&timeline()).unwrap();

        let gate = coord.acquire("job").unwrap();
        assert!(coord.is_busy("job"));
        assert_eq!(coord.submit("job", &pending), Err(PersistenceError::Busy));
        let attempt = coord.submit_then_refine("job", &pending);
        assert_eq!(attempt.result, Err(PersistenceError::Busy));
        assert!(attempt.saved_version.is_none());
        drop(gate);

        assert!(!coord.is_busy("job"));
        assert!(coord.submit("job", &pending).is_ok());
        assert_eq!(*service.updates.lock().unwrap(), 1);
    }

    #[test]
    fn test_gate_released_after_failure() {
        let (coord, _service) = coordinator(StubJobService {
            update_error: Some(JobServiceError::Transport("refused".to_string())),
            ..Default::default()
        });
        let mut segments = timeline();
        assert!(coord.save("job", &mut segments).is_err());
        assert!(!coord.is_busy("job"));
    }

    #[test]
    fn test_save_for_other_job_is_not_blocked() {
        let (coord, service) = coordinator(StubJobService::default());
        let pending = PersistenceCoordinator::prepare_save(&timeline()).unwrap();

        let _gate = coord.acquire("job-a").unwrap();
        assert!(!coord.is_busy("job-b"));
        assert_eq!(coord.submit("job-b", &pending), Ok(pending.version));
        assert_eq!(coord.submit("job-a", &pending), Err(PersistenceError::Busy));
        assert_eq!(*service.updates.lock().unwrap(), 1);
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let (coord, _service) = coordinator(StubJobService::default());
        let mut segments = timeline();
        segments.update_text(0, TextField::Text, "v1").unwrap();
        let pending = PersistenceCoordinator::prepare_save(&segments).unwrap();

        segments.update_text(0, TextField::Text, "v2").unwrap();
        let version = coord.submit("job", &pending).unwrap();
        segments.mark_saved(version);
        assert!(segments.is_dirty());
    }
}
