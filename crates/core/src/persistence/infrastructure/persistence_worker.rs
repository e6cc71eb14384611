use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use crate::persistence::persistence_coordinator::{
    PendingSave, PersistenceCoordinator, PersistenceError,
};
use crate::timeline::domain::segment::Segment;

/// What the worker should do with a prepared snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceJob {
    Save,
    SaveAndRefine,
}

/// Results reported back to the editor thread, tagged with the job id so a
/// session can drop results that belong to a job it no longer shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceMessage {
    Saved {
        job_id: String,
        version: u64,
    },
    Refined {
        job_id: String,
        saved_version: u64,
        segments: Vec<Segment>,
    },
    RefineUnchanged {
        job_id: String,
        saved_version: u64,
    },
    Failed {
        job_id: String,
        saved_version: Option<u64>,
        error: PersistenceError,
    },
}

impl PersistenceMessage {
    pub fn job_id(&self) -> &str {
        match self {
            PersistenceMessage::Saved { job_id, .. }
            | PersistenceMessage::Refined { job_id, .. }
            | PersistenceMessage::RefineUnchanged { job_id, .. }
            | PersistenceMessage::Failed { job_id, .. } => job_id,
        }
    }
}

/// Runs a save (and optionally a refine) on a background thread.
///
/// Exactly one message is sent on the returned receiver.
pub fn spawn(
    coordinator: Arc<PersistenceCoordinator>,
    job_id: String,
    pending: PendingSave,
    job: PersistenceJob,
) -> Receiver<PersistenceMessage> {
    let (tx, rx) = crossbeam_channel::bounded::<PersistenceMessage>(1);

    thread::spawn(move || {
        let message = run(&coordinator, job_id, &pending, job);
        let _ = tx.send(message);
    });

    rx
}

fn run(
    coordinator: &PersistenceCoordinator,
    job_id: String,
    pending: &PendingSave,
    job: PersistenceJob,
) -> PersistenceMessage {
    match job {
        PersistenceJob::Save => match coordinator.submit(&job_id, pending) {
            Ok(version) => PersistenceMessage::Saved { job_id, version },
            Err(error) => PersistenceMessage::Failed {
                job_id,
                saved_version: None,
                error,
            },
        },
        PersistenceJob::SaveAndRefine => {
            let attempt = coordinator.submit_then_refine(&job_id, pending);
            match (attempt.saved_version, attempt.result) {
                (Some(saved_version), Ok(Some(segments))) => PersistenceMessage::Refined {
                    job_id,
                    saved_version,
                    segments,
                },
                (Some(saved_version), Ok(None)) => PersistenceMessage::RefineUnchanged {
                    job_id,
                    saved_version,
                },
                (saved_version, Err(error)) => PersistenceMessage::Failed {
                    job_id,
                    saved_version,
                    error,
                },
                (None, Ok(_)) => PersistenceMessage::Failed {
                    job_id,
                    saved_version: None,
                    error: PersistenceError::Busy,
                },
            }
        }
    }
}
