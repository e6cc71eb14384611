use thiserror::Error;

use super::job::{Job, Sentence};

/// Failures talking to the job service. `Server` displays the server's own
/// message verbatim so it can go straight into a banner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobServiceError {
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response from job service: {0}")]
    InvalidResponse(String),
}

/// Domain interface for the external job service.
///
/// Calls block until the service answers; the editor decides whether to
/// run them inline or on a worker thread.
pub trait JobService: Send + Sync {
    fn load_job(&self, job_id: &str) -> Result<Job, JobServiceError>;

    /// Replaces the job's full sentence list.
    fn update_sentences(&self, job_id: &str, sentences: &[Sentence]) -> Result<(), JobServiceError>;

    /// Runs boundary refinement. An empty result means "no change".
    fn refine(&self, job_id: &str) -> Result<Vec<Sentence>, JobServiceError>;
}
