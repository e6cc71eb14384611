use std::time::Duration;

use crate::persistence::domain::job::{Job, RefineResponse, Sentence, SentencesUpdate};
use crate::persistence::domain::job_service::{JobService, JobServiceError};

use super::api_client::ApiClient;

/// Job service over the admin REST API.
///
/// - `GET    {base}/jobs/{id}`
/// - `PUT    {base}/jobs/{id}/sentences` with `{"sentences": [...]}`
/// - `POST   {base}/jobs/{id}/refine` returning `{"sentences": [...]}`
pub struct HttpJobService {
    api: ApiClient,
}

impl HttpJobService {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, JobServiceError> {
        let api = ApiClient::new(base_url, token, timeout)?;
        log::debug!("job service at {}", api.base_url());
        Ok(Self { api })
    }

    fn job_path(job_id: &str, suffix: &str) -> String {
        format!("jobs/{}{}", job_id.trim(), suffix)
    }
}

impl JobService for HttpJobService {
    fn load_job(&self, job_id: &str) -> Result<Job, JobServiceError> {
        self.api.send_json(self.api.get(&Self::job_path(job_id, "")))
    }

    fn update_sentences(&self, job_id: &str, sentences: &[Sentence]) -> Result<(), JobServiceError> {
        let request = self
            .api
            .put(&Self::job_path(job_id, "/sentences"))
            .json(&SentencesUpdate { sentences });
        self.api.send(request)?;
        Ok(())
    }

    fn refine(&self, job_id: &str) -> Result<Vec<Sentence>, JobServiceError> {
        let body = self
            .api
            .send_text(self.api.post(&Self::job_path(job_id, "/refine")))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let response: RefineResponse = serde_json::from_str(&body)
            .map_err(|e| JobServiceError::InvalidResponse(e.to_string()))?;
        Ok(response.sentences.unwrap_or_default())
    }
}
