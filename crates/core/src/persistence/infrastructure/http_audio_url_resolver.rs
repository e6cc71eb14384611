use std::time::Duration;

use serde::Deserialize;

use crate::persistence::domain::audio_url_resolver::AudioUrlResolver;
use crate::persistence::domain::job_service::JobServiceError;

use super::api_client::ApiClient;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignResponse {
    #[serde(alias = "presignedUrl")]
    url: String,
}

/// Presigns storage URLs via `GET {base}/storage/presign?url=...`.
pub struct HttpAudioUrlResolver {
    api: ApiClient,
}

impl HttpAudioUrlResolver {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, JobServiceError> {
        Ok(Self {
            api: ApiClient::new(base_url, token, timeout)?,
        })
    }
}

impl AudioUrlResolver for HttpAudioUrlResolver {
    fn presign(&self, storage_url: &str) -> Result<String, JobServiceError> {
        let request = self
            .api
            .get("storage/presign")
            .query(&[("url", storage_url)]);
        let response: PresignResponse = self.api.send_json(request)?;
        if response.url.trim().is_empty() {
            return Err(JobServiceError::InvalidResponse(
                "presign response has an empty url".to_string(),
            ));
        }
        Ok(response.url)
    }
}
