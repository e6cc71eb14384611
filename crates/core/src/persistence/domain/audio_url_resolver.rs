use super::job_service::JobServiceError;

/// Domain interface for exchanging a storage URL for a time-limited one.
pub trait AudioUrlResolver: Send + Sync {
    fn presign(&self, storage_url: &str) -> Result<String, JobServiceError>;
}

/// Where playback and the waveform should load audio from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioSource {
    Presigned(String),
    /// Presigning failed; the original reference is used as-is.
    Original(String),
    Unavailable,
}

impl AudioSource {
    /// Resolves `original` through `resolver`, falling back to the original
    /// URL on failure so the editor is never blocked on presigning.
    pub fn resolve(resolver: &dyn AudioUrlResolver, original: Option<&str>) -> Self {
        let Some(url) = original.map(str::trim).filter(|u| !u.is_empty()) else {
            return AudioSource::Unavailable;
        };

        match resolver.presign(url) {
            Ok(presigned) => AudioSource::Presigned(presigned),
            Err(e) => {
                log::warn!("presigning {url} failed, using original URL: {e}");
                AudioSource::Original(url.to_string())
            }
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            AudioSource::Presigned(url) | AudioSource::Original(url) => Some(url),
            AudioSource::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, AudioSource::Unavailable)
    }
}
