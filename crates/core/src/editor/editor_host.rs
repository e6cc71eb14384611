use std::sync::Arc;

use crate::persistence::domain::audio_url_resolver::{AudioSource, AudioUrlResolver};
use crate::persistence::domain::job_service::{JobService, JobServiceError};
use crate::persistence::infrastructure::http_audio_url_resolver::HttpAudioUrlResolver;
use crate::persistence::infrastructure::http_job_service::HttpJobService;
use crate::persistence::persistence_coordinator::PersistenceCoordinator;
use crate::playback::domain::audio_player::AudioPlayer;
use crate::shared::settings::EditorSettings;

use super::editor_session::EditorSession;
use super::session_logger::{LogSessionLogger, SessionLogger};

/// Hosts at most one [`EditorSession`] and switches between jobs.
pub struct Editor {
    coordinator: Arc<PersistenceCoordinator>,
    resolver: Arc<dyn AudioUrlResolver>,
    settings: EditorSettings,
    session: Option<EditorSession>,
}

impl Editor {
    pub fn new(
        service: Arc<dyn JobService>,
        resolver: Arc<dyn AudioUrlResolver>,
        settings: EditorSettings,
    ) -> Self {
        Self {
            coordinator: Arc::new(PersistenceCoordinator::new(service)),
            resolver,
            settings,
            session: None,
        }
    }

    /// Builds an editor talking to the admin API configured in `settings`.
    pub fn from_settings(settings: EditorSettings) -> Result<Self, JobServiceError> {
        let timeout = settings.request_timeout();
        let token = settings.api_token.clone();
        let service = HttpJobService::new(&settings.api_base_url, token.clone(), timeout)?;
        let resolver = HttpAudioUrlResolver::new(&settings.api_base_url, token, timeout)?;
        Ok(Self::new(Arc::new(service), Arc::new(resolver), settings))
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        self.session.as_mut()
    }

    /// Tears down the current session, then loads `job_id` and opens a
    /// fresh one. Unsaved edits of the previous job are discarded.
    ///
    /// On a load failure no session remains open.
    pub fn switch_job(
        &mut self,
        job_id: &str,
        player: Box<dyn AudioPlayer>,
    ) -> Result<&mut EditorSession, JobServiceError> {
        self.close_session();

        let loaded = self.coordinator.load(job_id)?;
        let audio = AudioSource::resolve(self.resolver.as_ref(), loaded.job.audio_url.as_deref());
        let logger: Box<dyn SessionLogger> = Box::new(LogSessionLogger::new(job_id));

        let session = EditorSession::open(
            job_id,
            loaded.segments,
            audio,
            player,
            self.coordinator.clone(),
            &self.settings,
            logger,
        );
        Ok(self.session.insert(session))
    }

    pub fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            if session.is_dirty() {
                log::info!("discarding unsaved edits for job {}", session.job_id());
            }
        }
    }
}
