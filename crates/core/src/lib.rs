pub mod timeline {
    pub mod domain {
        pub mod edit_error;
        pub mod edit_history;
        pub mod segment;
        pub mod segment_list;
        pub mod selection;
    }
}

pub mod waveform {
    pub mod domain {
        pub mod region;
        pub mod region_sync;
        pub mod waveform_view;
    }
}

pub mod playback {
    pub mod domain {
        pub mod audio_player;
        pub mod bounded_playback;
    }
}

pub mod persistence {
    pub mod domain {
        pub mod audio_url_resolver;
        pub mod job;
        pub mod job_service;
    }
    pub mod infrastructure;
    pub mod persistence_coordinator;
}

pub mod editor {
    pub mod editor_host;
    pub mod editor_session;
    pub mod session_logger;
}

pub mod shared {
    pub mod constants;
    pub mod settings;
}
