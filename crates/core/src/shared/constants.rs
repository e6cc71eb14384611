pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Length of a segment appended by "add segment", in seconds.
pub const DEFAULT_SEGMENT_DURATION: f64 = 2.0;

pub const SETTINGS_DIR_NAME: &str = "SegmentTimeline";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
