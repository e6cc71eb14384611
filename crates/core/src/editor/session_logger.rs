use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for editor session events.
///
/// Keeps the session free of any particular output mechanism so a host
/// can observe edits without changing the orchestration code.
pub trait SessionLogger: Send {
    /// Record a successful editor operation.
    fn operation(&mut self, name: &str);

    /// Record an operation that was refused, with the reason shown to the user.
    fn rejected(&mut self, name: &str, reason: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn operation(&mut self, _name: &str) {}
    fn rejected(&mut self, _name: &str, _reason: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards events to the `log` facade and counts them per operation for
/// an end-of-session summary.
pub struct LogSessionLogger {
    job_id: String,
    operations: BTreeMap<String, usize>,
    rejections: BTreeMap<String, usize>,
    start_time: Instant,
    messages: Vec<String>,
}

impl LogSessionLogger {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            operations: BTreeMap::new(),
            rejections: BTreeMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    pub fn operation_count(&self, name: &str) -> usize {
        self.operations.get(name).copied().unwrap_or(0)
    }

    pub fn rejection_count(&self, name: &str) -> usize {
        self.rejections.get(name).copied().unwrap_or(0)
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.operations.is_empty() && self.rejections.is_empty() && self.messages.is_empty() {
            return None;
        }

        let total: usize = self.operations.values().sum();
        let mut lines = vec![format!(
            "Session summary for job {} ({total} edits, {:.1}s):",
            self.job_id,
            self.start_time.elapsed().as_secs_f64()
        )];
        for (name, count) in &self.operations {
            lines.push(format!("  {name:14}: {count}"));
        }
        for (name, count) in &self.rejections {
            lines.push(format!("  {name:14}: {count} rejected"));
        }
        for message in &self.messages {
            lines.push(format!("  - {message}"));
        }
        Some(lines.join("\n"))
    }
}

impl SessionLogger for LogSessionLogger {
    fn operation(&mut self, name: &str) {
        *self.operations.entry(name.to_string()).or_default() += 1;
        log::debug!("[{}] {name}", self.job_id);
    }

    fn rejected(&mut self, name: &str, reason: &str) {
        *self.rejections.entry(name.to_string()).or_default() += 1;
        log::warn!("[{}] {name} rejected: {reason}", self.job_id);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("[{}] {message}", self.job_id);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
