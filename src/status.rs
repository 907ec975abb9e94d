use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub message: String,
    pub level: StatusLevel,
    shown_at: Instant,
}

/// Single-slot notification surface. Each new message replaces the last;
/// everything but errors disappears after `timeout`.
#[derive(Debug)]
pub struct StatusBar {
    current: Option<Status>,
    timeout: Duration,
}

impl StatusBar {
    pub fn new(timeout: Duration) -> Self {
        Self {
            current: None,
            timeout,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.show(message, StatusLevel::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, StatusLevel::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "error status");
        self.show(message, StatusLevel::Error);
    }

    pub fn show(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.current = Some(Status {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    pub fn current(&self) -> Option<&Status> {
        self.current.as_ref()
    }

    /// Drops an expired transient message. Returns how long until the
    /// visible message expires, if it ever does.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let status = self.current.as_ref()?;
        if status.level == StatusLevel::Error {
            return None;
        }
        let elapsed = now.saturating_duration_since(status.shown_at);
        if elapsed >= self.timeout {
            self.current = None;
            None
        } else {
            Some(self.timeout - elapsed)
        }
    }
}
