//! Transient user-facing notices.
//!
//! A notice disappears on its own after [`NOTICE_TTL`] or when the user
//! dismisses it explicitly. An incidental interaction such as clicking
//! elsewhere leaves it open.

use std::time::{Duration, Instant};

pub const NOTICE_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The user asked for the notice to go away.
    Explicit,
    /// The user interacted with something else.
    ClickAway,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity, shown_at: Instant) -> Self {
        Self {
            message: message.into(),
            severity,
            shown_at,
        }
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= ttl
    }
}

/// Holds at most one notice; a new one replaces the current one.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<Notice>,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self {
            current: None,
            ttl: NOTICE_TTL,
        }
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(Notice::new(message, Severity::Success, Instant::now()));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(Notice::new(message, Severity::Error, Instant::now()));
    }

    pub fn show(&mut self, notice: Notice) {
        self.current = Some(notice);
    }

    /// Returns whether a notice was closed.
    pub fn dismiss(&mut self, reason: DismissReason) -> bool {
        match reason {
            DismissReason::ClickAway => false,
            DismissReason::Explicit => self.current.take().is_some(),
        }
    }

    /// Drops the notice once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now, self.ttl)) {
            self.current = None;
        }
    }
}
