use std::time::{Duration, Instant};

use serde::Serialize;

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully!";
pub const FAILURE_MESSAGE: &str = "Failed to submit form. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Transient banner raised when a submission settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub detail: Option<String>,
    raised_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn success(ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: SUCCESS_MESSAGE.into(),
            detail: None,
            raised_at: Instant::now(),
            ttl,
        }
    }

    pub fn failure(reason: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: FAILURE_MESSAGE.into(),
            detail: Some(reason.into()),
            raised_at: Instant::now(),
            ttl,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.raised_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}
