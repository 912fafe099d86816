//! Attendance session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-boxed attendance session opened by a teacher for one class
/// meeting.
///
/// Sessions are never deleted and never re-activated; the only mutation
/// ever applied is flipping `active` to false, either by an explicit end
/// or by a reader observing that `expires_at` has passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Presenter-facing session code (`SES-` plus a base-36 suffix).
    pub code: String,
    pub teacher_id: String,
    pub branch: String,
    pub semester: String,
    pub course: String,
    pub time_slot: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its expiry instant at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Caller-generated code; the store enforces uniqueness on it.
    pub code: String,
    pub teacher_id: String,
    pub branch: String,
    pub semester: String,
    pub course: String,
    pub time_slot: String,
    pub expires_at: DateTime<Utc>,
}
