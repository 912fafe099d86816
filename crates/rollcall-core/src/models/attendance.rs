//! Attendance record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single successful redemption of a session by a student.
///
/// Course, branch, semester, and time slot are snapshotted from the
/// session at redemption time, so later session state cannot change
/// recorded history. At most one record exists per
/// `(session_id, student_id)` pair; records are immutable and never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub student_id: String,
    pub course: String,
    pub branch: String,
    pub semester: String,
    pub time_slot: String,
    /// Status label, `"Present"` on first redemption.
    pub status: String,
    pub marked_at: DateTime<Utc>,
    /// Normalized network address the redemption arrived from.
    pub origin_ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceRecord {
    pub session_id: String,
    pub student_id: String,
    pub course: String,
    pub branch: String,
    pub semester: String,
    pub time_slot: String,
    pub marked_at: DateTime<Utc>,
    pub origin_ip: String,
}
