//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and must be safe to call
//! concurrently with no shared in-process mutable state. The attendance
//! `insert` is the single correctness-critical concurrency point of the
//! system: implementations must back it with a store-level uniqueness
//! guarantee on `(session_id, student_id)`, never a read-then-write.

use chrono::{DateTime, Utc};

use crate::error::RollcallResult;
use crate::models::attendance::{AttendanceRecord, CreateAttendanceRecord};
use crate::models::session::{CreateSession, Session};

pub trait SessionRepository: Send + Sync {
    /// Persist a new session. Fails with `AlreadyExists` when the code
    /// is already taken.
    fn create(&self, input: CreateSession)
    -> impl Future<Output = RollcallResult<Session>> + Send;

    /// Fetch a session by its code. Fails with `NotFound`.
    fn get(&self, code: &str) -> impl Future<Output = RollcallResult<Session>> + Send;

    /// Set `active = false`. Idempotent; unknown codes are a no-op.
    fn deactivate(&self, code: &str) -> impl Future<Output = RollcallResult<()>> + Send;
}

pub trait AttendanceRepository: Send + Sync {
    /// Insert the first redemption for a `(session, student)` pair.
    ///
    /// Fails with `AlreadyExists` when a record for the pair is already
    /// present, including when a concurrent insert won the race after
    /// the caller's existence check.
    fn insert(
        &self,
        input: CreateAttendanceRecord,
    ) -> impl Future<Output = RollcallResult<AttendanceRecord>> + Send;

    fn find(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> impl Future<Output = RollcallResult<Option<AttendanceRecord>>> + Send;

    /// Earliest record in the session redeemed from `origin_ip`.
    fn find_by_origin(
        &self,
        session_id: &str,
        origin_ip: &str,
    ) -> impl Future<Output = RollcallResult<Option<AttendanceRecord>>> + Send;

    /// All records of one session, ascending `marked_at` (arrival order).
    fn list_for_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceRecord>>> + Send;

    /// A student's full history, descending `marked_at`.
    fn list_for_student(
        &self,
        student_id: &str,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceRecord>>> + Send;

    /// A student's history for one course, descending `marked_at`.
    fn list_for_student_course(
        &self,
        student_id: &str,
        course: &str,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceRecord>>> + Send;

    /// Records whose `marked_at` lies in `[start, end)`, optionally
    /// filtered by course and time slot, ascending `marked_at`.
    fn list_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        course: Option<&str>,
        time_slot: Option<&str>,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceRecord>>> + Send;
}
