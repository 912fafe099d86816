//! SurrealDB implementation of [`AttendanceRepository`].
//!
//! The attendance record id is the composite `<session code>:<student
//! id>`, so the CREATE in `insert` is the atomic arbiter of the
//! first-redemption race: of two concurrent inserts for the same pair,
//! exactly one succeeds and the other observes a duplicate. The unique
//! index on `(session_id, student_id)` states the same constraint at
//! the schema level.

use chrono::{DateTime, Utc};
use rollcall_core::error::RollcallResult;
use rollcall_core::models::attendance::{AttendanceRecord, CreateAttendanceRecord};
use rollcall_core::repository::AttendanceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AttendanceRow {
    session_id: String,
    student_id: String,
    course: String,
    branch: String,
    semester: String,
    time_slot: String,
    status: String,
    marked_at: DateTime<Utc>,
    origin_ip: String,
}

impl AttendanceRow {
    fn into_record(self) -> AttendanceRecord {
        AttendanceRecord {
            session_id: self.session_id,
            student_id: self.student_id,
            course: self.course,
            branch: self.branch,
            semester: self.semester,
            time_slot: self.time_slot,
            status: self.status,
            marked_at: self.marked_at,
            origin_ip: self.origin_ip,
        }
    }
}

fn record_id(session_id: &str, student_id: &str) -> String {
    format!("{session_id}:{student_id}")
}

/// SurrealDB implementation of the attendance ledger.
#[derive(Clone)]
pub struct SurrealAttendanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAttendanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn list(
        &self,
        query: &'static str,
        binds: Vec<(&'static str, String)>,
    ) -> RollcallResult<Vec<AttendanceRecord>> {
        let mut q = self.db.query(query);
        for (key, value) in binds {
            q = q.bind((key, value));
        }
        let mut result = q.await.map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(AttendanceRow::into_record).collect())
    }
}

impl<C: Connection> AttendanceRepository for SurrealAttendanceRepository<C> {
    async fn insert(&self, input: CreateAttendanceRecord) -> RollcallResult<AttendanceRecord> {
        let id = record_id(&input.session_id, &input.student_id);

        let result = self
            .db
            .query(
                "CREATE type::record('attendance', $id) SET \
                 session_id = $session_id, \
                 student_id = $student_id, \
                 course = $course, \
                 branch = $branch, \
                 semester = $semester, \
                 time_slot = $time_slot, \
                 marked_at = $marked_at, \
                 origin_ip = $origin_ip",
            )
            .bind(("id", id.clone()))
            .bind(("session_id", input.session_id))
            .bind(("student_id", input.student_id))
            .bind(("course", input.course))
            .bind(("branch", input.branch))
            .bind(("semester", input.semester))
            .bind(("time_slot", input.time_slot))
            .bind(("marked_at", input.marked_at))
            .bind(("origin_ip", input.origin_ip))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::classify_write(e, "attendance", &id))?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "attendance".into(),
            id,
        })?;

        Ok(row.into_record())
    }

    async fn find(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> RollcallResult<Option<AttendanceRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('attendance', $id)")
            .bind(("id", record_id(session_id, student_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(AttendanceRow::into_record))
    }

    async fn find_by_origin(
        &self,
        session_id: &str,
        origin_ip: &str,
    ) -> RollcallResult<Option<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM attendance \
                 WHERE session_id = $session_id AND origin_ip = $origin_ip \
                 ORDER BY marked_at ASC LIMIT 1",
            )
            .bind(("session_id", session_id.to_string()))
            .bind(("origin_ip", origin_ip.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(AttendanceRow::into_record))
    }

    async fn list_for_session(&self, session_id: &str) -> RollcallResult<Vec<AttendanceRecord>> {
        self.list(
            "SELECT * FROM attendance WHERE session_id = $session_id \
             ORDER BY marked_at ASC",
            vec![("session_id", session_id.to_string())],
        )
        .await
    }

    async fn list_for_student(&self, student_id: &str) -> RollcallResult<Vec<AttendanceRecord>> {
        self.list(
            "SELECT * FROM attendance WHERE student_id = $student_id \
             ORDER BY marked_at DESC",
            vec![("student_id", student_id.to_string())],
        )
        .await
    }

    async fn list_for_student_course(
        &self,
        student_id: &str,
        course: &str,
    ) -> RollcallResult<Vec<AttendanceRecord>> {
        self.list(
            "SELECT * FROM attendance \
             WHERE student_id = $student_id AND course = $course \
             ORDER BY marked_at DESC",
            vec![
                ("student_id", student_id.to_string()),
                ("course", course.to_string()),
            ],
        )
        .await
    }

    async fn list_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        course: Option<&str>,
        time_slot: Option<&str>,
    ) -> RollcallResult<Vec<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM attendance \
                 WHERE marked_at >= $start AND marked_at < $end \
                 AND ($course = NONE OR course = $course) \
                 AND ($time_slot = NONE OR time_slot = $time_slot) \
                 ORDER BY marked_at ASC",
            )
            .bind(("start", start))
            .bind(("end", end))
            .bind(("course", course.map(str::to_string)))
            .bind(("time_slot", time_slot.map(str::to_string)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(AttendanceRow::into_record).collect())
    }
}
