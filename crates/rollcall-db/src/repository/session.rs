//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use rollcall_core::error::RollcallResult;
use rollcall_core::models::session::{CreateSession, Session};
use rollcall_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    teacher_id: String,
    branch: String,
    semester: String,
    course: String,
    time_slot: String,
    active: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn row_to_session(row: SessionRow, code: String) -> Session {
    Session {
        code,
        teacher_id: row.teacher_id,
        branch: row.branch,
        semester: row.semester,
        course: row.course,
        time_slot: row.time_slot,
        active: row.active,
        created_at: row.created_at,
        expires_at: row.expires_at,
    }
}

/// SurrealDB implementation of the session repository.
///
/// The session code is the record id, so `create` fails atomically when
/// the code is already taken.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> RollcallResult<Session> {
        let code = input.code;

        let result = self
            .db
            .query(
                "CREATE type::record('session', $code) SET \
                 teacher_id = $teacher_id, \
                 branch = $branch, \
                 semester = $semester, \
                 course = $course, \
                 time_slot = $time_slot, \
                 expires_at = $expires_at",
            )
            .bind(("code", code.clone()))
            .bind(("teacher_id", input.teacher_id))
            .bind(("branch", input.branch))
            .bind(("semester", input.semester))
            .bind(("course", input.course))
            .bind(("time_slot", input.time_slot))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::classify_write(e, "session", &code))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: code.clone(),
        })?;

        Ok(row_to_session(row, code))
    }

    async fn get(&self, code: &str) -> RollcallResult<Session> {
        let code = code.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $code)")
            .bind(("code", code.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: code.clone(),
        })?;

        Ok(row_to_session(row, code))
    }

    async fn deactivate(&self, code: &str) -> RollcallResult<()> {
        // UPDATE on a missing record id touches nothing, which is
        // exactly the idempotency the lifecycle needs.
        self.db
            .query("UPDATE type::record('session', $code) SET active = false")
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
