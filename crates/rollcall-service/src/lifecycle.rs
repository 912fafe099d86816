//! Session lifecycle — creation, live observation, and ending.

use chrono::{Duration, Utc};
use rollcall_core::error::{RollcallError, RollcallResult};
use rollcall_core::models::session::{CreateSession, Session};
use rollcall_core::repository::{AttendanceRepository, SessionRepository};
use tracing::info;

use crate::code;
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Fresh-code attempts before create gives up.
const MAX_CODE_ATTEMPTS: usize = 3;

/// Input for opening a session.
#[derive(Debug)]
pub struct CreateSessionInput {
    pub teacher_id: String,
    pub branch: String,
    pub semester: String,
    pub course: String,
    pub time_slot: String,
}

/// Live observation of one session: the record plus who has redeemed
/// so far, in arrival order.
#[derive(Debug)]
pub struct LiveSession {
    pub session: Session,
    pub attendees: Vec<String>,
    pub count: usize,
}

/// Session lifecycle manager.
///
/// Generic over repository implementations so that the service layer
/// has no dependency on the database crate.
pub struct SessionService<S: SessionRepository, A: AttendanceRepository> {
    session_repo: S,
    attendance_repo: A,
    config: ServiceConfig,
}

impl<S: SessionRepository, A: AttendanceRepository> SessionService<S, A> {
    pub fn new(session_repo: S, attendance_repo: A, config: ServiceConfig) -> Self {
        Self {
            session_repo,
            attendance_repo,
            config,
        }
    }

    /// Open a session for one class meeting.
    ///
    /// Expiry is fixed at creation (`now + TTL`); nothing ever pushes
    /// the flag at that instant — readers observe the timestamp.
    pub async fn create_session(&self, input: CreateSessionInput) -> RollcallResult<Session> {
        // 1. Refuse an empty course before touching the store.
        if input.course.trim().is_empty() {
            return Err(ServiceError::CourseRequired.into());
        }

        let expires_at = Utc::now() + Duration::seconds(self.config.session_ttl_secs as i64);

        // 2. Insert under a fresh code. The store's unique record id
        //    arbitrates collisions; regenerate and retry on conflict.
        for _ in 0..MAX_CODE_ATTEMPTS {
            let result = self
                .session_repo
                .create(CreateSession {
                    code: code::generate_session_code(),
                    teacher_id: input.teacher_id.clone(),
                    branch: input.branch.clone(),
                    semester: input.semester.clone(),
                    course: input.course.clone(),
                    time_slot: input.time_slot.clone(),
                    expires_at,
                })
                .await;

            match result {
                Ok(session) => {
                    info!(code = %session.code, course = %session.course, "session opened");
                    return Ok(session);
                }
                Err(RollcallError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(ServiceError::CodeSpaceExhausted.into())
    }

    /// Observe a session: effective active state plus the current
    /// roster.
    ///
    /// Crossing the expiry boundary here performs the lazy deactivation
    /// write, so repeated observation converges the stored flag.
    pub async fn live_view(&self, code: &str) -> RollcallResult<LiveSession> {
        let mut session = self.session_repo.get(code).await?;

        if session.active && session.is_expired_at(Utc::now()) {
            self.session_repo.deactivate(code).await?;
            session.active = false;
        }

        let records = self.attendance_repo.list_for_session(code).await?;
        let attendees: Vec<String> = records.into_iter().map(|r| r.student_id).collect();
        let count = attendees.len();

        Ok(LiveSession {
            session,
            attendees,
            count,
        })
    }

    /// End a session early. Idempotent: already-inactive,
    /// already-expired, and unknown codes all acknowledge without
    /// error.
    pub async fn end_session(&self, code: &str) -> RollcallResult<()> {
        self.session_repo.deactivate(code).await
    }
}
