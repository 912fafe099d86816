//! Integration tests for the session and attendance repository
//! implementations using in-memory SurrealDB.

use chrono::{Duration, Utc};
use rollcall_core::error::RollcallError;
use rollcall_core::models::attendance::CreateAttendanceRecord;
use rollcall_core::models::session::CreateSession;
use rollcall_core::repository::{AttendanceRepository, SessionRepository};
use rollcall_db::repository::{SurrealAttendanceRepository, SurrealSessionRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rollcall_db::run_migrations(&db).await.unwrap();
    db
}

fn session_input(code: &str) -> CreateSession {
    CreateSession {
        code: code.into(),
        teacher_id: "T001".into(),
        branch: "CSE".into(),
        semester: "6".into(),
        course: "Cloud Computing".into(),
        time_slot: "10:00-11:00".into(),
        expires_at: Utc::now() + Duration::seconds(60),
    }
}

fn attendance_input(session_id: &str, student_id: &str, origin: &str) -> CreateAttendanceRecord {
    CreateAttendanceRecord {
        session_id: session_id.into(),
        student_id: student_id.into(),
        course: "Cloud Computing".into(),
        branch: "CSE".into(),
        semester: "6".into(),
        time_slot: "10:00-11:00".into(),
        marked_at: Utc::now(),
        origin_ip: origin.into(),
    }
}

// -----------------------------------------------------------------------
// Session repository
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_session() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    let session = repo.create(session_input("SES-AAAA000001")).await.unwrap();

    assert_eq!(session.code, "SES-AAAA000001");
    assert_eq!(session.course, "Cloud Computing");
    assert!(session.active, "new sessions start active");

    let fetched = repo.get("SES-AAAA000001").await.unwrap();
    assert_eq!(fetched.code, session.code);
    assert_eq!(fetched.teacher_id, session.teacher_id);
    assert_eq!(fetched.expires_at, session.expires_at);
}

#[tokio::test]
async fn duplicate_session_code_conflicts() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    repo.create(session_input("SES-AAAA000002")).await.unwrap();
    let err = repo
        .create(session_input("SES-AAAA000002"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, RollcallError::AlreadyExists { .. }),
        "expected AlreadyExists, got {err:?}"
    );
}

#[tokio::test]
async fn get_unknown_session_is_not_found() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    let err = repo.get("SES-MISSING000").await.unwrap_err();
    assert!(matches!(err, RollcallError::NotFound { .. }));
}

#[tokio::test]
async fn deactivate_is_one_way_and_idempotent() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    repo.create(session_input("SES-AAAA000003")).await.unwrap();

    repo.deactivate("SES-AAAA000003").await.unwrap();
    assert!(!repo.get("SES-AAAA000003").await.unwrap().active);

    // Again, and on a code that never existed.
    repo.deactivate("SES-AAAA000003").await.unwrap();
    repo.deactivate("SES-NEVER00000").await.unwrap();
    assert!(!repo.get("SES-AAAA000003").await.unwrap().active);
}

// -----------------------------------------------------------------------
// Attendance repository
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_and_find_attendance() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    let record = repo
        .insert(attendance_input("SES-AAAA000010", "S001", "10.0.0.5"))
        .await
        .unwrap();

    assert_eq!(record.student_id, "S001");
    assert_eq!(record.status, "Present", "status defaults to Present");

    let found = repo.find("SES-AAAA000010", "S001").await.unwrap();
    assert!(found.is_some());
    assert!(repo.find("SES-AAAA000010", "S002").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_conflicts_per_session() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    repo.insert(attendance_input("SES-AAAA000011", "S001", "10.0.0.5"))
        .await
        .unwrap();

    let err = repo
        .insert(attendance_input("SES-AAAA000011", "S001", "10.0.0.9"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, RollcallError::AlreadyExists { .. }),
        "expected AlreadyExists, got {err:?}"
    );

    // Same student in a different session is a fresh pair.
    repo.insert(attendance_input("SES-AAAA000012", "S001", "10.0.0.5"))
        .await
        .unwrap();
}

#[tokio::test]
async fn find_by_origin_scoped_to_session() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    repo.insert(attendance_input("SES-AAAA000013", "S001", "10.0.0.5"))
        .await
        .unwrap();

    let hit = repo
        .find_by_origin("SES-AAAA000013", "10.0.0.5")
        .await
        .unwrap();
    assert_eq!(hit.unwrap().student_id, "S001");

    assert!(
        repo.find_by_origin("SES-AAAA000013", "10.0.0.6")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.find_by_origin("SES-OTHER00000", "10.0.0.5")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn session_roster_is_in_arrival_order() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    let base = Utc::now();
    for (i, student) in ["S003", "S001", "S002"].iter().enumerate() {
        let mut input = attendance_input("SES-AAAA000014", student, "10.0.0.5");
        input.marked_at = base + Duration::seconds(i as i64);
        repo.insert(input).await.unwrap();
    }

    let roster: Vec<String> = repo
        .list_for_session("SES-AAAA000014")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.student_id)
        .collect();

    assert_eq!(roster, vec!["S003", "S001", "S002"]);
}

#[tokio::test]
async fn student_history_is_most_recent_first() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    let base = Utc::now();
    for (i, session) in ["SES-AAAA000015", "SES-AAAA000016"].iter().enumerate() {
        let mut input = attendance_input(session, "S001", "10.0.0.5");
        input.marked_at = base + Duration::seconds(i as i64);
        repo.insert(input).await.unwrap();
    }

    let history = repo.list_for_student("S001").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].session_id, "SES-AAAA000016");
    assert_eq!(history[1].session_id, "SES-AAAA000015");

    assert!(repo.list_for_student("S999").await.unwrap().is_empty());
}

#[tokio::test]
async fn student_course_history_filters_by_course() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    let mut cloud = attendance_input("SES-AAAA000017", "S001", "10.0.0.5");
    cloud.course = "Cloud Computing".into();
    repo.insert(cloud).await.unwrap();

    let mut circuits = attendance_input("SES-AAAA000018", "S001", "10.0.0.5");
    circuits.course = "Circuit Theory".into();
    repo.insert(circuits).await.unwrap();

    let history = repo
        .list_for_student_course("S001", "Circuit Theory")
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].session_id, "SES-AAAA000018");
}

#[tokio::test]
async fn window_query_filters_by_time_course_and_slot() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);

    let base = Utc::now();

    let mut inside = attendance_input("SES-AAAA000019", "S001", "10.0.0.5");
    inside.marked_at = base;
    repo.insert(inside).await.unwrap();

    let mut outside = attendance_input("SES-AAAA000020", "S002", "10.0.0.6");
    outside.marked_at = base + Duration::days(2);
    repo.insert(outside).await.unwrap();

    let mut other_slot = attendance_input("SES-AAAA000021", "S003", "10.0.0.7");
    other_slot.marked_at = base;
    other_slot.time_slot = "14:00-15:00".into();
    repo.insert(other_slot).await.unwrap();

    let start = base - Duration::hours(1);
    let end = base + Duration::hours(1);

    let all = repo.list_in_window(start, end, None, None).await.unwrap();
    assert_eq!(all.len(), 2, "window excludes the record two days out");

    let slot_filtered = repo
        .list_in_window(start, end, None, Some("10:00-11:00"))
        .await
        .unwrap();
    assert_eq!(slot_filtered.len(), 1);
    assert_eq!(slot_filtered[0].student_id, "S001");

    let course_filtered = repo
        .list_in_window(start, end, Some("Digital Logic"), None)
        .await
        .unwrap();
    assert!(course_filtered.is_empty());
}
