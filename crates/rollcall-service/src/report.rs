//! Attendance reports — per-day session groups, monthly summaries, and
//! per-student history.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use rollcall_core::error::{RollcallError, RollcallResult};
use rollcall_core::models::attendance::AttendanceRecord;
use rollcall_core::repository::AttendanceRepository;
use serde::Serialize;

use crate::error::ServiceError;

/// One session's slice of a daily report.
#[derive(Debug, Clone, Serialize)]
pub struct SessionGroup {
    pub session_id: String,
    pub course: String,
    pub time_slot: String,
    pub count: usize,
    /// Records in redemption order.
    pub records: Vec<AttendanceRecord>,
}

/// Per-student line of a monthly summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentPresence {
    pub student_id: String,
    pub present_days: u32,
}

/// Monthly attendance summary.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    /// Days of the month that had at least one matching session.
    pub class_days: u32,
    pub students: Vec<StudentPresence>,
}

/// Parse a `YYYY-MM-DD` report date.
pub fn parse_report_date(input: &str) -> RollcallResult<NaiveDate> {
    input.parse::<NaiveDate>().map_err(|e| {
        ServiceError::InvalidDate {
            input: input.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Report aggregator. Every operation is a pure read.
pub struct ReportService<A: AttendanceRepository> {
    attendance_repo: A,
}

impl<A: AttendanceRepository> ReportService<A> {
    pub fn new(attendance_repo: A) -> Self {
        Self { attendance_repo }
    }

    /// Records of one calendar day (server-local time), grouped by
    /// originating session.
    ///
    /// Group metadata comes from the records' snapshot fields, so this
    /// reads only the ledger. Records within a group are in redemption
    /// order; the group sequence itself is unspecified. No matches is
    /// an empty list, not an error.
    pub async fn by_date(
        &self,
        date: NaiveDate,
        course: Option<&str>,
        time_slot: Option<&str>,
    ) -> RollcallResult<Vec<SessionGroup>> {
        let (start, end) = local_day_window(date)?;
        let records = self
            .attendance_repo
            .list_in_window(start, end, course, time_slot)
            .await?;

        let mut groups: Vec<SessionGroup> = Vec::new();
        for record in records {
            match groups
                .iter_mut()
                .find(|g| g.session_id == record.session_id)
            {
                Some(group) => {
                    group.count += 1;
                    group.records.push(record);
                }
                None => groups.push(SessionGroup {
                    session_id: record.session_id.clone(),
                    course: record.course.clone(),
                    time_slot: record.time_slot.clone(),
                    count: 1,
                    records: vec![record],
                }),
            }
        }

        Ok(groups)
    }

    /// Per-student present-day counts for one calendar month.
    ///
    /// Composed from at most 31 `by_date` reads. A student is counted
    /// at most once per day, so `present_days` never exceeds
    /// `class_days`.
    pub async fn by_month(
        &self,
        year: i32,
        month: u32,
        course: Option<&str>,
    ) -> RollcallResult<MonthlyReport> {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::InvalidMonth(month).into());
        }

        let mut class_days = 0;
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();

        let mut day = 1;
        while let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            let groups = self.by_date(date, course, None).await?;
            if !groups.is_empty() {
                class_days += 1;

                let mut seen_today: BTreeSet<&str> = BTreeSet::new();
                for group in &groups {
                    for record in &group.records {
                        seen_today.insert(&record.student_id);
                    }
                }
                for student in seen_today {
                    *counts.entry(student.to_string()).or_insert(0) += 1;
                }
            }
            day += 1;
        }

        let students = counts
            .into_iter()
            .map(|(student_id, present_days)| StudentPresence {
                student_id,
                present_days,
            })
            .collect();

        Ok(MonthlyReport {
            class_days,
            students,
        })
    }

    /// A student's full history, most recent first.
    pub async fn participant_history(
        &self,
        student_id: &str,
    ) -> RollcallResult<Vec<AttendanceRecord>> {
        self.attendance_repo.list_for_student(student_id).await
    }

    /// A student's history for one course, most recent first.
    pub async fn subject_history(
        &self,
        student_id: &str,
        course: &str,
    ) -> RollcallResult<Vec<AttendanceRecord>> {
        self.attendance_repo
            .list_for_student_course(student_id, course)
            .await
    }
}

/// Expand a calendar day into its UTC instant window: `[00:00, +1 day)`
/// in server-local time.
fn local_day_window(date: NaiveDate) -> RollcallResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_midnight(date)?;
    let end = local_midnight(date + Duration::days(1))?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

fn local_midnight(date: NaiveDate) -> RollcallResult<DateTime<Local>> {
    // A DST transition can make local midnight ambiguous or skipped;
    // take the earliest valid instant.
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| RollcallError::Internal(format!("no local midnight on {date}")))
}
