//! Redemption engine — the accept / already-redeemed / reject decision
//! for one student against one session.

use std::fmt;

use chrono::Utc;
use rollcall_core::error::{RollcallError, RollcallResult};
use rollcall_core::models::attendance::CreateAttendanceRecord;
use rollcall_core::repository::{AttendanceRepository, SessionRepository};
use tracing::debug;

use crate::config::ServiceConfig;

/// Why a redemption was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownSession,
    SessionInactive,
    SessionExpired,
    OriginReused,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::UnknownSession => "invalid session",
            RejectReason::SessionInactive => "session inactive",
            RejectReason::SessionExpired => "session expired",
            RejectReason::OriginReused => "origin already used (possible proxy)",
        };
        f.write_str(msg)
    }
}

/// Outcome of a redemption attempt.
///
/// `AlreadyRedeemed` is success-shaped: the student's presence is
/// already durably recorded, and callers should render it as such.
/// Rejections carry a reason and are final; retrying cannot change
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Accepted,
    AlreadyRedeemed,
    Rejected(RejectReason),
}

impl RedeemOutcome {
    /// Caller-facing message for this outcome.
    pub fn message(&self) -> String {
        match self {
            RedeemOutcome::Accepted => "attendance marked".into(),
            RedeemOutcome::AlreadyRedeemed => "already marked".into(),
            RedeemOutcome::Rejected(reason) => reason.to_string(),
        }
    }
}

/// Canonicalize an origin address before comparison.
///
/// Local traffic may arrive as IPv6 loopback or as an IPv4-mapped IPv6
/// address depending on the listener's address family; both must
/// compare equal to their IPv4 form.
pub fn normalize_origin(origin: &str) -> String {
    if origin == "::1" {
        return "127.0.0.1".to_string();
    }
    if let Some(v4) = origin.strip_prefix("::ffff:") {
        return v4.to_string();
    }
    origin.to_string()
}

/// Redemption engine.
///
/// Stateless between calls: the repositories are the only shared
/// state, and the first-redemption race is settled by the ledger's
/// unique insert rather than any in-process lock.
pub struct RedemptionEngine<S: SessionRepository, A: AttendanceRepository> {
    session_repo: S,
    attendance_repo: A,
    config: ServiceConfig,
}

impl<S: SessionRepository, A: AttendanceRepository> RedemptionEngine<S, A> {
    pub fn new(session_repo: S, attendance_repo: A, config: ServiceConfig) -> Self {
        Self {
            session_repo,
            attendance_repo,
            config,
        }
    }

    /// Decide one redemption attempt.
    pub async fn redeem(
        &self,
        session_code: &str,
        student_id: &str,
        origin: &str,
    ) -> RollcallResult<RedeemOutcome> {
        let origin = normalize_origin(origin);

        // 1. Unknown codes decline rather than error.
        let session = match self.session_repo.get(session_code).await {
            Ok(s) => s,
            Err(RollcallError::NotFound { .. }) => {
                return Ok(RedeemOutcome::Rejected(RejectReason::UnknownSession));
            }
            Err(e) => return Err(e),
        };

        // 2. Ended sessions stay closed.
        if !session.active {
            return Ok(RedeemOutcome::Rejected(RejectReason::SessionInactive));
        }

        // 3. Expiry is observed, never scheduled: the first caller past
        //    the boundary writes the flag down.
        if session.is_expired_at(Utc::now()) {
            self.session_repo.deactivate(session_code).await?;
            return Ok(RedeemOutcome::Rejected(RejectReason::SessionExpired));
        }

        // 4. A repeat attempt by the same student is already a success.
        if self
            .attendance_repo
            .find(session_code, student_id)
            .await?
            .is_some()
        {
            return Ok(RedeemOutcome::AlreadyRedeemed);
        }

        // 5. One successful redemption per origin address per session.
        if self.config.origin_check_enabled {
            if let Some(existing) = self
                .attendance_repo
                .find_by_origin(session_code, &origin)
                .await?
            {
                if existing.student_id != student_id {
                    debug!(code = %session_code, origin = %origin, "origin reuse rejected");
                    return Ok(RedeemOutcome::Rejected(RejectReason::OriginReused));
                }
            }
        }

        // 6. Insert the snapshot row. Losing the insert race to a
        //    concurrent attempt by the same student is the same success.
        let result = self
            .attendance_repo
            .insert(CreateAttendanceRecord {
                session_id: session.code.clone(),
                student_id: student_id.to_string(),
                course: session.course,
                branch: session.branch,
                semester: session.semester,
                time_slot: session.time_slot,
                marked_at: Utc::now(),
                origin_ip: origin,
            })
            .await;

        match result {
            Ok(_) => Ok(RedeemOutcome::Accepted),
            Err(RollcallError::AlreadyExists { .. }) => Ok(RedeemOutcome::AlreadyRedeemed),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_loopback_normalizes_to_ipv4() {
        assert_eq!(normalize_origin("::1"), "127.0.0.1");
    }

    #[test]
    fn ipv4_mapped_prefix_is_stripped() {
        assert_eq!(normalize_origin("::ffff:10.0.0.5"), "10.0.0.5");
        assert_eq!(normalize_origin("::ffff:127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn plain_addresses_pass_through() {
        assert_eq!(normalize_origin("10.0.0.5"), "10.0.0.5");
        assert_eq!(normalize_origin("2001:db8::7"), "2001:db8::7");
    }

    #[test]
    fn reject_reasons_have_stable_messages() {
        assert_eq!(RejectReason::UnknownSession.to_string(), "invalid session");
        assert_eq!(RejectReason::SessionExpired.to_string(), "session expired");
        assert!(
            RejectReason::OriginReused
                .to_string()
                .starts_with("origin already used")
        );
    }
}
