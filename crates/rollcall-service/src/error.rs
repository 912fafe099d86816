//! Service-level error types.

use rollcall_core::error::RollcallError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("course is required")]
    CourseRequired,

    #[error("invalid report date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("invalid month: {0}")]
    InvalidMonth(u32),

    #[error("could not allocate a unique session code")]
    CodeSpaceExhausted,
}

impl From<ServiceError> for RollcallError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::CourseRequired
            | ServiceError::InvalidDate { .. }
            | ServiceError::InvalidMonth(_) => RollcallError::Validation {
                message: err.to_string(),
            },
            ServiceError::CodeSpaceExhausted => RollcallError::Internal(err.to_string()),
        }
    }
}
