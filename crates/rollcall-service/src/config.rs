//! Attendance service configuration.

/// Configuration for the attendance services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Session lifetime in seconds (default: 60).
    pub session_ttl_secs: u64,
    /// Reject a second distinct student redeeming from an origin
    /// address already used in the same session. Known to
    /// false-positive behind shared NAT, so it stays switchable.
    pub origin_check_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 60,
            origin_check_enabled: true,
        }
    }
}
