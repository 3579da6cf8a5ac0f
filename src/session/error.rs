use thiserror::Error;

use crate::session::state::SessionState;

/// Failures of the automation session.
///
/// The first two prevent a session from being created. Once a session is
/// connected, every other variant is reported per call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("failed to launch automation server '{command}': {reason}")]
    LaunchFailure { command: String, reason: String },

    #[error("automation server not reachable at {url} after {attempts} attempts: {reason}")]
    ConnectFailure {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("request '{method}' timed out after {timeout_ms}ms")]
    RequestTimeout { method: String, timeout_ms: u64 },

    #[error("transport closed: {0}")]
    TransportClosed(String),

    #[error("session closed")]
    SessionClosed,

    #[error("request '{method}' failed: {message}")]
    Remote { method: String, message: String },

    #[error("session is not connected (state: {state:?})")]
    NotConnected { state: SessionState },

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to serialize request '{method}': {reason}")]
    Serialize { method: String, reason: String },

    #[error("invalid session transition {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

impl SessionError {
    /// Errors raised while bringing a session up.
    pub fn is_session_creation_failure(&self) -> bool {
        matches!(
            self,
            SessionError::LaunchFailure { .. } | SessionError::ConnectFailure { .. }
        )
    }
}
