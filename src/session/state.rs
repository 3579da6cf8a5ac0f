use serde::Serialize;

/// Lifecycle of an automation session.
///
/// ```text
/// Idle -> Launching -> AwaitingReady -> Connected -> Closing -> Closed
///            |               |
///            v               v
///       LaunchFailed   ConnectFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Launching,
    AwaitingReady,
    Connected,
    Closing,
    Closed,
    LaunchFailed,
    ConnectFailed,
}

impl SessionState {
    /// Whether `self -> to` is an edge of the lifecycle.
    pub fn can_transition(self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Idle, Launching)
                | (Launching, AwaitingReady)
                | (Launching, LaunchFailed)
                | (AwaitingReady, Connected)
                | (AwaitingReady, ConnectFailed)
                | (Connected, Closing)
                | (Closing, Closed)
                // startup interrupted by cleanup
                | (Idle, Closed)
                | (Launching, Closing)
                | (AwaitingReady, Closing)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Closed | SessionState::LaunchFailed | SessionState::ConnectFailed
        )
    }
}
