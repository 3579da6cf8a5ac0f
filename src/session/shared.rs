use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::session::error::SessionError;
use crate::session::state::SessionState;

pub type CallOutcome = Result<Value, SessionError>;

struct PendingCall {
    method: String,
    tx: oneshot::Sender<CallOutcome>,
}

/// State shared between call issuance and the receive loop: the lifecycle
/// state and the in-flight request map. Both sit behind their own mutex and
/// no lock is held across an await.
pub struct SessionShared {
    state: Mutex<SessionState>,
    pending: Mutex<HashMap<u64, PendingCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for SessionShared {
    fn default() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl SessionShared {
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Move to `to` if the lifecycle allows it.
    pub fn transition(&self, to: SessionState) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        if !state.can_transition(to) {
            return Err(SessionError::InvalidTransition { from: *state, to });
        }
        debug!(from = ?*state, to = ?to, "session state");
        *state = to;
        Ok(())
    }

    /// Record an in-flight request and return the receiver its outcome will
    /// be delivered on.
    pub fn register(&self, id: u64, method: &str) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(
            id,
            PendingCall {
                method: method.to_string(),
                tx,
            },
        );
        rx
    }

    /// Drop an in-flight entry (timeout, cancellation, failed send).
    pub fn forget(&self, id: u64) {
        lock(&self.pending).remove(&id);
    }

    /// Deliver a response. Returns false when no request has this id.
    pub fn resolve(&self, id: u64, outcome: Result<Value, String>) -> bool {
        let Some(call) = lock(&self.pending).remove(&id) else {
            return false;
        };
        let outcome = outcome.map_err(|message| SessionError::Remote {
            method: call.method.clone(),
            message,
        });
        // The caller may have given up already.
        let _ = call.tx.send(outcome);
        true
    }

    /// Fail every in-flight request with `error`.
    pub fn reject_all(&self, error: SessionError) -> usize {
        let drained: Vec<PendingCall> = lock(&self.pending).drain().map(|(_, c)| c).collect();
        let count = drained.len();
        for call in drained {
            let _ = call.tx.send(Err(error.clone()));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Called by the receive loop when the connection ends.
    pub fn transport_lost(&self, reason: &str) {
        let unexpected = {
            let mut state = lock(&self.state);
            let connected = state.can_transition(SessionState::Closing);
            if connected {
                *state = SessionState::Closing;
            }
            connected
        };
        let rejected = self.reject_all(SessionError::TransportClosed(reason.to_string()));
        if unexpected {
            warn!(reason, rejected, "automation transport closed");
        } else {
            debug!(reason, "automation transport released");
        }
    }
}
