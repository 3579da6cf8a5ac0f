use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::session::config::SessionConfig;
use crate::session::error::SessionError;
use crate::session::process::{ServerProcess, negotiate_port};
use crate::session::protocol::{
    METHOD_CLICK, METHOD_FILL, METHOD_NAVIGATE, METHOD_SNAPSHOT, RpcRequest,
};
use crate::session::shared::SessionShared;
use crate::session::state::SessionState;
use crate::session::transport::{self, ProbePolicy, WsSink};
use crate::snapshot::snapshot_model::StructuralSnapshot;
use crate::validate::orchestrator::ActionSession;

/// An automation server subprocess plus the persistent connection to it.
///
/// Owns both exclusively; nothing else writes to the transport. Build with
/// [`AutomationSession::new`], bring up with [`start`](Self::start), and
/// release with [`close`](Self::close). A session that failed to start or
/// was closed is not reusable.
pub struct AutomationSession {
    config: SessionConfig,
    shared: Arc<SessionShared>,
    sink: AsyncMutex<Option<WsSink>>,
    process: AsyncMutex<Option<ServerProcess>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
    cancel: CancellationToken,
    port: Option<u16>,
}

impl AutomationSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            shared: Arc::new(SessionShared::default()),
            sink: AsyncMutex::new(None),
            process: AsyncMutex::new(None),
            receiver: Mutex::new(None),
            next_id: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            port: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Port handed to the server, once launched.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending_count()
    }

    /// Use a caller-owned token so cancelling it reaches this session.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that interrupts an in-flight call and closes the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Launch the server, wait for it, and connect.
    ///
    /// On failure the subprocess is stopped and the session is left in
    /// `LaunchFailed` or `ConnectFailed`. Cancelling the token returns
    /// `Cancelled` with the server killed; call [`close`](Self::close) to
    /// finish in `Closed`.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        let cancel = self.cancel.clone();
        tokio::select! {
            result = self.launch() => result,
            _ = cancel.cancelled() => {
                warn!("session start cancelled");
                Err(SessionError::Cancelled)
            }
        }
    }

    async fn launch(&mut self) -> Result<(), SessionError> {
        self.shared.transition(SessionState::Launching)?;

        let mut process = match negotiate_port(self.config.port)
            .and_then(|port| ServerProcess::spawn(&self.config, port).map(|p| (p, port)))
        {
            Ok((process, port)) => {
                self.port = Some(port);
                process
            }
            Err(e) => {
                error!("failed to start automation server: {}", e);
                let _ = self.shared.transition(SessionState::LaunchFailed);
                return Err(e);
            }
        };

        match process.wait_ready(self.config.ready_timeout()).await {
            Ok(readiness) => debug!(?readiness, "automation server launched"),
            Err(e) => {
                error!("automation server failed during launch: {}", e);
                process.terminate(self.config.shutdown_grace()).await;
                let _ = self.shared.transition(SessionState::LaunchFailed);
                return Err(e);
            }
        }
        self.shared.transition(SessionState::AwaitingReady)?;

        let port = self.port.unwrap_or(self.config.port);
        let url = self.config.url_for_port(port);
        let policy = ProbePolicy {
            attempts: self.config.connect_attempts,
            interval: self.config.connect_interval(),
            probe_timeout: self.config.probe_timeout(),
        };

        let connected = match transport::wait_for_server(&url, policy).await {
            Ok(_) => transport::open(&url, self.config.connect_timeout()).await,
            Err(e) => Err(e),
        };

        let stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                error!("failed to connect to automation server: {}", e);
                process.terminate(self.config.shutdown_grace()).await;
                let _ = self.shared.transition(SessionState::ConnectFailed);
                return Err(e);
            }
        };

        let (sink, source) = stream.split();
        *self.sink.get_mut() = Some(sink);
        *self.process.get_mut() = Some(process);
        self.shared.transition(SessionState::Connected)?;

        let handle = transport::spawn_receive_loop(source, Arc::clone(&self.shared));
        *self.receiver.lock().unwrap_or_else(|p| p.into_inner()) = Some(handle);

        info!(%url, "automation session ready");
        Ok(())
    }

    /// Reject in-flight calls, release the transport, and stop the server.
    /// Safe to call more than once.
    pub async fn close(&self) {
        let state = self.shared.state();
        match state {
            SessionState::Closed | SessionState::LaunchFailed | SessionState::ConnectFailed => {
                return;
            }
            SessionState::Idle => {
                let _ = self.shared.transition(SessionState::Closed);
                return;
            }
            SessionState::Closing => {}
            _ => {
                let _ = self.shared.transition(SessionState::Closing);
            }
        }

        info!("cleaning up automation session");
        let rejected = self.shared.reject_all(SessionError::SessionClosed);
        if rejected > 0 {
            warn!(rejected, "rejected in-flight requests on close");
        }

        if let Some(handle) = self.receiver.lock().unwrap_or_else(|p| p.into_inner()).take() {
            handle.abort();
        }

        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                debug!("error closing transport: {}", e);
            }
        }

        if let Some(mut process) = self.process.lock().await.take() {
            process.terminate(self.config.shutdown_grace()).await;
        }

        let _ = self.shared.transition(SessionState::Closed);
        info!("automation session closed");
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Issue one request and wait for its correlated response.
    ///
    /// Bounded by `request_timeout_ms`. Cancelling the session token while
    /// waiting closes the session and returns `Cancelled`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        let state = self.shared.state();
        if state != SessionState::Connected {
            return Err(SessionError::NotConnected { state });
        }
        if self.cancel.is_cancelled() {
            self.close().await;
            return Err(SessionError::Cancelled);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = serde_json::to_string(&RpcRequest::new(id, method, params)).map_err(|e| {
            SessionError::Serialize {
                method: method.to_string(),
                reason: e.to_string(),
            }
        })?;

        let response = self.shared.register(id, method);
        debug!(id, method, "sending request");

        if let Err(e) = self.send_frame(frame).await {
            self.shared.forget(id);
            return Err(e);
        }

        let timeout = self.config.request_timeout();
        tokio::select! {
            outcome = response => outcome.unwrap_or(Err(SessionError::SessionClosed)),
            _ = sleep(timeout) => {
                self.shared.forget(id);
                warn!(id, method, "request timed out");
                Err(SessionError::RequestTimeout {
                    method: method.to_string(),
                    timeout_ms: self.config.request_timeout_ms,
                })
            }
            _ = self.cancel.cancelled() => {
                self.shared.forget(id);
                warn!(id, method, "request cancelled; closing session");
                self.close().await;
                Err(SessionError::Cancelled)
            }
        }
    }

    async fn send_frame(&self, frame: String) -> Result<(), SessionError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(SessionError::SessionClosed)?;
        sink.send(Message::Text(frame))
            .await
            .map_err(|e| SessionError::TransportClosed(e.to_string()))
    }

    /// Request the page-structure snapshot.
    pub async fn snapshot(&self) -> Result<StructuralSnapshot, SessionError> {
        let result = self.call(METHOD_SNAPSHOT, json!({})).await?;
        let snapshot =
            StructuralSnapshot::from_value(&result).ok_or_else(|| SessionError::Remote {
                method: METHOD_SNAPSHOT.to_string(),
                message: "invalid snapshot format received".to_string(),
            })?;
        info!(elements = snapshot.len(), "snapshot received");
        Ok(snapshot)
    }

    pub async fn navigate(&self, url: &str) -> Result<Value, SessionError> {
        info!(url, "navigating");
        self.call(METHOD_NAVIGATE, json!({ "url": url })).await
    }
}

#[async_trait]
impl ActionSession for AutomationSession {
    async fn click(&self, element_ref: &str) -> Result<Value, SessionError> {
        info!(element_ref, "performing click");
        self.call(METHOD_CLICK, json!({ "ref": element_ref })).await
    }

    async fn fill(&self, element_ref: &str, value: &str) -> Result<Value, SessionError> {
        info!(element_ref, "performing fill");
        self.call(METHOD_FILL, json!({ "ref": element_ref, "value": value })).await
    }
}

impl Drop for AutomationSession {
    fn drop(&mut self) {
        // The child is killed on drop; only the receive task needs stopping.
        if let Some(handle) = self.receiver.lock().unwrap_or_else(|p| p.into_inner()).take() {
            handle.abort();
        }
    }
}
