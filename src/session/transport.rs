use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::session::error::SessionError;
use crate::session::protocol::RpcMessage;
use crate::session::shared::SessionShared;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsSink = SplitSink<WsStream, Message>;
pub type WsSource = SplitStream<WsStream>;

/// Polling policy for the readiness probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbePolicy {
    pub attempts: u32,
    pub interval: Duration,
    pub probe_timeout: Duration,
}

// ============================================================================
// Connection establishment
// ============================================================================

/// Open and immediately close a connection to check the server is up.
pub async fn probe(url: &str, probe_timeout: Duration) -> Result<(), String> {
    match timeout(probe_timeout, connect_async(url)).await {
        Ok(Ok((mut ws, _))) => {
            let _ = ws.close(None).await;
            Ok(())
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("connection timeout".to_string()),
    }
}

/// Probe until the server accepts a handshake or the attempts run out.
/// Returns the number of attempts used.
pub async fn wait_for_server(url: &str, policy: ProbePolicy) -> Result<u32, SessionError> {
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=policy.attempts {
        match probe(url, policy.probe_timeout).await {
            Ok(()) => {
                info!(url, attempt, "automation server is ready");
                return Ok(attempt);
            }
            Err(e) => {
                last_error = e;
                if attempt < policy.attempts {
                    info!(attempt, max = policy.attempts, "waiting for automation server...");
                    sleep(policy.interval).await;
                }
            }
        }
    }

    Err(SessionError::ConnectFailure {
        url: url.to_string(),
        attempts: policy.attempts,
        reason: last_error,
    })
}

/// Open the persistent connection.
pub async fn open(url: &str, connect_timeout: Duration) -> Result<WsStream, SessionError> {
    let failure = |reason: String| SessionError::ConnectFailure {
        url: url.to_string(),
        attempts: 1,
        reason,
    };

    match timeout(connect_timeout, connect_async(url)).await {
        Ok(Ok((ws, _))) => {
            info!(url, "connected to automation server");
            Ok(ws)
        }
        Ok(Err(e)) => Err(failure(e.to_string())),
        Err(_) => Err(failure("WebSocket connection timeout".to_string())),
    }
}

// ============================================================================
// Receive loop
// ============================================================================

/// Demultiplex inbound frames into the pending-request map until the
/// connection ends, then fail whatever is still in flight.
pub fn spawn_receive_loop(mut source: WsSource, shared: Arc<SessionShared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => dispatch(&shared, &text),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => dispatch(&shared, text),
                    Err(_) => debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => format!("server closed connection: {}", frame.reason),
                        None => "server closed connection".to_string(),
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "connection ended".to_string(),
            }
        };
        shared.transport_lost(&reason);
    })
}

/// Route one inbound frame. Frames without a known id are dropped.
pub fn dispatch(shared: &SessionShared, text: &str) {
    let message: RpcMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!("ignoring unparseable frame: {}", e);
            return;
        }
    };

    match message.correlation_id() {
        Some(id) => {
            if !shared.resolve(id, message.into_outcome()) {
                debug!(id, "dropping response for unknown request");
            }
        }
        None => debug!("dropping unsolicited message"),
    }
}
