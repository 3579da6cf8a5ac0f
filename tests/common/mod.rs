#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use action_bridge::session::config::SessionConfig;

// ============================================================================
// Mock automation server
// ============================================================================
//
// Answers the JSON-RPC methods the session issues:
//   browser_click / browser_fill  -> result, error for ref "missing",
//                                    no answer for ref "stall"
//   browser_snapshot              -> the configured snapshot value
//   browser_navigate              -> empty result
//   noisy                         -> junk frames first, then the result
//   string_id                     -> result with the id sent back as a string
//   slow                          -> never answers
//   hang_up                       -> closes the connection

pub struct MockServer {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::with_snapshot(json!({
            "elements": [
                {"ref": "e1", "role": "button", "name": "Submit"},
                {"ref": "e2", "role": "textbox", "selector": "#email"}
            ]
        }))
        .await
    }

    pub async fn with_snapshot(snapshot: Value) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, snapshot.clone()));
            }
        });
        Self { port, handle }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn text(value: Value) -> Message {
    Message::Text(value.to_string())
}

async fn serve(stream: TcpStream, snapshot: Value) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut tx, mut rx) = ws.split();

    while let Some(Ok(message)) = rx.next().await {
        let body = match message {
            Message::Text(body) => body,
            Message::Close(_) => break,
            _ => continue,
        };
        let request: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let id = request["id"].clone();
        let method = request["method"].as_str().unwrap_or_default().to_string();

        let reply = match method.as_str() {
            "browser_click" | "browser_fill" => {
                let element_ref = request["params"]["ref"].as_str().unwrap_or_default();
                if element_ref == "stall" {
                    continue;
                }
                if element_ref == "missing" {
                    json!({"jsonrpc": "2.0", "id": id, "error": {"message": "Element not found"}})
                } else {
                    json!({"jsonrpc": "2.0", "id": id, "result": {"done": method, "ref": element_ref}})
                }
            }
            "browser_snapshot" => json!({"jsonrpc": "2.0", "id": id, "result": snapshot}),
            "browser_navigate" => json!({"jsonrpc": "2.0", "id": id, "result": {}}),
            "noisy" => {
                let _ = tx.send(text(json!({"jsonrpc": "2.0", "method": "notifications/progress"}))).await;
                let _ = tx.send(text(json!({"jsonrpc": "2.0", "id": 9999, "result": {}}))).await;
                let _ = tx.send(Message::Text("not json".to_string())).await;
                json!({"jsonrpc": "2.0", "id": id, "result": {"ok": true}})
            }
            "string_id" => {
                let id = id.as_u64().map(|n| n.to_string()).unwrap_or_default();
                json!({"jsonrpc": "2.0", "id": id, "result": {"ok": true}})
            }
            "slow" => continue,
            "hang_up" => {
                let _ = tx.close().await;
                break;
            }
            _ => json!({"jsonrpc": "2.0", "id": id, "error": {}}),
        };

        if tx.send(text(reply)).await.is_err() {
            break;
        }
    }
}

// ============================================================================
// Session configs
// ============================================================================

/// A stand-in server process: prints a ready marker and idles.
pub fn mock_config(port: u16) -> SessionConfig {
    SessionConfig {
        command: "sh".into(),
        args: vec![
            "-c".into(),
            "echo 'mock listening on port'; exec sleep 30".into(),
        ],
        host: "127.0.0.1".into(),
        port,
        ready_timeout_ms: 2_000,
        connect_attempts: 5,
        connect_interval_ms: 50,
        probe_timeout_ms: 500,
        connect_timeout_ms: 2_000,
        request_timeout_ms: 2_000,
        shutdown_grace_ms: 500,
        ..SessionConfig::default()
    }
}

/// A port nothing listens on.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
