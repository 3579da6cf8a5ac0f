use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2.0";

pub const METHOD_SNAPSHOT: &str = "browser_snapshot";
pub const METHOD_CLICK: &str = "browser_click";
pub const METHOD_FILL: &str = "browser_fill";
pub const METHOD_NAVIGATE: &str = "browser_navigate";

/// Outbound request envelope (one WebSocket text frame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: PROTOCOL_VERSION.to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Inbound frame. Responses carry an `id` plus `result` or `error`;
/// notifications carry no id and are dropped by the receive loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

impl RpcMessage {
    /// Correlation id, accepting numeric ids and numeric strings.
    pub fn correlation_id(&self) -> Option<u64> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Collapse the frame into the call outcome.
    pub fn into_outcome(self) -> Result<Value, String> {
        match self.error {
            Some(err) => Err(err
                .message
                .unwrap_or_else(|| "MCP request failed".to_string())),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
