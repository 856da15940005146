//! Minimal Ethereum JSON-RPC 2.0 client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ChainError;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to one node endpoint.
#[derive(Debug)]
pub struct JsonRpcClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `endpoint`. Each request is abandoned after
    /// `request_timeout` and reported as a transport error.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChainError::Transport {
                method: "init".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` and decode its `result`.
    ///
    /// A `null` result decodes into `Option::None` when `T` is an `Option`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport {
                method: method.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".into()
                } else {
                    e.to_string()
                },
            })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(ChainError::Transport {
                method: method.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let parsed: RpcResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                ChainError::Transport {
                    method: method.to_string(),
                    reason: "response body timed out".into(),
                }
            } else {
                ChainError::InvalidResponse(format!("{method}: undecodable response ({status}): {e}"))
            }
        })?;

        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(parsed.result.unwrap_or(Value::Null))
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))
    }
}
