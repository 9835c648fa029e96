//! JSON-RPC 2.0 transport.
//!
//! One HTTP POST per call. Error objects become `LedgerError::Rpc`; an
//! absent `result` is treated as `null` so callers can deserialize
//! optional results such as pending receipts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use wastewatch_core::LedgerError;

/// Outgoing request
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// Error object inside a response
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Incoming response
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

/// JSON-RPC client bound to one node URL
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `url`.
    #[must_use]
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Node URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Invoke `method` and deserialize its result.
    ///
    /// # Errors
    /// `Transport` on HTTP failure, `Rpc` on an error object, `Abi` when the
    /// result has an unexpected shape.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, url = %self.url, "rpc call");

        let response = self
            .http
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(LedgerError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("node returned {status}")));
        }

        let body: RpcResponse = response.json().await.map_err(LedgerError::transport)?;
        if let Some(err) = body.error {
            tracing::debug!(method, code = err.code, message = %err.message, "rpc error");
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(body.result)
            .map_err(|e| LedgerError::Abi(format!("unexpected {method} result: {e}")))
    }
}
