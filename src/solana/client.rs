use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::solana::fetcher::FetchError;

/// JSON-RPC error code the provider uses to signal throttling.
pub const RATE_LIMITED_CODE: i64 = -32429;

/// Remote methods this crate consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    /// Paginated token-account listing for a mint (DAS `getTokenAccounts`).
    TokenAccounts,
    TokenAccountsByOwner,
    Balance,
    MultipleAccounts,
    AccountInfo,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::TokenAccounts => "getTokenAccounts",
            RpcMethod::TokenAccountsByOwner => "getTokenAccountsByOwner",
            RpcMethod::Balance => "getBalance",
            RpcMethod::MultipleAccounts => "getMultipleAccounts",
            RpcMethod::AccountInfo => "getAccountInfo",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request/response exchange with the ledger endpoint.
///
/// Implementations return the decoded `result` payload, or a classified
/// [`FetchError`]. No retrying happens at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, method: RpcMethod, params: Value) -> std::result::Result<Value, FetchError>;
}

/// JSON-RPC over HTTP POST to a single endpoint.
///
/// Each `send` is exactly one HTTP request. An HTTP 429 or a `-32429` error
/// body comes back as [`FetchError::Throttled`] for the fetcher to retry.
#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    http: Client,
    url: String,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: rpc_url.to_string(),
        })
    }
}

#[async_trait]
impl RpcTransport for SolanaRpcClient {
    async fn send(&self, method: RpcMethod, params: Value) -> std::result::Result<Value, FetchError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method.as_str(),
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        classify_response(status, &bytes)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Map an HTTP status and JSON-RPC body onto a result or a retry-relevant error kind.
pub fn classify_response(status: StatusCode, body: &[u8]) -> std::result::Result<Value, FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::Throttled);
    }

    let envelope: Envelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(FetchError::Transport(format!("HTTP status {}", status)))
        }
        Err(e) => return Err(FetchError::Decode(e.to_string())),
    };

    match envelope.error {
        Some(error) if error.code == RATE_LIMITED_CODE => Err(FetchError::Throttled),
        Some(error) => Err(FetchError::Remote {
            code: error.code,
            message: error.message,
        }),
        None if !status.is_success() => {
            Err(FetchError::Transport(format!("HTTP status {}", status)))
        }
        None => Ok(envelope.result),
    }
}
