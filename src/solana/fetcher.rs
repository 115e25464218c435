use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::solana::client::{RpcMethod, RpcTransport};

/// Kinds of remote failure, as seen by the retry policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("rate limited by remote")]
    Throttled,

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// Fixed-delay retry on throttling only. Every other error is final.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.delay_ms),
        }
    }

    /// Delay before the next attempt, or `None` when the call should stop.
    pub fn next_delay(&self, error: &FetchError, attempt: u32) -> Option<Duration> {
        match error {
            FetchError::Throttled if attempt < self.max_attempts => Some(self.delay),
            _ => None,
        }
    }
}

/// Issues single remote calls, retrying only while the remote throttles.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    transport: Arc<dyn RpcTransport>,
    policy: RetryPolicy,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn RpcTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub async fn call(&self, method: RpcMethod, params: Value) -> Result<Value, FetchError> {
        let mut attempt = 1;

        loop {
            match self.transport.send(method, params.clone()).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", method, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => match self.policy.next_delay(&e, attempt) {
                    Some(delay) => {
                        warn!(
                            "Exceeded limit for RPC on {} (attempt {}/{}), retrying in {:?}",
                            method, attempt, self.policy.max_attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!("{} failed after {} attempt(s): {}", method, attempt, e);
                        return Err(e);
                    }
                },
            }
        }
    }
}
