use crate::error::{DispatchError, InitError};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "sr-tracker/1.0";

/// Remote endpoint settings. Empty url or key disables dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: String,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

#[derive(Serialize)]
struct SrPayload {
    sr: u32,
    timestamp: i64,
}

/// HTTP client posting SR values to the configured endpoint
///
/// Clones share the endpoint settings, so a configuration update is seen by
/// every clone on its next call. Calls never retry.
#[derive(Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    endpoint: Arc<RwLock<EndpointConfig>>,
}

impl DispatchClient {
    /// Create a new client with the default 5s connect / 10s overall timeouts
    pub fn new() -> Result<Self, InitError> {
        Self::with_timeouts(CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(connect: Duration, total: Duration) -> Result<Self, InitError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(total)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InitError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: Arc::new(RwLock::new(EndpointConfig::default())),
        })
    }

    /// Replace endpoint settings; in-flight calls keep the settings they read
    pub fn configure(&self, endpoint: EndpointConfig) {
        let mut current = self.endpoint.write();
        if *current != endpoint {
            if endpoint.is_configured() {
                info!(url = %endpoint.url, "API client configured");
            } else if current.is_configured() {
                info!("API client disabled");
            }
            *current = endpoint;
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.read().is_configured()
    }

    /// Post `value`, returning the HTTP status on success
    pub async fn try_send(&self, value: u32) -> Result<u16, DispatchError> {
        // Snapshot under the read lock; never held across the request
        let endpoint = self.endpoint.read().clone();
        if !endpoint.is_configured() {
            return Err(DispatchError::NotConfigured);
        }

        let payload = SrPayload {
            sr: value,
            timestamp: chrono::Utc::now().timestamp(),
        };

        let response = self
            .client
            .post(&endpoint.url)
            .bearer_auth(&endpoint.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(DispatchError::HttpStatus(status.as_u16()))
        }
    }

    /// Post `value`; failures are logged and reported as `false`
    pub async fn send(&self, value: u32) -> bool {
        match self.try_send(value).await {
            Ok(status) => {
                info!("SR {} posted to API (HTTP {})", value, status);
                true
            }
            Err(DispatchError::NotConfigured) => false,
            Err(DispatchError::HttpStatus(status)) => {
                warn!("API returned HTTP {} for SR {}", status, value);
                false
            }
            Err(e) => {
                warn!("API request for SR {} failed: {}", value, e);
                false
            }
        }
    }
}
