//! Outbound HTTP health probe.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::config::HealthCheckConfig;

/// Why a probe did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("non-success status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(String),
}

/// `GET healthCheckEndpoint → status`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<(), ProbeFailure>;
}

pub struct HttpHealthProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(config: &HealthCheckConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeFailure> {
        match self.client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    tracing::warn!(url = %url, status = %status, "Health check failed: non-success status");
                    Err(ProbeFailure::Status(status.as_u16()))
                }
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(url = %url, "Health check failed: timeout");
                Err(ProbeFailure::Timeout(self.timeout))
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Health check failed: connection error");
                Err(ProbeFailure::Connect(e.to_string()))
            }
        }
    }
}
