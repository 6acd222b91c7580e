//! Backend health probe
//!
//! The backend exposes `GET /health`:
//!
//! ```json
//! {
//!   "healthy": true,
//!   "data": {
//!     "services": {
//!       "ai": {"status": "online", "model": "gemini-2.0-flash", "quota_preserved": true},
//!       "agents": "active",
//!       "websockets": "active"
//!     }
//!   }
//! }
//! ```
//!
//! Only `healthy` is required; everything under `data` is optional.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;

use crate::config::StatusConfig;
use crate::error::{Error, Result};

/// Response body of the health endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    #[serde(default)]
    pub data: HealthData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthData {
    pub services: ServiceHealth,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceHealth {
    pub ai: AiServiceHealth,
    /// `"active"` when every backend agent is up
    pub agents: Option<String>,
    pub websockets: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiServiceHealth {
    pub status: Option<String>,
    pub model: Option<String>,
    pub quota_preserved: Option<bool>,
}

/// Something that can report backend health.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    async fn probe(&self) -> Result<HealthResponse>;
}

/// Health probe over HTTP
pub struct HttpHealthProbe {
    http_client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    /// Create a probe from configuration
    ///
    /// Returns an error if `status.base_url` is unset.
    pub fn new(config: &StatusConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("status.base_url is required".to_string()))?;
        Self::with_base_url(base_url, config)
    }

    /// Create a probe against an explicit base URL, taking timeouts from `config`
    pub fn with_base_url(base_url: &str, config: &StatusConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: format!("{}/health", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self) -> Result<HealthResponse> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Probe(format!("API error ({}): {}", status, error_text)));
        }

        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| Error::Probe(format!("failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_response() {
        let response: HealthResponse = serde_json::from_value(json!({
            "healthy": true,
            "data": {"services": {
                "ai": {"status": "online", "model": "gemini-2.0-flash", "quota_preserved": true},
                "agents": "active",
                "websockets": "active"
            }}
        }))
        .unwrap();

        assert!(response.healthy);
        assert_eq!(response.data.services.ai.status.as_deref(), Some("online"));
        assert_eq!(response.data.services.ai.quota_preserved, Some(true));
        assert_eq!(response.data.services.agents.as_deref(), Some("active"));
    }

    #[test]
    fn test_parse_minimal_response() {
        let response: HealthResponse = serde_json::from_value(json!({"healthy": false})).unwrap();
        assert!(!response.healthy);
        assert!(response.data.services.ai.status.is_none());
    }

    #[test]
    fn test_missing_healthy_is_malformed() {
        let result: std::result::Result<HealthResponse, _> =
            serde_json::from_value(json!({"data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_requires_base_url() {
        assert!(HttpHealthProbe::new(&StatusConfig::default()).is_err());
    }

    #[test]
    fn test_probe_url() {
        let config = StatusConfig {
            base_url: Some("http://localhost:8000/".to_string()),
            ..Default::default()
        };
        let probe = HttpHealthProbe::new(&config).unwrap();
        assert_eq!(probe.url(), "http://localhost:8000/health");
    }
}
