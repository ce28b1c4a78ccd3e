use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_NOTICE_TTL_MS: u64 = 6_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("endpoint scheme '{0}' is not supported; use http or https")]
    UnsupportedScheme(String),
    #[error("gateway timeout must be greater than zero")]
    ZeroTimeout,
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Body encoding used for the intake POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadEncoding {
    #[default]
    FormUrlencoded,
    Json,
}

impl PayloadEncoding {
    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadEncoding::FormUrlencoded => "application/x-www-form-urlencoded",
            PayloadEncoding::Json => "application/json",
        }
    }
}

/// What counts as a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// The endpoint must answer with a 2xx status.
    #[default]
    Confirmed,
    /// Any response that arrives without a transport error is a success.
    /// Matches endpoints that only ever return opaque cross-origin responses.
    Optimistic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub endpoint: Url,
    #[serde(default)]
    pub encoding: PayloadEncoding,
    #[serde(default)]
    pub ack_policy: AckPolicy,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GatewayConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            encoding: PayloadEncoding::default(),
            ack_policy: AckPolicy::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn check(&self) -> Result<(), ConfigError> {
        match self.endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_notice_ttl_ms")]
    pub ttl_ms: u64,
}

impl NoticeConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_NOTICE_TTL_MS,
        }
    }
}

/// Runtime configuration for a form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub notice: NoticeConfig,
}

impl IntakeConfig {
    pub fn new(gateway: GatewayConfig) -> Self {
        Self {
            gateway,
            notice: NoticeConfig::default(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.gateway.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_notice_ttl_ms() -> u64 {
    DEFAULT_NOTICE_TTL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_take_defaults() {
        let config = IntakeConfig::from_json(r#"{ "gateway": { "endpoint": "https://intake.example/submit" } }"#)
            .expect("config parses");
        assert_eq!(config.gateway.encoding, PayloadEncoding::FormUrlencoded);
        assert_eq!(config.gateway.ack_policy, AckPolicy::Confirmed);
        assert_eq!(config.gateway.timeout(), Duration::from_secs(15));
        assert_eq!(config.notice.ttl(), Duration::from_secs(6));
    }

    #[test]
    fn explicit_values_are_kept() {
        let config = IntakeConfig::from_json(
            r#"{
                "gateway": {
                    "endpoint": "http://127.0.0.1:9000/intake",
                    "encoding": "json",
                    "ack_policy": "optimistic",
                    "timeout_ms": 250
                },
                "notice": { "ttl_ms": 1000 }
            }"#,
        )
        .expect("config parses");
        assert_eq!(config.gateway.encoding.content_type(), "application/json");
        assert_eq!(config.gateway.ack_policy, AckPolicy::Optimistic);
        assert_eq!(config.gateway.timeout_ms, 250);
        assert_eq!(config.notice.ttl_ms, 1000);
    }

    #[test]
    fn rejects_missing_endpoint_and_bad_values() {
        assert!(matches!(
            IntakeConfig::from_json(r#"{ "gateway": {} }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            IntakeConfig::from_json(r#"{ "gateway": { "endpoint": "ftp://intake.example" } }"#),
            Err(ConfigError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            IntakeConfig::from_json(
                r#"{ "gateway": { "endpoint": "https://intake.example", "timeout_ms": 0 } }"#
            ),
            Err(ConfigError::ZeroTimeout)
        ));
    }
}
