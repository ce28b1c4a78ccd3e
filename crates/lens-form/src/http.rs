use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::config::{AckPolicy, ConfigError, GatewayConfig};
use crate::encode::WireRecord;
use crate::gateway::{Ack, SubmissionGateway, SubmitFailure};

const USER_AGENT_VALUE: &str = concat!("lens-intake/", env!("CARGO_PKG_VERSION"));

/// Posts submissions to the configured endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl SubmissionGateway for HttpGateway {
    async fn send(&self, record: &WireRecord) -> Result<Ack, SubmitFailure> {
        let payload = record
            .encode(self.config.encoding)
            .map_err(|err| SubmitFailure::Encode(err.to_string()))?;
        debug!(
            endpoint = %self.config.endpoint,
            content_type = payload.content_type,
            fields = record.len(),
            "posting submission"
        );

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(payload.content_type))
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .body(payload.body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        match self.config.ack_policy {
            AckPolicy::Optimistic => Ok(Ack {
                status: Some(status.as_u16()),
            }),
            AckPolicy::Confirmed if status.is_success() => Ok(Ack {
                status: Some(status.as_u16()),
            }),
            AckPolicy::Confirmed => {
                warn!(status = status.as_u16(), "endpoint did not confirm submission");
                Err(SubmitFailure::Rejected(status.as_u16()))
            }
        }
    }
}

fn classify(err: reqwest::Error) -> SubmitFailure {
    if err.is_timeout() {
        SubmitFailure::Timeout
    } else {
        SubmitFailure::Transport(err.to_string())
    }
}
