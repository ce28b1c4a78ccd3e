use async_trait::async_trait;
use thiserror::Error;

use crate::encode::WireRecord;

/// Acknowledgement returned by a gateway after a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// HTTP status when one was observed.
    pub status: Option<u16>,
}

/// Why a submission did not reach a successful acknowledgement.
///
/// The display text is the reason recorded in `SubmissionState::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitFailure {
    #[error("timeout")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode submission: {0}")]
    Encode(String),
    #[error("endpoint rejected submission with status {0}")]
    Rejected(u16),
}

/// Delivers one submission to the intake endpoint. Implementations make a single
/// attempt and never retry.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn send(&self, record: &WireRecord) -> Result<Ack, SubmitFailure>;
}
