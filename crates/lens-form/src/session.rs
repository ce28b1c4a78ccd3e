use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lens_spec::{FieldRegistry, RenderPayload, ValidationResult};
use tracing::{Instrument, info_span, warn};

use crate::config::{ConfigError, IntakeConfig, NoticeConfig};
use crate::gateway::{Ack, SubmissionGateway, SubmitFailure};
use crate::http::HttpGateway;
use crate::machine::{FormError, FormMachine, SubmitAttempt};

/// How a call to [`FormSession::submit`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReport {
    Succeeded(Ack),
    Failed(SubmitFailure),
    Rejected(ValidationResult),
    AlreadySubmitting,
}

/// Shared handle pairing a [`FormMachine`] with a gateway.
///
/// Edits may arrive while a submission is awaiting the gateway; the machine
/// lock is never held across an await point.
#[derive(Clone)]
pub struct FormSession {
    machine: Arc<Mutex<FormMachine>>,
    gateway: Arc<dyn SubmissionGateway>,
    timeout: Duration,
}

impl FormSession {
    pub fn new(
        registry: Arc<FieldRegistry>,
        gateway: Arc<dyn SubmissionGateway>,
        notice: &NoticeConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            machine: Arc::new(Mutex::new(FormMachine::new(registry, notice))),
            gateway,
            timeout,
        }
    }

    /// Session posting over HTTP as described by `config`.
    pub fn from_config(
        registry: Arc<FieldRegistry>,
        config: &IntakeConfig,
    ) -> Result<Self, ConfigError> {
        let gateway = HttpGateway::new(config.gateway.clone())?;
        Ok(Self::new(
            registry,
            Arc::new(gateway),
            &config.notice,
            config.gateway.timeout(),
        ))
    }

    pub fn apply_edit(&self, field: &str, raw: impl Into<String>) -> Result<(), FormError> {
        self.lock().apply_edit(field, raw)
    }

    pub fn render(&self) -> RenderPayload {
        self.lock().render()
    }

    /// Clone of the machine as it stands now.
    pub fn snapshot(&self) -> FormMachine {
        self.lock().clone()
    }

    pub fn with_machine<R>(&self, f: impl FnOnce(&FormMachine) -> R) -> R {
        f(&self.lock())
    }

    pub fn dismiss_notice(&self) {
        self.lock().dismiss_notice();
    }

    pub fn expire_notice(&self, now: Instant) -> bool {
        self.lock().expire_notice(now)
    }

    /// Validates, sends one request through the gateway, and settles the machine.
    ///
    /// A gateway that does not answer within the configured timeout is recorded
    /// as a `timeout` failure.
    pub async fn submit(&self) -> SubmitReport {
        let attempt = self.lock().begin_submit();
        let submission = match attempt {
            SubmitAttempt::Ready(submission) => submission,
            SubmitAttempt::Rejected(result) => return SubmitReport::Rejected(result),
            SubmitAttempt::AlreadySubmitting => return SubmitReport::AlreadySubmitting,
        };

        let ticket = submission.ticket();
        let outcome = tokio::time::timeout(self.timeout, self.gateway.send(submission.record()))
            .instrument(info_span!("submit", ticket))
            .await
            .unwrap_or(Err(SubmitFailure::Timeout));

        if let Err(err) = self.lock().complete_submit(ticket, outcome.clone()) {
            warn!(ticket, %err, "gateway outcome not applied");
        }

        match outcome {
            Ok(ack) => SubmitReport::Succeeded(ack),
            Err(failure) => SubmitReport::Failed(failure),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
