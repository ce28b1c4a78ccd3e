use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lens_spec::{
    ActivityMap, AnswerSet, Evaluation, FieldRegistry, RenderPayload, SchemaError,
    ValidationResult, build_render_payload_with, contact_lens, evaluate,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::NoticeConfig;
use crate::encode::WireRecord;
use crate::gateway::{Ack, SubmitFailure};
use crate::notice::Notice;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("submission {0} is not in flight")]
    StaleSubmission(u64),
}

/// Submission lifecycle. Exactly one value holds at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed(_) => "failed",
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, SubmissionState::Succeeded | SubmissionState::Failed(_))
    }
}

/// Snapshot of an accepted submission, handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    ticket: u64,
    record: WireRecord,
}

impl Submission {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn record(&self) -> &WireRecord {
        &self.record
    }
}

/// Outcome of [`FormMachine::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAttempt {
    /// Validation passed; the machine is now `Submitting`.
    Ready(Submission),
    /// At least one active field is invalid; the machine is back to `Idle`.
    Rejected(ValidationResult),
    /// A submission is already in flight; nothing changed.
    AlreadySubmitting,
}

/// Owns the answers, touched flags, validation result, and submission state of
/// one form session.
#[derive(Debug, Clone)]
pub struct FormMachine {
    registry: Arc<FieldRegistry>,
    answers: AnswerSet,
    touched: BTreeSet<String>,
    evaluation: Evaluation,
    state: SubmissionState,
    notice: Option<Notice>,
    notice_ttl: Duration,
    next_ticket: u64,
    in_flight: Option<u64>,
    transitions: Vec<SubmissionState>,
}

impl FormMachine {
    pub fn new(registry: Arc<FieldRegistry>, notice: &NoticeConfig) -> Self {
        let answers = AnswerSet::new();
        let evaluation = evaluate(&registry, &answers);
        Self {
            registry,
            answers,
            touched: BTreeSet::new(),
            evaluation,
            state: SubmissionState::Idle,
            notice: None,
            notice_ttl: notice.ttl(),
            next_ticket: 1,
            in_flight: None,
            transitions: vec![SubmissionState::Idle],
        }
    }

    /// Machine over the canonical contact-lens registry.
    pub fn contact_lens(notice: &NoticeConfig) -> Result<Self, SchemaError> {
        Ok(Self::new(contact_lens()?, notice))
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.evaluation.result
    }

    pub fn activity(&self) -> &ActivityMap {
        &self.evaluation.activity
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Current notice, or `None` once its display time has elapsed.
    ///
    /// The submission state settles back to `Idle` only through
    /// [`expire_notice`](Self::expire_notice) or [`dismiss_notice`](Self::dismiss_notice).
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|notice| !notice.is_expired(Instant::now()))
    }

    /// States visited by the most recent submit attempt, starting at `Idle`.
    pub fn transitions(&self) -> &[SubmissionState] {
        &self.transitions
    }

    pub fn render(&self) -> RenderPayload {
        build_render_payload_with(&self.registry, &self.answers, &self.touched, &self.evaluation)
    }

    /// Records a raw value for `field` and recomputes validation and activity.
    ///
    /// Accepted in every submission state, including while a submission is in flight.
    pub fn apply_edit(&mut self, field: &str, raw: impl Into<String>) -> Result<(), FormError> {
        if !self.registry.contains(field) {
            warn!(field, "edit rejected for unknown field");
            return Err(FormError::UnknownField(field.to_string()));
        }

        self.answers.set(field, raw);
        self.touched.insert(field.to_string());
        self.revalidate();

        debug!(
            field,
            valid = !self.evaluation.result.has_error(field),
            dependents = ?self.registry.dependents_of(field),
            errors = self.evaluation.result.len(),
            "applied edit"
        );
        Ok(())
    }

    /// Validates everything and, when no active field has an error, moves to
    /// `Submitting` and returns the snapshot to send.
    pub fn begin_submit(&mut self) -> SubmitAttempt {
        if self.is_submitting() {
            debug!(ticket = ?self.in_flight, "submit ignored while a submission is in flight");
            return SubmitAttempt::AlreadySubmitting;
        }

        self.notice = None;
        self.state = SubmissionState::Idle;
        self.transitions = vec![SubmissionState::Idle];

        self.transition(SubmissionState::Validating);
        let names: Vec<String> = self
            .registry
            .fields()
            .iter()
            .map(|field| field.name.clone())
            .collect();
        self.touched.extend(names);
        self.revalidate();

        if !self.evaluation.result.is_valid() {
            self.transition(SubmissionState::Idle);
            info!(
                errors = self.evaluation.result.len(),
                "submission blocked by validation errors"
            );
            return SubmitAttempt::Rejected(self.evaluation.result.clone());
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.transition(SubmissionState::Submitting);
        info!(ticket, form = self.registry.id(), "submission started");

        SubmitAttempt::Ready(Submission {
            ticket,
            record: WireRecord::from_answers(
                &self.registry,
                &self.answers,
                &self.evaluation.activity,
            ),
        })
    }

    /// Feeds the gateway outcome for `ticket` back into the machine.
    pub fn complete_submit(
        &mut self,
        ticket: u64,
        outcome: Result<Ack, SubmitFailure>,
    ) -> Result<(), FormError> {
        if self.in_flight != Some(ticket) {
            return Err(FormError::StaleSubmission(ticket));
        }
        self.in_flight = None;

        match outcome {
            Ok(ack) => {
                info!(ticket, status = ?ack.status, "submission succeeded");
                self.answers.clear();
                self.touched.clear();
                self.revalidate();
                self.notice = Some(Notice::success(self.notice_ttl));
                self.transition(SubmissionState::Succeeded);
            }
            Err(failure) => {
                let reason = failure.to_string();
                warn!(ticket, %reason, "submission failed");
                self.notice = Some(Notice::failure(reason.clone(), self.notice_ttl));
                self.transition(SubmissionState::Failed(reason));
            }
        }
        Ok(())
    }

    /// Clears the current notice; a settled submission returns to `Idle`.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        if self.state.is_settled() {
            self.transition(SubmissionState::Idle);
        }
    }

    /// Dismisses the notice if its display time has elapsed at `now`.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some(notice) if notice.is_expired(now) => {
                self.dismiss_notice();
                true
            }
            _ => false,
        }
    }

    fn revalidate(&mut self) {
        self.evaluation = evaluate(&self.registry, &self.answers);
    }

    fn transition(&mut self, next: SubmissionState) {
        debug!(from = self.state.as_str(), to = next.as_str(), "submission state");
        self.state = next.clone();
        self.transitions.push(next);
    }
}
