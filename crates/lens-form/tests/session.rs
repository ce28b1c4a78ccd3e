use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lens_form::{
    Ack, FormSession, NoticeConfig, NoticeKind, SubmissionGateway, SubmissionState, SubmitFailure,
    SubmitReport, WireRecord,
};
use lens_spec::contact_lens;
use tokio::sync::Notify;

struct Recording {
    calls: AtomicUsize,
    records: Mutex<Vec<WireRecord>>,
    outcome: Result<Ack, SubmitFailure>,
}

impl Recording {
    fn answering(outcome: Result<Ack, SubmitFailure>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
            outcome,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionGateway for Recording {
    async fn send(&self, record: &WireRecord) -> Result<Ack, SubmitFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(record.clone());
        self.outcome.clone()
    }
}

/// Holds every request until released.
struct Gate {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl SubmissionGateway for Gate {
    async fn send(&self, _record: &WireRecord) -> Result<Ack, SubmitFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Ack { status: Some(200) })
    }
}

/// Never answers.
struct Silent;

#[async_trait]
impl SubmissionGateway for Silent {
    async fn send(&self, _record: &WireRecord) -> Result<Ack, SubmitFailure> {
        std::future::pending().await
    }
}

fn session(gateway: Arc<dyn SubmissionGateway>) -> FormSession {
    FormSession::new(
        contact_lens().expect("registry"),
        gateway,
        &NoticeConfig::default(),
        Duration::from_secs(5),
    )
}

fn fill_new_wearer(session: &FormSession) {
    for (field, value) in [
        ("name", "A"),
        ("mobile", "1234567890"),
        ("age", "25"),
        ("gender", "male"),
        ("hasPreviousLenses", "false"),
        ("rightEyePower", "-2.5"),
        ("leftEyePower", "-2.75"),
        ("wantMultifocal", "false"),
    ] {
        session.apply_edit(field, value).expect("known field");
    }
}

#[tokio::test]
async fn new_wearer_submission_succeeds_and_resets() {
    let gateway = Recording::answering(Ok(Ack { status: Some(200) }));
    let session = session(gateway.clone());
    fill_new_wearer(&session);

    let report = session.submit().await;
    assert_eq!(report, SubmitReport::Succeeded(Ack { status: Some(200) }));
    assert_eq!(gateway.calls(), 1);

    let records = gateway.records.lock().unwrap();
    assert_eq!(records[0].get("rightEyePower"), Some("-2.5"));
    assert_eq!(records[0].get("lensType"), Some(""));

    let machine = session.snapshot();
    assert_eq!(machine.state(), &SubmissionState::Succeeded);
    assert_eq!(
        machine.transitions(),
        &[
            SubmissionState::Idle,
            SubmissionState::Validating,
            SubmissionState::Submitting,
            SubmissionState::Succeeded,
        ]
    );
    assert!(machine.answers().is_empty());
    assert!(machine.touched().is_empty());
    assert_eq!(machine.notice().map(|notice| notice.kind), Some(NoticeKind::Success));
}

#[tokio::test]
async fn invalid_answers_never_reach_the_gateway() {
    let gateway = Recording::answering(Ok(Ack { status: Some(200) }));
    let session = session(gateway.clone());
    session.apply_edit("name", "A").unwrap();
    session.apply_edit("mobile", "12345").unwrap();

    let SubmitReport::Rejected(result) = session.submit().await else {
        panic!("expected validation rejection");
    };
    assert_eq!(result.message("mobile"), Some("Invalid mobile number"));
    assert_eq!(gateway.calls(), 0);
    session.with_machine(|machine| {
        assert_eq!(machine.state(), &SubmissionState::Idle);
        assert_eq!(machine.answers().get("name"), Some("A"));
    });
}

#[tokio::test]
async fn gateway_failure_keeps_answers_for_retry() {
    let gateway = Recording::answering(Err(SubmitFailure::Rejected(502)));
    let session = session(gateway.clone());
    fill_new_wearer(&session);

    let report = session.submit().await;
    assert_eq!(report, SubmitReport::Failed(SubmitFailure::Rejected(502)));

    let machine = session.snapshot();
    assert!(matches!(machine.state(), SubmissionState::Failed(reason) if reason.contains("502")));
    assert_eq!(machine.answers().get("mobile"), Some("1234567890"));
    let notice = machine.notice().expect("failure notice");
    assert_eq!(notice.message, "Failed to submit form. Please try again.");

    session.dismiss_notice();
    session.with_machine(|machine| assert_eq!(machine.state(), &SubmissionState::Idle));

    session.submit().await;
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn silent_gateway_times_out() {
    let session = FormSession::new(
        contact_lens().expect("registry"),
        Arc::new(Silent),
        &NoticeConfig::default(),
        Duration::from_millis(50),
    );
    fill_new_wearer(&session);

    assert_eq!(session.submit().await, SubmitReport::Failed(SubmitFailure::Timeout));
    session.with_machine(|machine| {
        assert_eq!(machine.state(), &SubmissionState::Failed("timeout".into()));
        assert_eq!(machine.answers().get("name"), Some("A"));
    });
}

#[tokio::test]
async fn one_request_per_submission_while_in_flight() {
    let gate = Arc::new(Gate {
        calls: AtomicUsize::new(0),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let session = session(gate.clone());
    fill_new_wearer(&session);

    let background = session.clone();
    let first = tokio::spawn(async move { background.submit().await });
    gate.entered.notified().await;

    assert!(session.with_machine(|machine| machine.is_submitting()));
    assert_eq!(session.submit().await, SubmitReport::AlreadySubmitting);
    session.apply_edit("name", "B").expect("edits accepted while submitting");
    let payload = session.render();
    assert_eq!(
        payload.field("name").and_then(|field| field.current_value.as_deref()),
        Some("B")
    );

    gate.release.notify_one();
    let report = first.await.expect("submit task");
    assert_eq!(report, SubmitReport::Succeeded(Ack { status: Some(200) }));
    assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn conditional_fields_follow_governing_answer() {
    let gateway = Recording::answering(Ok(Ack { status: None }));
    let session = session(gateway.clone());
    fill_new_wearer(&session);
    session.apply_edit("hasPreviousLenses", "true").unwrap();

    let SubmitReport::Rejected(result) = session.submit().await else {
        panic!("returning wearer needs lens details");
    };
    assert!(result.has_error("toric"));
    assert!(result.has_error("wearingSchedule"));
    assert!(!result.has_error("rightEyePower"));

    session.apply_edit("toric", "false").unwrap();
    session.apply_edit("wearingSchedule", "yearly").unwrap();
    session.apply_edit("lensType", "OPTIMA").unwrap();
    assert!(matches!(session.submit().await, SubmitReport::Succeeded(_)));

    let records = gateway.records.lock().unwrap();
    assert_eq!(records[0].get("lensType"), Some("OPTIMA"));
    // eye powers entered earlier are hidden for returning wearers
    assert_eq!(records[0].get("rightEyePower"), Some(""));
}
