//! Submission side of the contact-lens intake form: the form state machine,
//! wire encoding, and the gateway that posts accepted submissions.

pub mod config;
pub mod encode;
pub mod gateway;
pub mod http;
pub mod machine;
pub mod notice;
pub mod session;

pub use config::{
    AckPolicy, ConfigError, GatewayConfig, IntakeConfig, NoticeConfig, PayloadEncoding,
};
pub use encode::{WirePayload, WireRecord};
pub use gateway::{Ack, SubmissionGateway, SubmitFailure};
pub use http::HttpGateway;
pub use machine::{FormError, FormMachine, Submission, SubmissionState, SubmitAttempt};
pub use notice::{FAILURE_MESSAGE, Notice, NoticeKind, SUCCESS_MESSAGE};
pub use session::{FormSession, SubmitReport};
