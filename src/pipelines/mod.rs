//! Workflow pipelines orchestrating stateless services against the stores.

pub mod certificate;
pub mod document;
pub mod sign;
pub mod verify;

pub use certificate::{CertificateWorkflow, IssuanceMode};
pub use document::DocumentWorkflow;
pub use sign::{SignOptions, SignOutcome, SignWorkflow};
pub use verify::VerifyWorkflow;
