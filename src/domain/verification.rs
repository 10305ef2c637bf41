//! Verification domain types.
//!
//! A rejected signature is a normal outcome, not an error: the report carries
//! `verified = false` together with the reason. Only broken infrastructure
//! (unreadable stores, I/O) escapes a verification workflow as `Err`.

use crate::domain::types::{DocumentId, SignatureId};
use crate::infra::error::SigningError;

/// Result of verifying a signature against document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// True only if the PKCS#1 v1.5 check passed.
    pub verified: bool,
    /// Digest recomputed from the submitted content, when it got that far.
    pub digest: Option<String>,
    /// Document the submission was matched to.
    pub document_id: Option<DocumentId>,
    /// Signature record whose key material was used.
    pub signature_id: Option<SignatureId>,
    /// Why verification did not succeed.
    pub failure: Option<SigningError>,
}

impl VerificationReport {
    #[must_use]
    pub fn verified(digest: String) -> Self {
        Self {
            verified: true,
            digest: Some(digest),
            document_id: None,
            signature_id: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn rejected(failure: SigningError) -> Self {
        Self {
            verified: false,
            digest: None,
            document_id: None,
            signature_id: None,
            failure: Some(failure),
        }
    }

    #[must_use]
    pub fn with_digest(mut self, digest: String) -> Self {
        self.digest = Some(digest);
        self
    }

    #[must_use]
    pub fn with_document(mut self, id: DocumentId) -> Self {
        self.document_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_signature(mut self, id: SignatureId) -> Self {
        self.signature_id = Some(id);
        self
    }

    /// Human-readable outcome, suitable for an API response.
    #[must_use]
    pub fn reason(&self) -> String {
        match &self.failure {
            None if self.verified => "Signature is valid".to_string(),
            None => "Signature was not checked".to_string(),
            Some(err) => err.to_string(),
        }
    }
}
