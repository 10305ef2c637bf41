//! `VerifyWorkflow`: verify a signed file submitted by a user.
//!
//! The envelope is extracted, the document is located by the digest of the
//! recovered content and the submitting owner, and the signature is checked
//! with the key material of a stored signature record. Verification never
//! mutates the document.

use std::sync::Arc;

use crate::adapters::store::{DocumentStore, SignatureStore};
use crate::domain::envelope::EnvelopeFormat;
use crate::domain::records::{Document, SignatureRecord};
use crate::domain::types::UserId;
use crate::domain::verification::VerificationReport;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::digest::DigestService;
use crate::services::keys::KeyMaterial;
use crate::services::verification::VerificationService;

/// Orchestrates verification steps for a signed upload.
pub struct VerifyWorkflow {
    documents: Arc<dyn DocumentStore>,
    signatures: Arc<dyn SignatureStore>,
    digest: DigestService,
    svc: VerificationService,
}

impl VerifyWorkflow {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, signatures: Arc<dyn SignatureStore>) -> Self {
        Self {
            documents,
            signatures,
            digest: DigestService::new(),
            svc: VerificationService::new(),
        }
    }

    /// Run verification over signed bytes uploaded by `owner`.
    ///
    /// Rejections come back as `Ok` with `verified == false`; only store
    /// failures are returned as `Err`.
    pub fn run(&self, owner: &UserId, signed: &[u8]) -> SigningResult<VerificationReport> {
        let format = EnvelopeFormat::detect(signed);
        let extracted = match format.extract(signed) {
            Ok(extracted) => extracted,
            Err(e) if e.is_reportable() => {
                log::warn!("Rejected upload from {owner}: {e}");
                return Ok(VerificationReport::rejected(e));
            }
            Err(e) => return Err(e),
        };

        let mut first_failure = None;
        for content in extracted.content_candidates() {
            let digest = self.digest.compute_digest(content);
            let Some(document) = self.documents.find_by_digest(&digest, owner)? else {
                continue;
            };
            let report = self.check(&document, content, extracted.signature_b64())?;
            if report.verified {
                return Ok(report);
            }
            first_failure.get_or_insert(report);
        }

        if let Some(report) = first_failure {
            return Ok(report);
        }
        let digest = self.digest.compute_digest(extracted.content());
        log::warn!("No document of {owner} matches digest {digest}");
        Ok(
            VerificationReport::rejected(SigningError::DocumentNotFound(format!(
                "no document with digest {digest}"
            )))
            .with_digest(digest),
        )
    }

    /// Verify `content` against the signature records of `document`.
    fn check(
        &self,
        document: &Document,
        content: &[u8],
        signature_b64: &str,
    ) -> SigningResult<VerificationReport> {
        let records = self.signatures.find_by_document_id(document.id)?;
        let Some(record) = select_record(&records, signature_b64) else {
            return Ok(
                VerificationReport::rejected(SigningError::NoSignatureOnRecord(document.id))
                    .with_digest(document.digest.clone())
                    .with_document(document.id),
            );
        };

        let report = match KeyMaterial::from_record(record) {
            Ok(material) => self
                .svc
                .verify_against_content(content, signature_b64, &material),
            Err(e) => VerificationReport::rejected(e).with_digest(document.digest.clone()),
        };
        log::info!(
            "Verification of document {} with signature {}: {}",
            document.id,
            record.id,
            report.reason()
        );
        Ok(report.with_document(document.id).with_signature(record.id))
    }
}

/// The record that produced `signature_b64` if one did, else the oldest.
fn select_record<'a>(
    records: &'a [SignatureRecord],
    signature_b64: &str,
) -> Option<&'a SignatureRecord> {
    records
        .iter()
        .find(|record| record.signature_raw == signature_b64)
        .or_else(|| records.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        BlobStore, MemoryBlobStore, MemoryDocumentStore, MemorySignatureStore, MemoryUserStore,
    };
    use crate::domain::records::User;
    use crate::pipelines::document::DocumentWorkflow;
    use crate::pipelines::sign::{SignOptions, SignWorkflow};

    struct Fixture {
        documents: DocumentWorkflow,
        sign: SignWorkflow,
        verify: VerifyWorkflow,
        blobs: Arc<MemoryBlobStore>,
        alice: UserId,
    }

    fn fixture(options: SignOptions) -> Fixture {
        let docs = Arc::new(MemoryDocumentStore::new());
        let sigs = Arc::new(MemorySignatureStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let alice = UserId::new("alice").unwrap();
        users
            .insert(User::new(alice.clone(), "Alice", "alice@example.com"))
            .unwrap();
        Fixture {
            documents: DocumentWorkflow::new(docs.clone(), sigs.clone(), blobs.clone()),
            sign: SignWorkflow::new(docs.clone(), sigs.clone(), users, blobs.clone(), options),
            verify: VerifyWorkflow::new(docs, sigs),
            blobs,
            alice,
        }
    }

    fn signed_copy(f: &Fixture, content: &[u8]) -> Vec<u8> {
        let doc = f.documents.upload(&f.alice, "doc.txt", content).unwrap();
        let outcome = f.sign.sign_document(doc.id, &f.alice).unwrap();
        f.blobs.read(&outcome.signed_blob_key).unwrap()
    }

    #[test]
    fn signed_upload_verifies() {
        let f = fixture(SignOptions::default());
        for content in [&b"ends with newline\n"[..], b"no newline", b""] {
            let signed = signed_copy(&f, content);
            let report = f.verify.run(&f.alice, &signed).unwrap();
            assert!(report.verified, "{:?}: {:?}", content, report.failure);
            assert!(report.document_id.is_some());
        }
    }

    #[test]
    fn newline_twins_resolve_to_the_signed_document() {
        let f = fixture(SignOptions::default());
        let with_newline = f.documents.upload(&f.alice, "a.txt", b"abc\n").unwrap();
        let without = f.documents.upload(&f.alice, "b.txt", b"abc").unwrap();

        let outcome = f.sign.sign_document(without.id, &f.alice).unwrap();
        let signed = f.blobs.read(&outcome.signed_blob_key).unwrap();
        let report = f.verify.run(&f.alice, &signed).unwrap();
        assert!(report.verified, "{:?}", report.failure);
        assert_eq!(report.document_id, Some(without.id));

        let outcome = f.sign.sign_document(with_newline.id, &f.alice).unwrap();
        let signed = f.blobs.read(&outcome.signed_blob_key).unwrap();
        let report = f.verify.run(&f.alice, &signed).unwrap();
        assert!(report.verified, "{:?}", report.failure);
        assert_eq!(report.document_id, Some(with_newline.id));
    }

    #[test]
    fn trailer_upload_verifies() {
        let f = fixture(SignOptions {
            envelope_format: EnvelopeFormat::Trailer,
            ..SignOptions::default()
        });
        let signed = signed_copy(&f, b"\x00\x01binary---BEGIN SIGNATURE---\xff");
        assert!(f.verify.run(&f.alice, &signed).unwrap().verified);
    }

    #[test]
    fn tampered_upload_is_not_found_by_digest() {
        let f = fixture(SignOptions::default());
        let mut signed = signed_copy(&f, b"pay 100\n");
        signed[4] = b'9';
        let report = f.verify.run(&f.alice, &signed).unwrap();
        assert!(!report.verified);
        assert!(matches!(
            report.failure,
            Some(SigningError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn other_owner_cannot_match_document() {
        let f = fixture(SignOptions::default());
        let signed = signed_copy(&f, b"private\n");
        let bob = UserId::new("bob").unwrap();
        let report = f.verify.run(&bob, &signed).unwrap();
        assert!(matches!(
            report.failure,
            Some(SigningError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn forged_signature_fails_verification() {
        let f = fixture(SignOptions::default());
        let signed = signed_copy(&f, b"contract\n");
        let text = String::from_utf8(signed).unwrap();
        let forged = text.replacen("---BEGIN SIGNATURE---\n", "---BEGIN SIGNATURE---\nAAAA", 1);
        let report = f.verify.run(&f.alice, forged.as_bytes()).unwrap();
        assert!(!report.verified);
        assert!(matches!(
            report.failure,
            Some(SigningError::VerificationFailed(_))
        ));
    }

    #[test]
    fn missing_envelope_is_malformed() {
        let f = fixture(SignOptions::default());
        let report = f.verify.run(&f.alice, b"just text").unwrap();
        assert!(matches!(
            report.failure,
            Some(SigningError::EnvelopeMalformed(_))
        ));
    }

    #[test]
    fn document_without_signatures_is_reported() {
        let f = fixture(SignOptions::default());
        f.documents.upload(&f.alice, "doc.txt", b"unsigned\n").unwrap();
        let envelope = b"unsigned\n---BEGIN SIGNATURE---\nAAAA\n---END SIGNATURE---\n";
        let report = f.verify.run(&f.alice, envelope).unwrap();
        assert!(matches!(
            report.failure,
            Some(SigningError::NoSignatureOnRecord(_))
        ));
    }
}
