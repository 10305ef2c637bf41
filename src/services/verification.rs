//! Verification service: checks a signature against recomputed content.
//!
//! Every decode or cryptographic failure is folded into the returned
//! `VerificationReport`; nothing here aborts the caller's request flow.

use openssl::md::Md;
use openssl::pkey_ctx::PkeyCtx;
use openssl::rsa::Padding;

use crate::domain::crypto::{DigestBytes, SignatureValue};
use crate::domain::envelope::ExtractedSignature;
use crate::domain::verification::VerificationReport;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::keys::{KeyMaterial, VerifyingKey};

#[derive(Debug, Default, Clone, Copy)]
pub struct VerificationService;

impl VerificationService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Recompute the content digest, hash its hex text again and check the
    /// PKCS#1 v1.5 signature with key material taken from a signature record.
    #[must_use]
    pub fn verify_against_content(
        &self,
        content: &[u8],
        signature_b64: &str,
        material: &KeyMaterial,
    ) -> VerificationReport {
        let digest = DigestBytes::compute(content);
        let report = material
            .resolve()
            .and_then(|key| self.check(&digest, signature_b64, &key));
        Self::into_report(digest, report)
    }

    /// Same as `verify_against_content` with an already decoded key.
    #[must_use]
    pub fn verify_with_key(
        &self,
        content: &[u8],
        signature_b64: &str,
        key: &VerifyingKey,
    ) -> VerificationReport {
        let digest = DigestBytes::compute(content);
        let report = self.check(&digest, signature_b64, key);
        Self::into_report(digest, report)
    }

    /// Verify an extracted envelope, trying each content candidate in turn.
    /// The first passing candidate wins; otherwise the verbatim content's
    /// report is returned.
    #[must_use]
    pub fn verify_extracted(
        &self,
        extracted: &ExtractedSignature,
        material: &KeyMaterial,
    ) -> VerificationReport {
        let key = match material.resolve() {
            Ok(key) => key,
            Err(e) => {
                let digest = DigestBytes::compute(extracted.content()).to_hex();
                return VerificationReport::rejected(e).with_digest(digest);
            }
        };

        let mut first: Option<VerificationReport> = None;
        for candidate in extracted.content_candidates() {
            let report = self.verify_with_key(candidate, extracted.signature_b64(), &key);
            if report.verified {
                return report;
            }
            first.get_or_insert(report);
        }
        first.unwrap_or_else(|| {
            VerificationReport::rejected(SigningError::EnvelopeMalformed(
                "no content to verify".to_string(),
            ))
        })
    }

    fn check(
        &self,
        digest: &DigestBytes,
        signature_b64: &str,
        key: &VerifyingKey,
    ) -> SigningResult<()> {
        let signature = SignatureValue::from_base64(signature_b64)?;
        let message = digest.signed_message();

        let mut ctx = PkeyCtx::new(key.pkey()).map_err(verification_error)?;
        ctx.verify_init().map_err(verification_error)?;
        ctx.set_rsa_padding(Padding::PKCS1)
            .map_err(verification_error)?;
        ctx.set_signature_md(Md::sha256())
            .map_err(verification_error)?;

        match ctx.verify(message.as_slice(), signature.as_slice()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SigningError::VerificationFailed(
                "signature does not match content".to_string(),
            )),
            Err(e) => Err(verification_error(e)),
        }
    }

    fn into_report(digest: DigestBytes, outcome: SigningResult<()>) -> VerificationReport {
        let digest_hex = digest.to_hex();
        match outcome {
            Ok(()) => {
                log::info!("Signature verified for digest {digest_hex}");
                VerificationReport::verified(digest_hex)
            }
            Err(e) => {
                log::warn!("Signature rejected for digest {digest_hex}: {e}");
                VerificationReport::rejected(e).with_digest(digest_hex)
            }
        }
    }
}

fn verification_error(e: openssl::error::ErrorStack) -> SigningError {
    SigningError::VerificationFailed(e.to_string())
}
