//! Document Signer Library
//!
//! Document integrity and signing engine: SHA-256 document digests, RSA-2048
//! PKCS#1 v1.5 signatures carried in text or binary envelopes, and X.509
//! client certificate issuance (self-signed, CA-signed or from a CSR).
//!
//! The free functions below are the stateless core. Workflows in
//! [`pipelines`] sequence them against the store contracts in [`adapters`].

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use domain::crypto::{
    CertificateSummary, DigestBytes, IssuedCertificate, SerialNumberPolicy, SignatureValue,
};
pub use domain::envelope::{EnvelopeFormat, ExtractedSignature, TextEnvelope, TrailerEnvelope};
pub use domain::records::{Document, DocumentStatus, SignatureRecord, User};
pub use domain::types::{DocumentId, SignatureId, UserId};
pub use domain::verification::VerificationReport;
pub use infra::config::{ConfigManager, SignerConfiguration};
pub use infra::error::{ErrorKind, SigningError, SigningResult};
pub use services::{
    CertificateAuthority, CertificateInspector, CertificateIssuer, KeyMaterial, KeyPair,
    SigningKey, VerifyingKey,
};

use services::{DigestService, KeyService, SigningService, VerificationService};

/// Lowercase hex SHA-256 of `content`.
#[must_use]
pub fn compute_digest(content: &[u8]) -> String {
    DigestService::new().compute_digest(content)
}

/// Append the text signature envelope to `original`.
#[must_use]
pub fn embed_signature(original: &[u8], signature_b64: &str) -> Vec<u8> {
    TextEnvelope::embed(original, signature_b64)
}

/// Split a text-enveloped file into content and base64 signature.
pub fn extract_signature(signed: &[u8]) -> SigningResult<ExtractedSignature> {
    TextEnvelope::extract(signed)
}

pub fn generate_key_pair() -> SigningResult<KeyPair> {
    KeyService::new().generate_key_pair()
}

/// Sign `SHA256(digest_hex)` with PKCS#1 v1.5 / SHA-256.
pub fn sign_digest(digest_hex: &str, key: &SigningKey) -> SigningResult<SignatureValue> {
    SigningService::new().sign_digest(digest_hex, key)
}

/// Check `signature_b64` over `content`. Failures are carried in the report.
#[must_use]
pub fn verify_against_content(
    content: &[u8],
    signature_b64: &str,
    material: &KeyMaterial,
) -> VerificationReport {
    VerificationService::new().verify_against_content(content, signature_b64, material)
}

pub fn self_signed_user_certificate(name: &str, email: &str) -> SigningResult<IssuedCertificate> {
    CertificateIssuer::default().self_signed_user_certificate(name, email)
}

pub fn issue_via_ephemeral_ca(name: &str, email: &str) -> SigningResult<IssuedCertificate> {
    CertificateIssuer::default().issue_via_ephemeral_ca(name, email)
}

/// Sign a PEM `CERTIFICATE REQUEST` with an ephemeral CA.
pub fn issue_from_csr(csr_pem: &str) -> SigningResult<String> {
    CertificateIssuer::default().issue_from_csr(csr_pem)
}

pub fn inspect_certificate(pem: &str) -> SigningResult<CertificateSummary> {
    CertificateInspector::inspect_pem(pem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_round_trip() {
        let content = b"quarterly report";
        let pair = generate_key_pair().unwrap();
        let signature = sign_digest(&compute_digest(content), pair.signing_key()).unwrap();
        let signed = embed_signature(content, &signature.to_base64());

        let extracted = extract_signature(&signed).unwrap();
        assert_eq!(extracted.signature_b64(), signature.to_base64());

        let material = KeyMaterial::PublicKey(pair.verifying_key().to_public_key_b64().unwrap());
        let report = VerificationService::new().verify_extracted(&extracted, &material);
        assert!(report.verified);
        assert!(verify_against_content(content, extracted.signature_b64(), &material).verified);
    }
}
