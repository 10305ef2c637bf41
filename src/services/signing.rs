//! Signing service: PKCS#1 v1.5 / SHA-256 over a document digest.
//!
//! The signed message is not the digest bytes. It is `SHA256(digest_hex)`,
//! the hash of the lowercase hex text stored on the document. Signatures
//! produced elsewhere in the system follow the same convention and will only
//! verify if it is kept.

use openssl::error::ErrorStack;
use openssl::md::Md;
use openssl::pkey_ctx::PkeyCtx;
use openssl::rsa::Padding;

use crate::domain::constants::DIGEST_HEX_LEN;
use crate::domain::crypto::{DigestBytes, SignatureValue};
use crate::infra::error::{SigningError, SigningResult};
use crate::services::keys::SigningKey;

#[derive(Debug, Default, Clone, Copy)]
pub struct SigningService;

impl SigningService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sign a document digest given as 64 hex characters.
    pub fn sign_digest(&self, digest_hex: &str, key: &SigningKey) -> SigningResult<SignatureValue> {
        let digest = parse_digest_hex(digest_hex)?;
        self.sign_message_hash(&digest.signed_message(), key)
    }

    /// Sign an already-computed message hash with PKCS#1 v1.5 padding and a
    /// SHA-256 DigestInfo.
    pub fn sign_message_hash(
        &self,
        message_hash: &DigestBytes,
        key: &SigningKey,
    ) -> SigningResult<SignatureValue> {
        let mut ctx = PkeyCtx::new(key.pkey())
            .map_err(|e| SigningError::SignatureError(format!("signing context: {e}")))?;
        ctx.sign_init().map_err(setup_error)?;
        ctx.set_rsa_padding(Padding::PKCS1).map_err(setup_error)?;
        ctx.set_signature_md(Md::sha256()).map_err(setup_error)?;

        let mut signature = Vec::new();
        ctx.sign_to_vec(message_hash.as_slice(), &mut signature)
            .map_err(|e| SigningError::SignatureError(format!("failed to sign digest: {e}")))?;
        log::debug!("Produced {}-byte RSA signature", signature.len());
        Ok(SignatureValue::new(signature))
    }
}

fn setup_error(e: ErrorStack) -> SigningError {
    SigningError::SignatureError(format!("signing setup: {e}"))
}

/// Documents store lowercase hex; anything else is rejected before signing.
pub(crate) fn parse_digest_hex(digest_hex: &str) -> SigningResult<DigestBytes> {
    if digest_hex.len() != DIGEST_HEX_LEN
        || !digest_hex
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(SigningError::ValidationError(format!(
            "digest must be {DIGEST_HEX_LEN} lowercase hex characters"
        )));
    }
    DigestBytes::from_hex(digest_hex).map_err(|e| SigningError::ValidationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keys::KeyService;
    use openssl::hash::MessageDigest;
    use openssl::sign::Verifier;

    #[test]
    fn signature_equals_signing_hex_text_with_sha256() {
        let pair = KeyService::new().generate_key_pair().unwrap();
        let digest_hex = DigestBytes::compute(b"hello world").to_hex();
        let sig = SigningService::new()
            .sign_digest(&digest_hex, pair.signing_key())
            .unwrap();
        assert_eq!(sig.len(), 256);

        // A plain SHA-256 verifier fed the hex text accepts it, so the
        // signed message really is SHA256(digest_hex).
        let public = pair.verifying_key().pkey();
        let mut verifier = Verifier::new(MessageDigest::sha256(), public).unwrap();
        verifier.update(digest_hex.as_bytes()).unwrap();
        assert!(verifier.verify(sig.as_slice()).unwrap());

        // ...and not SHA256(digest bytes).
        let mut raw = Verifier::new(MessageDigest::sha256(), public).unwrap();
        raw.update(DigestBytes::compute(b"hello world").as_slice()).unwrap();
        assert!(!raw.verify(sig.as_slice()).unwrap_or(false));
    }

    #[test]
    fn pkcs1v15_is_deterministic() {
        let pair = KeyService::new().generate_key_pair().unwrap();
        let digest_hex = DigestBytes::compute(b"abc").to_hex();
        let svc = SigningService::new();
        let a = svc.sign_digest(&digest_hex, pair.signing_key()).unwrap();
        let b = svc.sign_digest(&digest_hex, pair.signing_key()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_canonical_digest() {
        let pair = KeyService::new().generate_key_pair().unwrap();
        let svc = SigningService::new();
        let upper = DigestBytes::compute(b"abc").to_hex().to_uppercase();
        assert!(matches!(
            svc.sign_digest(&upper, pair.signing_key()),
            Err(SigningError::ValidationError(_))
        ));
        assert!(svc.sign_digest("abcd", pair.signing_key()).is_err());
    }
}
