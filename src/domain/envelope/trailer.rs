//! Length-prefixed binary trailer container.
//!
//! Layout: `original || signature || u32-BE signature length || TRAILER_MAGIC`.
//! Parsing starts from the end of the file, so the original bytes may contain
//! anything, including the textual envelope markers.

use super::{EnvelopeFormat, ExtractedSignature};
use crate::domain::constants::{MAX_TRAILER_SIGNATURE_LEN, TRAILER_LENGTH_FIELD, TRAILER_MAGIC};
use crate::domain::crypto::SignatureValue;
use crate::infra::error::{SigningError, SigningResult};

pub struct TrailerEnvelope;

impl TrailerEnvelope {
    #[must_use]
    pub fn seal(original: &[u8], signature: &SignatureValue) -> Vec<u8> {
        let sig = signature.as_slice();
        let mut out =
            Vec::with_capacity(original.len() + sig.len() + TRAILER_LENGTH_FIELD + TRAILER_MAGIC.len());
        out.extend_from_slice(original);
        out.extend_from_slice(sig);
        out.extend_from_slice(&(sig.len() as u32).to_be_bytes());
        out.extend_from_slice(TRAILER_MAGIC);
        out
    }

    #[must_use]
    pub fn is_sealed(bytes: &[u8]) -> bool {
        bytes.len() >= TRAILER_MAGIC.len() + TRAILER_LENGTH_FIELD && bytes.ends_with(TRAILER_MAGIC)
    }

    /// Split a sealed file into the exact original bytes and the signature.
    pub fn open(sealed: &[u8]) -> SigningResult<(Vec<u8>, SignatureValue)> {
        if !Self::is_sealed(sealed) {
            return Err(SigningError::EnvelopeMalformed(
                "missing signature trailer".to_string(),
            ));
        }
        let len_end = sealed.len() - TRAILER_MAGIC.len();
        let len_start = len_end - TRAILER_LENGTH_FIELD;
        let sig_len = u32::from_be_bytes([
            sealed[len_start],
            sealed[len_start + 1],
            sealed[len_start + 2],
            sealed[len_start + 3],
        ]) as usize;

        if sig_len == 0 || sig_len > MAX_TRAILER_SIGNATURE_LEN || sig_len > len_start {
            return Err(SigningError::EnvelopeMalformed(format!(
                "trailer declares impossible signature length {sig_len}"
            )));
        }
        let sig_start = len_start - sig_len;
        Ok((
            sealed[..sig_start].to_vec(),
            SignatureValue::new(sealed[sig_start..len_start].to_vec()),
        ))
    }

    pub fn extract(sealed: &[u8]) -> SigningResult<ExtractedSignature> {
        let (content, signature) = Self::open(sealed)?;
        log::debug!(
            "Opened trailer envelope: content={} bytes, signature={} bytes",
            content.len(),
            signature.len()
        );
        Ok(ExtractedSignature::new(
            content,
            signature.to_base64(),
            EnvelopeFormat::Trailer,
        ))
    }
}
