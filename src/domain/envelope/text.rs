//! Marker-delimited textual envelope.
//!
//! ```text
//! <original bytes>[\n]---BEGIN SIGNATURE---
//! <base64 signature>
//! ---END SIGNATURE---
//! ```
//!
//! Not binary safe: content containing the begin marker is split at the first
//! occurrence. Use the trailer container for arbitrary binary documents.

use super::{find_subslice, EnvelopeFormat, ExtractedSignature};
use crate::domain::constants::{BEGIN_SIGNATURE_MARKER, END_SIGNATURE_MARKER};
use crate::infra::error::{SigningError, SigningResult};

pub struct TextEnvelope;

impl TextEnvelope {
    /// Append the signature block. A separator newline is inserted unless the
    /// original already ends with one, so no blank line is ever introduced.
    #[must_use]
    pub fn embed(original: &[u8], signature_b64: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            original.len()
                + BEGIN_SIGNATURE_MARKER.len()
                + signature_b64.len()
                + END_SIGNATURE_MARKER.len()
                + 4,
        );
        out.extend_from_slice(original);
        if original.last() != Some(&b'\n') {
            out.push(b'\n');
        }
        out.extend_from_slice(BEGIN_SIGNATURE_MARKER.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(signature_b64.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(END_SIGNATURE_MARKER.as_bytes());
        out.push(b'\n');
        out
    }

    /// Split a signed file at the first begin marker. Everything before it is
    /// returned verbatim as the content used for re-hashing.
    pub fn extract(signed: &[u8]) -> SigningResult<ExtractedSignature> {
        let begin = find_subslice(signed, BEGIN_SIGNATURE_MARKER.as_bytes()).ok_or_else(|| {
            SigningError::EnvelopeMalformed(format!("missing {BEGIN_SIGNATURE_MARKER} marker"))
        })?;
        let content = &signed[..begin];
        let rest = &signed[begin + BEGIN_SIGNATURE_MARKER.len()..];

        let end = find_subslice(rest, END_SIGNATURE_MARKER.as_bytes()).ok_or_else(|| {
            SigningError::EnvelopeMalformed(format!("missing {END_SIGNATURE_MARKER} marker"))
        })?;
        let signature_b64 = std::str::from_utf8(&rest[..end])
            .map_err(|_| {
                SigningError::EnvelopeMalformed("signature block is not UTF-8 text".to_string())
            })?
            .trim()
            .to_string();

        log::debug!(
            "Extracted text envelope: content={} bytes, signature={} chars",
            content.len(),
            signature_b64.len()
        );
        Ok(ExtractedSignature::new(
            content.to_vec(),
            signature_b64,
            EnvelopeFormat::Text,
        ))
    }
}
