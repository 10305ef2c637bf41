//! Signature envelopes: how a base64 signature travels inside a signed file.
//!
//! Two containers are supported:
//! - `Text`: the marker-delimited block appended to the document
//! - `Trailer`: a binary-safe, length-prefixed trailer
//!
//! `EnvelopeFormat::detect` picks the container of an incoming file so
//! verification accepts either.

mod text;
mod trailer;

use std::fmt;
use std::str::FromStr;

pub use text::TextEnvelope;
pub use trailer::TrailerEnvelope;

use serde::{Deserialize, Serialize};

use crate::domain::crypto::SignatureValue;
use crate::infra::error::{SigningError, SigningResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    #[default]
    Text,
    Trailer,
}

impl EnvelopeFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeFormat::Text => "text",
            EnvelopeFormat::Trailer => "trailer",
        }
    }

    /// Trailer if the binary magic suffix is present, text otherwise.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if TrailerEnvelope::is_sealed(bytes) {
            EnvelopeFormat::Trailer
        } else {
            EnvelopeFormat::Text
        }
    }

    #[must_use]
    pub fn embed(&self, original: &[u8], signature: &SignatureValue) -> Vec<u8> {
        match self {
            EnvelopeFormat::Text => TextEnvelope::embed(original, &signature.to_base64()),
            EnvelopeFormat::Trailer => TrailerEnvelope::seal(original, signature),
        }
    }

    pub fn extract(&self, signed: &[u8]) -> SigningResult<ExtractedSignature> {
        match self {
            EnvelopeFormat::Text => TextEnvelope::extract(signed),
            EnvelopeFormat::Trailer => TrailerEnvelope::extract(signed),
        }
    }
}

impl FromStr for EnvelopeFormat {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(EnvelopeFormat::Text),
            "trailer" | "binary" => Ok(EnvelopeFormat::Trailer),
            other => Err(SigningError::ValidationError(format!(
                "Unknown envelope format '{other}'. Expected 'text' or 'trailer'"
            ))),
        }
    }
}

impl fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content and signature recovered from a signed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSignature {
    content: Vec<u8>,
    signature_b64: String,
    format: EnvelopeFormat,
}

impl ExtractedSignature {
    #[must_use]
    pub fn new(content: Vec<u8>, signature_b64: String, format: EnvelopeFormat) -> Self {
        Self {
            content,
            signature_b64,
            format,
        }
    }

    /// Bytes preceding the envelope, verbatim.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn signature_b64(&self) -> &str {
        &self.signature_b64
    }

    #[must_use]
    pub fn format(&self) -> EnvelopeFormat {
        self.format
    }

    /// Byte sequences that may be the original document, most likely first.
    ///
    /// For text envelopes the verbatim content ends with the separator newline
    /// whenever the original did not; the second candidate drops exactly that
    /// one byte. Trailer envelopes are exact and yield a single candidate.
    #[must_use]
    pub fn content_candidates(&self) -> Vec<&[u8]> {
        let mut candidates = vec![self.content.as_slice()];
        if self.format == EnvelopeFormat::Text {
            if let Some(stripped) = self.content.strip_suffix(b"\n") {
                candidates.push(stripped);
            }
        }
        candidates
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.content, self.signature_b64)
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_and_dispatch() {
        let sig = SignatureValue::new(vec![9; 8]);
        let text = EnvelopeFormat::Text.embed(b"doc", &sig);
        let trailer = EnvelopeFormat::Trailer.embed(b"doc", &sig);
        assert_eq!(EnvelopeFormat::detect(&text), EnvelopeFormat::Text);
        assert_eq!(EnvelopeFormat::detect(&trailer), EnvelopeFormat::Trailer);

        let from_trailer = EnvelopeFormat::Trailer.extract(&trailer).unwrap();
        assert_eq!(from_trailer.content(), b"doc");
        assert_eq!(from_trailer.signature_b64(), sig.to_base64());
    }

    #[test]
    fn candidates_cover_inserted_separator() {
        let sig = SignatureValue::new(vec![7; 4]);
        let signed = EnvelopeFormat::Text.embed(b"no newline", &sig);
        let extracted = EnvelopeFormat::Text.extract(&signed).unwrap();
        let candidates = extracted.content_candidates();
        assert_eq!(candidates, vec![&b"no newline\n"[..], &b"no newline"[..]]);
    }

    #[test]
    fn trailer_yields_single_candidate() {
        let sig = SignatureValue::new(vec![7; 4]);
        let sealed = EnvelopeFormat::Trailer.embed(b"line\n", &sig);
        let extracted = EnvelopeFormat::Trailer.extract(&sealed).unwrap();
        assert_eq!(extracted.content_candidates(), vec![&b"line\n"[..]]);
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("TEXT".parse::<EnvelopeFormat>().unwrap(), EnvelopeFormat::Text);
        assert_eq!(
            "trailer".parse::<EnvelopeFormat>().unwrap(),
            EnvelopeFormat::Trailer
        );
        assert!("zip".parse::<EnvelopeFormat>().is_err());
    }

    #[test]
    fn find_subslice_edges() {
        assert_eq!(find_subslice(b"abcabc", b"ca"), Some(2));
        assert_eq!(find_subslice(b"ab", b"abc"), None);
        assert_eq!(find_subslice(b"ab", b""), None);
    }
}
