use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::domain::constants::SIGNATURE_ALGORITHM;
use crate::infra::error::{SigningError, SigningResult};

/// Wrapper over a raw RSA PKCS#1 v1.5 signature value.
/// Travels as standard (padded) base64 in envelopes and signature records.
#[derive(Clone, Eq, PartialEq)]
pub struct SignatureValue {
    bytes: Box<[u8]>,
}

impl SignatureValue {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Decode a base64 signature; surrounding whitespace is ignored.
    pub fn from_base64(encoded: &str) -> SigningResult<Self> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(SigningError::SignatureDecodeFailed(
                "signature is empty".to_string(),
            ));
        }
        STANDARD
            .decode(trimmed)
            .map(Self::new)
            .map_err(|e| SigningError::SignatureDecodeFailed(format!("invalid base64: {e}")))
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        SIGNATURE_ALGORITHM
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SignatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignatureValue(algo={}, len={})",
            SIGNATURE_ALGORITHM,
            self.bytes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_transport_encoding() {
        let sig = SignatureValue::new(vec![1, 2, 3, 4]);
        assert_eq!(sig.to_base64(), "AQIDBA==");
        let decoded = SignatureValue::from_base64("  AQIDBA==\n").unwrap();
        assert_eq!(decoded.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(decoded.algorithm(), "RSA");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            SignatureValue::from_base64("not base64!!"),
            Err(SigningError::SignatureDecodeFailed(_))
        ));
        assert!(matches!(
            SignatureValue::from_base64("   "),
            Err(SigningError::SignatureDecodeFailed(_))
        ));
    }
}
