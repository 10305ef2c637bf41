use std::fmt;

use sha2::{Digest, Sha256};

const SHA256_LEN: usize = 32;

/// Strongly typed SHA-256 digest bytes.
///
/// Invariant: `bytes.len() == 32`. The canonical textual form is 64 lowercase
/// hex characters, which is what documents store and what gets signed.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct DigestBytes {
    bytes: [u8; SHA256_LEN],
}

impl DigestBytes {
    /// SHA-256 over the exact byte sequence.
    #[must_use]
    pub fn compute(content: &[u8]) -> Self {
        Self {
            bytes: Sha256::digest(content).into(),
        }
    }

    pub fn new(bytes: Vec<u8>) -> Result<Self, DigestBytesError> {
        let bytes: [u8; SHA256_LEN] =
            bytes
                .try_into()
                .map_err(|b: Vec<u8>| DigestBytesError::LengthMismatch {
                    expected: SHA256_LEN,
                    actual: b.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Parse a hex digest. Uppercase input is accepted; output is always lowercase.
    pub fn from_hex(hex_digest: &str) -> Result<Self, DigestBytesError> {
        let raw = hex::decode(hex_digest.trim()).map_err(|_| DigestBytesError::InvalidHex)?;
        Self::new(raw)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Hash of this digest's hex text. This is the message the signing
    /// protocol actually signs: `SHA256(hex(SHA256(content)))`.
    #[must_use]
    pub fn signed_message(&self) -> DigestBytes {
        DigestBytes::compute(self.to_hex().as_bytes())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestBytes(sha256={})", self.to_hex())
    }
}

impl fmt::Display for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestBytesError {
    #[error("digest length mismatch (expected {expected}, actual {actual})")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("digest is not valid hex")]
    InvalidHex,
}
