//! RSA key lifecycle: generation, encoding and the signer/verifier split.
//!
//! A `KeyPair` is split into a `SigningKey`, which should only live for the
//! duration of a signing call, and a `VerifyingKey`, which is what gets
//! persisted. `KeyMaterial` resolves the verifying key from whatever a stored
//! signature record carries, including records that only kept the private key.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Rsa;

use crate::domain::constants::RSA_KEY_BITS;
use crate::domain::records::SignatureRecord;
use crate::infra::error::{SigningError, SigningResult};

/// Private half of a key pair. Not `Clone`; hand it to the signing service
/// and drop it.
pub struct SigningKey {
    pkey: PKey<Private>,
}

/// Public half of a key pair.
#[derive(Clone)]
pub struct VerifyingKey {
    pkey: PKey<Public>,
}

/// Freshly generated RSA-2048 key pair.
pub struct KeyPair {
    signing: SigningKey,
    verifying: VerifyingKey,
}

impl SigningKey {
    pub(crate) fn from_pkey(pkey: PKey<Private>) -> Self {
        Self { pkey }
    }

    /// Decode a base64 PKCS#1 DER private key.
    pub fn from_private_key_b64(encoded: &str) -> SigningResult<Self> {
        let der = STANDARD.decode(encoded.trim()).map_err(|e| {
            SigningError::KeyDecodeFailed(format!("invalid private key encoding: {e}"))
        })?;
        let rsa = Rsa::private_key_from_der(&der)
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid private key: {e}")))?;
        let pkey = PKey::from_rsa(rsa)
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid private key: {e}")))?;
        Ok(Self { pkey })
    }

    pub fn from_pem(pem: &str) -> SigningResult<Self> {
        let rsa = Rsa::private_key_from_pem(pem.as_bytes())
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid private key PEM: {e}")))?;
        let pkey = PKey::from_rsa(rsa)
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid private key: {e}")))?;
        Ok(Self { pkey })
    }

    /// Base64 of the PKCS#1 DER encoding.
    pub fn to_private_key_b64(&self) -> SigningResult<String> {
        let der = self
            .pkey
            .rsa()
            .and_then(|rsa| rsa.private_key_to_der())
            .map_err(|e| SigningError::KeyDecodeFailed(format!("private key export: {e}")))?;
        Ok(STANDARD.encode(der))
    }

    /// PEM with the `RSA PRIVATE KEY` label.
    pub fn to_pem(&self) -> SigningResult<String> {
        let pem = self
            .pkey
            .rsa()
            .and_then(|rsa| rsa.private_key_to_pem())
            .map_err(|e| SigningError::KeyDecodeFailed(format!("private key export: {e}")))?;
        String::from_utf8(pem).map_err(|e| SigningError::KeyDecodeFailed(e.to_string()))
    }

    pub fn verifying_key(&self) -> SigningResult<VerifyingKey> {
        let spki = self
            .pkey
            .public_key_to_der()
            .map_err(|e| SigningError::KeyDecodeFailed(format!("public key export: {e}")))?;
        VerifyingKey::from_spki_der(&spki)
    }

    #[must_use]
    pub fn bits(&self) -> u32 {
        self.pkey.bits()
    }

    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.pkey
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(rsa-{})", self.pkey.bits())
    }
}

impl VerifyingKey {
    fn from_spki_der(der: &[u8]) -> SigningResult<Self> {
        let pkey = PKey::public_key_from_der(der)
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid public key: {e}")))?;
        if pkey.rsa().is_err() {
            return Err(SigningError::KeyDecodeFailed(
                "public key is not an RSA key".to_string(),
            ));
        }
        Ok(Self { pkey })
    }

    /// Decode a base64 SubjectPublicKeyInfo DER public key.
    pub fn from_public_key_b64(encoded: &str) -> SigningResult<Self> {
        let der = STANDARD.decode(encoded.trim()).map_err(|e| {
            SigningError::KeyDecodeFailed(format!("invalid public key encoding: {e}"))
        })?;
        Self::from_spki_der(&der)
    }

    pub fn from_pem(pem: &str) -> SigningResult<Self> {
        let pkey = PKey::public_key_from_pem(pem.as_bytes())
            .map_err(|e| SigningError::KeyDecodeFailed(format!("invalid public key PEM: {e}")))?;
        let der = pkey
            .public_key_to_der()
            .map_err(|e| SigningError::KeyDecodeFailed(e.to_string()))?;
        Self::from_spki_der(&der)
    }

    /// Derive the public component from a stored base64 PKCS#1 private key.
    pub fn from_private_key_b64(encoded: &str) -> SigningResult<Self> {
        SigningKey::from_private_key_b64(encoded)?.verifying_key()
    }

    pub fn to_public_key_b64(&self) -> SigningResult<String> {
        let der = self
            .pkey
            .public_key_to_der()
            .map_err(|e| SigningError::KeyDecodeFailed(format!("public key export: {e}")))?;
        Ok(STANDARD.encode(der))
    }

    /// PEM with the `PUBLIC KEY` label.
    pub fn to_pem(&self) -> SigningResult<String> {
        let pem = self
            .pkey
            .public_key_to_pem()
            .map_err(|e| SigningError::KeyDecodeFailed(format!("public key export: {e}")))?;
        String::from_utf8(pem).map_err(|e| SigningError::KeyDecodeFailed(e.to_string()))
    }

    pub(crate) fn pkey(&self) -> &PKey<Public> {
        &self.pkey
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey(rsa-{})", self.pkey.bits())
    }
}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.pkey.public_eq(&other.pkey)
    }
}

impl KeyPair {
    #[must_use]
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    #[must_use]
    pub fn into_parts(self) -> (SigningKey, VerifyingKey) {
        (self.signing, self.verifying)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(rsa-{})", self.signing.bits())
    }
}

/// Verification credential as found on a signature record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Base64 SubjectPublicKeyInfo DER
    PublicKey(String),
    /// Base64 PKCS#1 DER private key; the public half is derived from it
    PrivateKey(String),
}

impl KeyMaterial {
    /// Prefer the public key; fall back to a retained private key.
    pub fn from_record(record: &SignatureRecord) -> SigningResult<Self> {
        match (&record.public_key, &record.private_key) {
            (Some(public), _) if !public.trim().is_empty() => {
                Ok(KeyMaterial::PublicKey(public.clone()))
            }
            (_, Some(private)) if !private.trim().is_empty() => {
                Ok(KeyMaterial::PrivateKey(private.clone()))
            }
            _ => {
                log::warn!("Signature {} carries no key material", record.id);
                Err(SigningError::NoSignatureOnRecord(record.document))
            }
        }
    }

    pub fn resolve(&self) -> SigningResult<VerifyingKey> {
        match self {
            KeyMaterial::PublicKey(encoded) => VerifyingKey::from_public_key_b64(encoded),
            KeyMaterial::PrivateKey(encoded) => VerifyingKey::from_private_key_b64(encoded),
        }
    }
}

/// Stateless RSA key generation.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyService;

impl KeyService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generate an RSA-2048 key pair. Failure aborts the calling operation.
    pub fn generate_key_pair(&self) -> SigningResult<KeyPair> {
        log::debug!("Generating RSA-{RSA_KEY_BITS} key pair");
        let rsa = Rsa::generate(RSA_KEY_BITS)
            .map_err(|e| SigningError::KeyGenFailed(format!("RSA generation failed: {e}")))?;
        let pkey = PKey::from_rsa(rsa)
            .map_err(|e| SigningError::KeyGenFailed(format!("PKey wrap failed: {e}")))?;
        let signing = SigningKey::from_pkey(pkey);
        let verifying = signing
            .verifying_key()
            .map_err(|e| SigningError::KeyGenFailed(e.to_string()))?;
        Ok(KeyPair { signing, verifying })
    }
}
