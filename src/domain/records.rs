//! Persistent entities exchanged with the document, signature and user stores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::constants::SIGNATURE_ALGORITHM;
use crate::domain::types::{DocumentId, SignatureId, UserId};
use crate::infra::error::SigningError;

/// Lifecycle state of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Signed,
}

impl DocumentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Signed => "signed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(DocumentStatus::Uploaded),
            "signed" => Ok(DocumentStatus::Signed),
            other => Err(SigningError::ValidationError(format!(
                "Unknown document status '{other}'"
            ))),
        }
    }
}

/// An uploaded document.
///
/// `digest` is the lowercase hex SHA-256 of the original content. It is set
/// once when the document is created and is the anchor every signature over
/// this document is verified against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub file_name: String,
    /// Blob key of the original content
    pub file_path: String,
    pub digest: String,
    pub status: DocumentStatus,
    pub created_at: i64,
}

/// One signing event over a document.
///
/// A document may carry any number of these; each signing generates its own
/// key pair. `public_key` is the durable verification credential.
/// `private_key` is only populated when the deployment retains signing keys,
/// and older records may carry nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub id: SignatureId,
    pub document: DocumentId,
    pub signer: UserId,
    /// Base64 of the raw PKCS#1 v1.5 signature
    pub signature_raw: String,
    pub algorithm: String,
    pub signed_at: i64,
    /// Base64 SubjectPublicKeyInfo DER
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Base64 PKCS#1 DER private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl SignatureRecord {
    #[must_use]
    pub fn new(document: DocumentId, signer: UserId, signature_raw: String, signed_at: i64) -> Self {
        Self {
            id: SignatureId::new(0),
            document,
            signer,
            signature_raw,
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            signed_at,
            public_key: None,
            private_key: None,
        }
    }
}

/// A user as far as signing and certificate issuance are concerned.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub cert_pem: Option<String>,
    #[serde(default)]
    pub private_key_pem: Option<String>,
    #[serde(default)]
    pub public_key_pem: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            cert_pem: None,
            private_key_pem: None,
            public_key_pem: None,
        }
    }

    #[must_use]
    pub fn has_certificate(&self) -> bool {
        self.cert_pem.is_some()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("has_certificate", &self.has_certificate())
            .finish()
    }
}
