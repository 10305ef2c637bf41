//! Error types for document signing operations.
//! Every failure of the signing engine surfaces as a typed `SigningError`.

use thiserror::Error;

use crate::domain::types::{DocumentId, SignatureId, UserId};

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Comprehensive error types for signing operations
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum SigningError {
    #[error("Digest input unreadable: {0}")]
    DigestInputUnreadable(String),

    #[error("Signature envelope malformed: {0}")]
    EnvelopeMalformed(String),

    #[error("Key generation failed: {0}")]
    KeyGenFailed(String),

    #[error("Key decoding failed: {0}")]
    KeyDecodeFailed(String),

    #[error("Signature decoding failed: {0}")]
    SignatureDecodeFailed(String),

    #[error("Signature verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid CSR: {0}")]
    #[diagnostic(help("expected a PEM block labelled CERTIFICATE REQUEST"))]
    InvalidCsr(String),

    #[error("CSR signature invalid")]
    CsrSignatureInvalid,

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Signer not found: {0}")]
    SignerNotFound(UserId),

    #[error("No signature on record for document {0}")]
    NoSignatureOnRecord(DocumentId),

    #[error("Signature not found: {0}")]
    SignatureNotFound(SignatureId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Signature creation error: {0}")]
    SignatureError(String),

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Fieldless classification of a `SigningError`, for callers that branch on
/// the kind of failure or report it as a stable string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DigestInputUnreadable,
    EnvelopeMalformed,
    KeyGenFailed,
    KeyDecodeFailed,
    SignatureDecodeFailed,
    VerificationFailed,
    InvalidCsr,
    CsrSignatureInvalid,
    DocumentNotFound,
    SignerNotFound,
    NoSignatureOnRecord,
    SignatureNotFound,
    UserNotFound,
    Signature,
    Certificate,
    Storage,
    Io,
    Configuration,
    Validation,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DigestInputUnreadable => "digest_input_unreadable",
            ErrorKind::EnvelopeMalformed => "envelope_malformed",
            ErrorKind::KeyGenFailed => "key_gen_failed",
            ErrorKind::KeyDecodeFailed => "key_decode_failed",
            ErrorKind::SignatureDecodeFailed => "signature_decode_failed",
            ErrorKind::VerificationFailed => "verification_failed",
            ErrorKind::InvalidCsr => "invalid_csr",
            ErrorKind::CsrSignatureInvalid => "csr_signature_invalid",
            ErrorKind::DocumentNotFound => "document_not_found",
            ErrorKind::SignerNotFound => "signer_not_found",
            ErrorKind::NoSignatureOnRecord => "no_signature_on_record",
            ErrorKind::SignatureNotFound => "signature_not_found",
            ErrorKind::UserNotFound => "user_not_found",
            ErrorKind::Signature => "signature_error",
            ErrorKind::Certificate => "certificate_error",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Io => "io_error",
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Validation => "validation_error",
        }
    }
}

impl SigningError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SigningError::DigestInputUnreadable(_) => ErrorKind::DigestInputUnreadable,
            SigningError::EnvelopeMalformed(_) => ErrorKind::EnvelopeMalformed,
            SigningError::KeyGenFailed(_) => ErrorKind::KeyGenFailed,
            SigningError::KeyDecodeFailed(_) => ErrorKind::KeyDecodeFailed,
            SigningError::SignatureDecodeFailed(_) => ErrorKind::SignatureDecodeFailed,
            SigningError::VerificationFailed(_) => ErrorKind::VerificationFailed,
            SigningError::InvalidCsr(_) => ErrorKind::InvalidCsr,
            SigningError::CsrSignatureInvalid => ErrorKind::CsrSignatureInvalid,
            SigningError::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            SigningError::SignerNotFound(_) => ErrorKind::SignerNotFound,
            SigningError::NoSignatureOnRecord(_) => ErrorKind::NoSignatureOnRecord,
            SigningError::SignatureNotFound(_) => ErrorKind::SignatureNotFound,
            SigningError::UserNotFound(_) => ErrorKind::UserNotFound,
            SigningError::SignatureError(_) => ErrorKind::Signature,
            SigningError::CertificateError(_) => ErrorKind::Certificate,
            SigningError::StorageError(_) => ErrorKind::Storage,
            SigningError::IoError(_) => ErrorKind::Io,
            SigningError::ConfigurationError(_) => ErrorKind::Configuration,
            SigningError::ValidationError(_) => ErrorKind::Validation,
        }
    }

    /// True for outcomes that describe the submitted material rather than a
    /// broken environment. Verification workflows report these instead of
    /// propagating them.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EnvelopeMalformed
                | ErrorKind::KeyDecodeFailed
                | ErrorKind::SignatureDecodeFailed
                | ErrorKind::VerificationFailed
                | ErrorKind::DocumentNotFound
                | ErrorKind::NoSignatureOnRecord
        )
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::CertificateError(format!("ASN.1: {error}"))
    }
}

impl From<openssl::error::ErrorStack> for SigningError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        SigningError::CertificateError(error.to_string())
    }
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}
