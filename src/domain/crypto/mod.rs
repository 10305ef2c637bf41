//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for cryptographic artifacts including:
//! - SHA-256 digest values with size validation and hex conversion
//! - Raw PKCS#1 v1.5 signature values with base64 transport encoding
//! - PEM-encoded certificate bundles and parsed certificate summaries
//!
//! OpenSSL-backed operations live in the service layer; these types only carry
//! the artifacts between services, stores and envelopes.

mod cert;
mod digest_bytes;
mod signature;

pub use cert::{CertificateSummary, IssuedCertificate, SerialNumberPolicy};
pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use signature::SignatureValue;
