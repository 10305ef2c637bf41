//! Service layer module root.
//! Stateless cryptographic operations used by the workflows.

pub mod authority;
pub(crate) mod cert_builder;
pub mod cert_inspector;
pub mod cert_issuer;
pub mod digest;
pub mod keys;
pub mod signing;
pub mod verification;

pub use authority::CertificateAuthority;
pub use cert_inspector::CertificateInspector;
pub use cert_issuer::{CertificateIssuer, IssuerProfile};
pub use digest::DigestService;
pub use keys::{KeyMaterial, KeyPair, KeyService, SigningKey, VerifyingKey};
pub use signing::SigningService;
pub use verification::VerificationService;
