//! Centralized constants for envelope markers, key sizes and certificate profiles.
//! Keep this intentionally small; only broadly reused literals should live here.

// === Signature envelope ===

/// Line that opens the textual signature block
pub const BEGIN_SIGNATURE_MARKER: &str = "---BEGIN SIGNATURE---";

/// Line that closes the textual signature block
pub const END_SIGNATURE_MARKER: &str = "---END SIGNATURE---";

/// Magic suffix of the binary trailer container
pub const TRAILER_MAGIC: &[u8; 8] = b"DSIGTRL1";

/// Width of the big-endian signature length field in the trailer
pub const TRAILER_LENGTH_FIELD: usize = 4;

/// Upper bound on an embedded signature; RSA-2048 produces 256 bytes
pub const MAX_TRAILER_SIGNATURE_LEN: usize = 8192;

/// Suffix appended to a document's blob key for its signed copy
pub const DEFAULT_SIGNED_SUFFIX: &str = ".signed";

/// Blob key prefix for uploaded originals
pub const UPLOAD_PREFIX: &str = "uploads";

// === Keys & signatures ===

/// RSA modulus size for every generated key
pub const RSA_KEY_BITS: u32 = 2048;

/// Algorithm label recorded on signature records
pub const SIGNATURE_ALGORITHM: &str = "RSA";

/// Length of a lowercase hex SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

// === PEM labels ===

pub const PEM_CERTIFICATE: &str = "CERTIFICATE";
pub const PEM_CERTIFICATE_REQUEST: &str = "CERTIFICATE REQUEST";

// === Certificate profiles ===

/// Organization placed on user certificate subjects
pub const DEFAULT_ORGANIZATION: &str = "Document Signing Users";

/// Common name of generated certificate authorities
pub const DEFAULT_CA_COMMON_NAME: &str = "Document Signing CA";

/// User certificate lifetime in calendar months
pub const USER_CERT_VALIDITY_MONTHS: u32 = 12;

/// CA certificate lifetime in calendar months
pub const CA_CERT_VALIDITY_MONTHS: u32 = 120;

/// Size of random certificate serial numbers in bytes (128 bits)
pub const RANDOM_SERIAL_BYTES: usize = 16;
