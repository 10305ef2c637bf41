//! Content fingerprinting.

use std::fs;
use std::path::Path;

use crate::domain::crypto::DigestBytes;
use crate::infra::error::{SigningError, SigningResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct DigestService;

impl DigestService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Lowercase hex SHA-256 of the exact bytes given.
    #[must_use]
    pub fn compute_digest(&self, content: &[u8]) -> String {
        DigestBytes::compute(content).to_hex()
    }

    /// Digest of a file on disk. The whole file is read into memory.
    pub fn compute_file_digest<P: AsRef<Path>>(&self, path: P) -> SigningResult<String> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|e| {
            SigningError::DigestInputUnreadable(format!("{}: {e}", path.display()))
        })?;
        log::debug!("Hashing {} ({} bytes)", path.display(), content.len());
        Ok(self.compute_digest(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn digest_is_stable_lowercase_hex() {
        let svc = DigestService::new();
        let a = svc.compute_digest(b"some document");
        let b = svc.compute_digest(b"some document");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn file_digest_matches_content_digest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let svc = DigestService::new();
        assert_eq!(
            svc.compute_file_digest(file.path()).unwrap(),
            svc.compute_digest(b"hello world")
        );
    }

    #[test]
    fn missing_file_is_unreadable_input() {
        let err = DigestService::new()
            .compute_file_digest("/nonexistent/definitely/missing.txt")
            .unwrap_err();
        assert!(matches!(err, SigningError::DigestInputUnreadable(_)));
    }
}
