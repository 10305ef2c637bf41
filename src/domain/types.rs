//! Type-safe identifiers using the new-type pattern
//!
//! Documents and signatures are keyed by store-assigned integers; users are
//! keyed by opaque string identifiers handed out by the user directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::infra::error::{SigningError, SigningResult};

/// Store-assigned document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        DocumentId(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(DocumentId)
            .map_err(|_| SigningError::ValidationError(format!("Invalid document id '{s}'")))
    }
}

/// Store-assigned signature identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(u64);

impl SignatureId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        SignatureId(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque user identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId after validation
    pub fn new(id: impl AsRef<str>) -> SigningResult<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(SigningError::ValidationError(
                "User id must not be empty".to_string(),
            ));
        }
        if id.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
            return Err(SigningError::ValidationError(format!(
                "User id contains forbidden characters: {id:?}"
            )));
        }
        Ok(UserId(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
