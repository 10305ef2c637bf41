//! Collaborator contracts for persisted records.
//!
//! Implementations assign ids on `create` and report missing rows on
//! `update`/`delete` with the matching not-found error. Lookups return
//! `Ok(None)` or an empty list instead of failing.

use crate::domain::records::{Document, SignatureRecord, User};
use crate::domain::types::{DocumentId, SignatureId, UserId};
use crate::infra::error::SigningResult;

pub trait DocumentStore: Send + Sync {
    /// Persist a new document; the `id` field is replaced.
    fn create(&self, document: Document) -> SigningResult<Document>;

    fn find_by_id(&self, id: DocumentId) -> SigningResult<Option<Document>>;

    /// Oldest document owned by `owner` whose original content has `digest`.
    fn find_by_digest(&self, digest: &str, owner: &UserId) -> SigningResult<Option<Document>>;

    /// All documents owned by `owner`, oldest first.
    fn find_by_owner(&self, owner: &UserId) -> SigningResult<Vec<Document>>;

    fn update(&self, document: &Document) -> SigningResult<()>;

    fn delete(&self, id: DocumentId) -> SigningResult<()>;
}

pub trait SignatureStore: Send + Sync {
    /// Persist a new signature record; the `id` field is replaced.
    fn create(&self, record: SignatureRecord) -> SigningResult<SignatureRecord>;

    fn find_by_id(&self, id: SignatureId) -> SigningResult<Option<SignatureRecord>>;

    /// Records over `document` in creation order.
    fn find_by_document_id(&self, document: DocumentId) -> SigningResult<Vec<SignatureRecord>>;

    fn update(&self, record: &SignatureRecord) -> SigningResult<()>;

    fn delete(&self, id: SignatureId) -> SigningResult<()>;
}

pub trait UserStore: Send + Sync {
    fn get_by_id(&self, id: &UserId) -> SigningResult<Option<User>>;

    fn update(&self, user: &User) -> SigningResult<()>;
}

/// Opaque byte storage keyed by relative path.
pub trait BlobStore: Send + Sync {
    fn read(&self, key: &str) -> SigningResult<Vec<u8>>;

    /// Create or replace the blob at `key`.
    fn write(&self, key: &str, bytes: &[u8]) -> SigningResult<()>;

    /// Removing a missing blob is not an error.
    fn delete(&self, key: &str) -> SigningResult<()>;

    fn exists(&self, key: &str) -> SigningResult<bool>;
}
