//! Adapter layer: persistence contracts and their implementations.
//!
//! Provides:
//! - Store traits for documents, signature records, users and blobs
//! - Thread-safe in-memory stores
//! - A file-system blob store rooted at a configured directory

pub mod blob;
pub mod memory;
pub mod store;

pub use blob::{FsBlobStore, MemoryBlobStore};
pub use memory::{MemoryDocumentStore, MemorySignatureStore, MemoryUserStore};
pub use store::{BlobStore, DocumentStore, SignatureStore, UserStore};
