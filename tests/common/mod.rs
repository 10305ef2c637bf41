//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use document_signer::adapters::{
    BlobStore, MemoryDocumentStore, MemorySignatureStore, MemoryUserStore,
};
use document_signer::pipelines::{DocumentWorkflow, SignOptions, SignWorkflow, VerifyWorkflow};
use document_signer::{User, UserId};

/// Workflows wired to in-memory record stores and the given blob store.
pub struct Harness {
    pub documents: DocumentWorkflow,
    pub sign: SignWorkflow,
    pub verify: VerifyWorkflow,
    pub blobs: Arc<dyn BlobStore>,
    pub users: Arc<MemoryUserStore>,
}

impl Harness {
    pub fn new(blobs: Arc<dyn BlobStore>, options: SignOptions) -> Self {
        let docs = Arc::new(MemoryDocumentStore::new());
        let sigs = Arc::new(MemorySignatureStore::new());
        let users = Arc::new(MemoryUserStore::new());
        Self {
            documents: DocumentWorkflow::new(docs.clone(), sigs.clone(), blobs.clone()),
            sign: SignWorkflow::new(docs.clone(), sigs.clone(), users.clone(), blobs.clone(), options),
            verify: VerifyWorkflow::new(docs, sigs),
            blobs,
            users,
        }
    }

    /// Register a user named after `id` and return its id.
    pub fn add_user(&self, id: &str) -> UserId {
        let user_id = UserId::new(id).expect("valid user id");
        self.users
            .insert(User::new(
                user_id.clone(),
                id.to_uppercase(),
                format!("{id}@example.com"),
            ))
            .expect("insert user");
        user_id
    }
}

/// SHA-256("hello world")
pub const HELLO_WORLD_DIGEST: &str =
    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

/// SHA-256 of the ASCII text of [`HELLO_WORLD_DIGEST`]
pub const HELLO_WORLD_SIGNED_MESSAGE: &str =
    "049da052634feb56ce6ec0bc648c672011edff1cb272b53113bbc90a8f00249c";
