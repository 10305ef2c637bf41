//! In-memory store implementations.
//!
//! Each store keeps its rows in a `BTreeMap` behind an `RwLock`, so ids
//! iterate in creation order and the stores can be shared across threads.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::adapters::store::{DocumentStore, SignatureStore, UserStore};
use crate::domain::records::{Document, SignatureRecord, User};
use crate::domain::types::{DocumentId, SignatureId, UserId};
use crate::infra::error::{SigningError, SigningResult};

fn poisoned<T>(_: PoisonError<T>) -> SigningError {
    SigningError::StorageError("store lock poisoned".to_string())
}

#[derive(Debug)]
struct Table<V> {
    next_id: u64,
    rows: BTreeMap<u64, V>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<V> Table<V> {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    table: RwLock<Table<Document>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create(&self, mut document: Document) -> SigningResult<Document> {
        let mut table = self.table.write().map_err(poisoned)?;
        let id = table.allocate();
        document.id = DocumentId::new(id);
        table.rows.insert(id, document.clone());
        Ok(document)
    }

    fn find_by_id(&self, id: DocumentId) -> SigningResult<Option<Document>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id.as_u64()).cloned())
    }

    fn find_by_digest(&self, digest: &str, owner: &UserId) -> SigningResult<Option<Document>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table
            .rows
            .values()
            .find(|doc| doc.digest == digest && &doc.owner == owner)
            .cloned())
    }

    fn find_by_owner(&self, owner: &UserId) -> SigningResult<Vec<Document>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table
            .rows
            .values()
            .filter(|doc| &doc.owner == owner)
            .cloned()
            .collect())
    }

    fn update(&self, document: &Document) -> SigningResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        match table.rows.get_mut(&document.id.as_u64()) {
            Some(row) => {
                *row = document.clone();
                Ok(())
            }
            None => Err(SigningError::DocumentNotFound(document.id.to_string())),
        }
    }

    fn delete(&self, id: DocumentId) -> SigningResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        table
            .rows
            .remove(&id.as_u64())
            .map(|_| ())
            .ok_or_else(|| SigningError::DocumentNotFound(id.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MemorySignatureStore {
    table: RwLock<Table<SignatureRecord>>,
}

impl MemorySignatureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignatureStore for MemorySignatureStore {
    fn create(&self, mut record: SignatureRecord) -> SigningResult<SignatureRecord> {
        let mut table = self.table.write().map_err(poisoned)?;
        let id = table.allocate();
        record.id = SignatureId::new(id);
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    fn find_by_id(&self, id: SignatureId) -> SigningResult<Option<SignatureRecord>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id.as_u64()).cloned())
    }

    fn find_by_document_id(&self, document: DocumentId) -> SigningResult<Vec<SignatureRecord>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table
            .rows
            .values()
            .filter(|rec| rec.document == document)
            .cloned()
            .collect())
    }

    fn update(&self, record: &SignatureRecord) -> SigningResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        match table.rows.get_mut(&record.id.as_u64()) {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(SigningError::SignatureNotFound(record.id)),
        }
    }

    fn delete(&self, id: SignatureId) -> SigningResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        table
            .rows
            .remove(&id.as_u64())
            .map(|_| ())
            .ok_or(SigningError::SignatureNotFound(id))
    }
}

/// Users are keyed by their external id; there is no `create` in the
/// contract, so callers seed them with `insert`.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) -> SigningResult<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        users.insert(user.id.clone(), user);
        Ok(())
    }
}

impl UserStore for MemoryUserStore {
    fn get_by_id(&self, id: &UserId) -> SigningResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(id).cloned())
    }

    fn update(&self, user: &User) -> SigningResult<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.get_mut(&user.id) {
            Some(row) => {
                *row = user.clone();
                Ok(())
            }
            None => Err(SigningError::UserNotFound(user.id.clone())),
        }
    }
}
