//! `DocumentWorkflow`: upload and manage documents.
//!
//! The digest is computed exactly once, from the uploaded bytes, and is
//! never recomputed from a signed copy.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::adapters::store::{BlobStore, DocumentStore, SignatureStore};
use crate::domain::constants::UPLOAD_PREFIX;
use crate::domain::records::{Document, DocumentStatus, SignatureRecord};
use crate::domain::types::{DocumentId, UserId};
use crate::infra::error::{SigningError, SigningResult};
use crate::services::digest::DigestService;

pub struct DocumentWorkflow {
    documents: Arc<dyn DocumentStore>,
    signatures: Arc<dyn SignatureStore>,
    blobs: Arc<dyn BlobStore>,
    digest: DigestService,
}

impl DocumentWorkflow {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        signatures: Arc<dyn SignatureStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            documents,
            signatures,
            blobs,
            digest: DigestService::new(),
        }
    }

    /// Store `content` as a new blob and register it as a document of `owner`.
    pub fn upload(&self, owner: &UserId, file_name: &str, content: &[u8]) -> SigningResult<Document> {
        let file_name = sanitize_file_name(file_name)?;
        let now = Utc::now();
        let key = format!(
            "{UPLOAD_PREFIX}/{owner}/{}-{file_name}",
            now.timestamp_nanos_opt().unwrap_or_default()
        );
        self.blobs.write(&key, content)?;
        self.register(owner, &file_name, key, content, now.timestamp())
    }

    /// Register a blob that is already in the store.
    pub fn register_existing(
        &self,
        owner: &UserId,
        file_name: &str,
        blob_key: &str,
    ) -> SigningResult<Document> {
        let file_name = sanitize_file_name(file_name)?;
        let content = self.blobs.read(blob_key).map_err(|e| {
            SigningError::DigestInputUnreadable(format!("{blob_key}: {e}"))
        })?;
        self.register(
            owner,
            &file_name,
            blob_key.to_string(),
            &content,
            Utc::now().timestamp(),
        )
    }

    fn register(
        &self,
        owner: &UserId,
        file_name: &str,
        file_path: String,
        content: &[u8],
        created_at: i64,
    ) -> SigningResult<Document> {
        let digest = self.digest.compute_digest(content);
        let document = self.documents.create(Document {
            id: DocumentId::new(0),
            owner: owner.clone(),
            file_name: file_name.to_string(),
            file_path,
            digest,
            status: DocumentStatus::Uploaded,
            created_at,
        })?;
        log::info!(
            "Registered document {} for {owner} ({} bytes, digest {})",
            document.id,
            content.len(),
            document.digest
        );
        Ok(document)
    }

    pub fn get(&self, id: DocumentId) -> SigningResult<Document> {
        self.documents
            .find_by_id(id)?
            .ok_or_else(|| SigningError::DocumentNotFound(id.to_string()))
    }

    pub fn list_for_owner(&self, owner: &UserId) -> SigningResult<Vec<Document>> {
        self.documents.find_by_owner(owner)
    }

    /// Replace a stored document. Only `status` may differ from the stored row.
    pub fn update(&self, document: &Document) -> SigningResult<Document> {
        let existing = self.get(document.id)?;
        let changed = [
            ("owner", existing.owner != document.owner),
            ("file_name", existing.file_name != document.file_name),
            ("file_path", existing.file_path != document.file_path),
            ("digest", existing.digest != document.digest),
            ("created_at", existing.created_at != document.created_at),
        ]
        .into_iter()
        .filter_map(|(field, differs)| differs.then_some(field))
        .collect::<Vec<_>>();
        if !changed.is_empty() {
            return Err(SigningError::ValidationError(format!(
                "document fields are immutable: {}",
                changed.join(", ")
            )));
        }
        self.documents.update(document)?;
        Ok(document.clone())
    }

    pub fn update_status(&self, id: DocumentId, status: DocumentStatus) -> SigningResult<Document> {
        let mut document = self.get(id)?;
        document.status = status;
        self.documents.update(&document)?;
        Ok(document)
    }

    /// Delete the document row. Signature records are kept unless
    /// `cascade` is set. Blobs are left in place.
    pub fn delete(&self, id: DocumentId, cascade: bool) -> SigningResult<()> {
        let document = self.get(id)?;
        if cascade {
            for record in self.signatures.find_by_document_id(document.id)? {
                self.signatures.delete(record.id)?;
            }
        }
        self.documents.delete(id)?;
        log::info!("Deleted document {id}{}", if cascade { " and its signatures" } else { "" });
        Ok(())
    }

    pub fn signatures_for(&self, id: DocumentId) -> SigningResult<Vec<SignatureRecord>> {
        let document = self.get(id)?;
        self.signatures.find_by_document_id(document.id)
    }

    /// Original bytes of a document.
    pub fn content(&self, id: DocumentId) -> SigningResult<Vec<u8>> {
        let document = self.get(id)?;
        self.blobs.read(&document.file_path)
    }
}

/// Keep only the final path component of an uploaded name.
fn sanitize_file_name(file_name: &str) -> SigningResult<String> {
    Path::new(file_name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| SigningError::ValidationError(format!("invalid file name '{file_name}'")))
}
