//! `SignWorkflow` orchestrates signing of a stored document.
//!
//! Steps: resolve document and signer, generate a fresh key pair, sign the
//! stored digest, embed the signature into a copy of the original, write the
//! signed blob, then persist the signature record and mark the document
//! signed. Nothing is persisted until every cryptographic step succeeded.

use std::sync::Arc;

use chrono::Utc;

use crate::adapters::store::{BlobStore, DocumentStore, SignatureStore, UserStore};
use crate::domain::constants::DEFAULT_SIGNED_SUFFIX;
use crate::domain::envelope::EnvelopeFormat;
use crate::domain::records::{DocumentStatus, SignatureRecord};
use crate::domain::types::{DocumentId, SignatureId, UserId};
use crate::domain::verification::VerificationReport;
use crate::infra::config::SignerConfiguration;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::keys::{KeyMaterial, KeyService};
use crate::services::signing::SigningService;
use crate::services::verification::VerificationService;

/// Per-deployment signing behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    pub envelope_format: EnvelopeFormat,
    pub retain_private_key: bool,
    pub signed_suffix: String,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            envelope_format: EnvelopeFormat::Text,
            retain_private_key: true,
            signed_suffix: DEFAULT_SIGNED_SUFFIX.to_string(),
        }
    }
}

impl From<&SignerConfiguration> for SignOptions {
    fn from(config: &SignerConfiguration) -> Self {
        Self {
            envelope_format: config.envelope_format,
            retain_private_key: config.retain_private_key,
            signed_suffix: config.signed_suffix.clone(),
        }
    }
}

/// What a successful signing produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub record: SignatureRecord,
    /// Blob key of the signed copy
    pub signed_blob_key: String,
}

pub struct SignWorkflow {
    documents: Arc<dyn DocumentStore>,
    signatures: Arc<dyn SignatureStore>,
    users: Arc<dyn UserStore>,
    blobs: Arc<dyn BlobStore>,
    options: SignOptions,
    keys: KeyService,
    signer: SigningService,
    verifier: VerificationService,
}

impl SignWorkflow {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        signatures: Arc<dyn SignatureStore>,
        users: Arc<dyn UserStore>,
        blobs: Arc<dyn BlobStore>,
        options: SignOptions,
    ) -> Self {
        Self {
            documents,
            signatures,
            users,
            blobs,
            options,
            keys: KeyService::new(),
            signer: SigningService::new(),
            verifier: VerificationService::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &SignOptions {
        &self.options
    }

    /// Sign document `document_id` on behalf of `signer`.
    pub fn sign_document(
        &self,
        document_id: DocumentId,
        signer: &UserId,
    ) -> SigningResult<SignOutcome> {
        let mut document = self
            .documents
            .find_by_id(document_id)?
            .ok_or_else(|| SigningError::DocumentNotFound(document_id.to_string()))?;
        if self.users.get_by_id(signer)?.is_none() {
            return Err(SigningError::SignerNotFound(signer.clone()));
        }

        let pair = self.keys.generate_key_pair()?;
        let signature = self.signer.sign_digest(&document.digest, pair.signing_key())?;

        let mut record = SignatureRecord::new(
            document.id,
            signer.clone(),
            signature.to_base64(),
            Utc::now().timestamp(),
        );
        record.public_key = Some(pair.verifying_key().to_public_key_b64()?);
        if self.options.retain_private_key {
            record.private_key = Some(pair.signing_key().to_private_key_b64()?);
        }
        drop(pair);

        let original = self.blobs.read(&document.file_path)?;
        let signed = self.options.envelope_format.embed(&original, &signature);
        let signed_blob_key = format!("{}{}", document.file_path, self.options.signed_suffix);
        self.blobs.write(&signed_blob_key, &signed)?;

        let record = self.signatures.create(record)?;
        document.status = DocumentStatus::Signed;
        self.documents.update(&document)?;

        log::info!(
            "Document {} signed by {signer} (signature {}, {} envelope)",
            document.id,
            record.id,
            self.options.envelope_format
        );
        Ok(SignOutcome {
            record,
            signed_blob_key,
        })
    }

    pub fn get_signature(&self, id: SignatureId) -> SigningResult<SignatureRecord> {
        self.signatures
            .find_by_id(id)?
            .ok_or(SigningError::SignatureNotFound(id))
    }

    pub fn signatures_for_document(
        &self,
        document_id: DocumentId,
    ) -> SigningResult<Vec<SignatureRecord>> {
        self.signatures.find_by_document_id(document_id)
    }

    pub fn update_signature(&self, record: &SignatureRecord) -> SigningResult<SignatureRecord> {
        self.get_signature(record.id)?;
        self.signatures.update(record)?;
        Ok(record.clone())
    }

    pub fn delete_signature(&self, id: SignatureId) -> SigningResult<()> {
        self.signatures.delete(id)?;
        log::info!("Deleted signature {id}");
        Ok(())
    }

    /// Check a stored signature against its document's original blob.
    pub fn verify_stored(&self, id: SignatureId) -> SigningResult<VerificationReport> {
        let record = self.get_signature(id)?;
        let document = self
            .documents
            .find_by_id(record.document)?
            .ok_or_else(|| SigningError::DocumentNotFound(record.document.to_string()))?;
        let content = self.blobs.read(&document.file_path)?;

        let report = match KeyMaterial::from_record(&record) {
            Ok(material) => {
                self.verifier
                    .verify_against_content(&content, &record.signature_raw, &material)
            }
            Err(e) => VerificationReport::rejected(e).with_digest(document.digest.clone()),
        };
        Ok(report.with_document(document.id).with_signature(record.id))
    }
}
