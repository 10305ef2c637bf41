//! Blob storage for original and signed document bytes.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::adapters::store::BlobStore;
use crate::infra::error::{SigningError, SigningResult};

/// Blobs as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are relative paths that must stay inside the root.
    fn resolve(&self, key: &str) -> SigningResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(SigningError::StorageError(format!(
                "invalid blob key '{key}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, key: &str) -> SigningResult<Vec<u8>> {
        let path = self.resolve(key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SigningError::StorageError(format!("blob '{key}' not found")),
            _ => SigningError::IoError(format!("Failed to read {}: {e}", path.display())),
        })
    }

    fn write(&self, key: &str, bytes: &[u8]) -> SigningResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SigningError::IoError(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, bytes)
            .map_err(|e| SigningError::IoError(format!("Failed to write {}: {e}", path.display())))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> SigningResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SigningError::IoError(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    fn exists(&self, key: &str) -> SigningResult<bool> {
        Ok(self.resolve(key)?.is_file())
    }
}

/// Blobs held in a map; for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> SigningError {
    SigningError::StorageError("blob store lock poisoned".to_string())
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> SigningResult<Vec<u8>> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| SigningError::StorageError(format!("blob '{key}' not found")))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> SigningResult<()> {
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> SigningResult<()> {
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> SigningResult<bool> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path());

        store.write("uploads/a/doc.txt", b"content").unwrap();
        assert!(store.exists("uploads/a/doc.txt").unwrap());
        assert_eq!(store.read("uploads/a/doc.txt").unwrap(), b"content");

        store.delete("uploads/a/doc.txt").unwrap();
        assert!(!store.exists("uploads/a/doc.txt").unwrap());
        store.delete("uploads/a/doc.txt").unwrap();
    }

    #[test]
    fn fs_store_rejects_escaping_keys() {
        let temp = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path());
        for key in ["", "../outside", "/etc/passwd", "a/../../b"] {
            assert!(
                matches!(store.write(key, b"x"), Err(SigningError::StorageError(_))),
                "{key}"
            );
        }
    }

    #[test]
    fn missing_blob_is_storage_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            FsBlobStore::new(temp.path()).read("nope"),
            Err(SigningError::StorageError(_))
        ));
        assert!(matches!(
            MemoryBlobStore::new().read("nope"),
            Err(SigningError::StorageError(_))
        ));
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryBlobStore::new();
        store.write("k", b"one").unwrap();
        store.write("k", b"two").unwrap();
        assert_eq!(store.read("k").unwrap(), b"two");
    }
}
