//! services/coach/src/adapters/document_store.rs
//!
//! A generic local document store: one JSON file per entity, addressed by the
//! entity's id, grouped into one directory per collection.

use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use practice_coach_core::ports::{PortError, PortResult};

const EXTENSION: &str = "json";

/// An entity that can live in the document store.
pub trait StoredDocument: Serialize + DeserializeOwned + Send + Sync {
    /// Directory name the entity's documents are grouped under.
    const COLLECTION: &'static str;

    fn document_id(&self) -> Uuid;
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone, Debug)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir<T: StoredDocument>(&self) -> PathBuf {
        self.root.join(T::COLLECTION)
    }

    fn document_path<T: StoredDocument>(&self, id: Uuid) -> PathBuf {
        self.collection_dir::<T>().join(format!("{id}.{EXTENSION}"))
    }

    /// Every decodable document of `T`, in directory enumeration order.
    ///
    /// Unreadable or malformed files are logged and skipped so a single bad
    /// document never hides its siblings.
    pub async fn list<T: StoredDocument>(&self) -> PortResult<Vec<T>> {
        let dir = self.collection_dir::<T>();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_slice::<T>(&bytes) {
                Ok(document) => documents.push(document),
                Err(e) => warn!("Skipping malformed document {}: {}", path.display(), e),
            }
        }

        debug!("Listed {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }

    pub async fn load<T: StoredDocument>(&self, id: Uuid) -> PortResult<T> {
        let path = self.document_path::<T>(id);
        let bytes = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                PortError::NotFound(format!("{} document {} not found", T::COLLECTION, id))
            }
            _ => io_error(&path, e),
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map_err(|e| PortError::Malformed(format!("{}: {}", path.display(), e)))
    }

    /// Creates or overwrites the document. The new content is written to a
    /// temporary sibling and renamed over the old file, so readers see either
    /// the old or the new document in full.
    pub async fn save<T: StoredDocument>(&self, document: &T) -> PortResult<()> {
        let dir = self.collection_dir::<T>();
        fs::create_dir_all(&dir).await.map_err(|e| io_error(&dir, e))?;

        let id = document.document_id();
        let path = self.document_path::<T>(id);
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode {id}: {e}")))?;

        let temp_path = dir.join(format!("{id}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| io_error(&temp_path, e))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(&path, e));
        }

        debug!("Saved {} document {}", T::COLLECTION, id);
        Ok(())
    }

    /// Removes the document. Deleting a missing document succeeds.
    pub async fn delete<T: StoredDocument>(&self, id: Uuid) -> PortResult<()> {
        let path = self.document_path::<T>(id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {} document {}", T::COLLECTION, id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, error: std::io::Error) -> PortError {
    PortError::Unexpected(format!("{}: {}", path.display(), error))
}
