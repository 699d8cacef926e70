//! services/coach/src/adapters/secret_store.rs
//!
//! A file-backed implementation of the `SecretStore` port for hosts without a
//! platform keychain. Each key maps to one owner-only file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use uuid::Uuid;

use practice_coach_core::ports::SecretStore;

const SECRET_EXTENSION: &str = "secret";

pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are opaque caller strings, so they are hex-encoded into file names.
    fn secret_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{SECRET_EXTENSION}", hex::encode(key.as_bytes())))
    }

    fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        // Unique per write, so concurrent saves of one key never share a file.
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        #[cfg(not(unix))]
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn save(&self, key: &str, bytes: &[u8]) -> bool {
        if let Err(e) = fs::create_dir_all(&self.root) {
            error!("Failed to create secret directory {}: {}", self.root.display(), e);
            return false;
        }
        match Self::write_owner_only(&self.secret_path(key), bytes) {
            Ok(()) => {
                debug!("Stored secret '{}'", key);
                true
            }
            Err(e) => {
                error!("Failed to store secret '{}': {}", key, e);
                false
            }
        }
    }

    fn load(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.secret_path(key)).ok()
    }

    fn delete(&self, key: &str) -> bool {
        match fs::remove_file(self.secret_path(key)) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                error!("Failed to delete secret '{}': {}", key, e);
                false
            }
        }
    }
}
