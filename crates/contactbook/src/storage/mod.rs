//! Storage layer for contactbook.
//!
//! The whole collection is persisted as a single JSON array in one file. There
//! is no partial update: every write replaces the file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::contact::Collection;
use crate::error::{Error, Result};

/// Content written to a freshly created backing file.
const EMPTY_COLLECTION: &[u8] = b"[]";

/// Flat-file store for the contact collection.
///
/// The store is constructed with an explicit location and handed to the
/// repository; nothing about it is process-global.
#[derive(Debug, Clone)]
pub struct RecordStore {
    /// Path to the backing JSON file.
    path: PathBuf,
}

impl RecordStore {
    /// Create a store for the given backing file.
    ///
    /// Nothing touches the filesystem until [`RecordStore::ensure_initialized`]
    /// is called.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a store and make sure its backing file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(path);
        store.ensure_initialized()?;
        Ok(store)
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty collection if missing.
    ///
    /// Idempotent: an existing file is left untouched, even if it is corrupt.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn ensure_initialized(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
                debug!("Created data directory {}", parent.display());
            }
        }

        if !self.path.exists() {
            self.write_atomic(EMPTY_COLLECTION)?;
            info!("Initialized empty contact store at {}", self.path.display());
        }
        Ok(())
    }

    /// Read and parse the entire collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the file cannot be read and
    /// [`Error::StorageCorrupt`] if it does not hold a JSON array of contacts.
    pub fn load(&self) -> Result<Collection> {
        let bytes = fs::read(&self.path).map_err(|source| Error::StorageRead {
            path: self.path.clone(),
            source,
        })?;
        let contacts: Collection =
            serde_json::from_slice(&bytes).map_err(|source| Error::StorageCorrupt {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            "Loaded {} contacts from {}",
            contacts.len(),
            self.path.display()
        );
        Ok(contacts)
    }

    /// Serialize the full collection and replace the backing file.
    ///
    /// Last writer wins. Readers see either the old or the new file, never a
    /// partial one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails. On failure the
    /// previous file is left in place.
    pub fn save(&self, contacts: &Collection) -> Result<()> {
        let data = serde_json::to_vec(contacts)?;
        self.write_atomic(&data)?;
        debug!("Saved {} contacts to {}", contacts.len(), self.path.display());
        Ok(())
    }

    /// Write to a sibling temp file, fsync, then rename over the target.
    fn write_atomic(&self, data: &[u8]) -> Result<()> {
        let tmp = self.temp_path();
        let write_err = |source| Error::StorageWrite {
            path: self.path.clone(),
            source,
        };

        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(data)?;
            f.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }

        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "contacts".into(), |n| n.to_string_lossy().into_owned());
        self.path
            .with_file_name(format!(".tmp-{file_name}-{}-{nanos}", std::process::id()))
    }
}
