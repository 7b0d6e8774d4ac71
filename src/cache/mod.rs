//! Persistent archive cache keyed by arXiv identifier.
//!
//! Layout: one subdirectory per sanitized identifier under a single root,
//! each holding exactly one `source.tar.gz`. Entries are never expired;
//! removal is an explicit [`CacheStore::invalidate`] call.
//!
//! Writes land in a temporary file inside the entry directory and are
//! renamed into place, so readers never observe a partial archive.
//! Population of a single identifier is serialized through
//! [`CacheStore::lock`].

mod error;

pub use error::CacheError;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use crate::parser::ArxivId;

/// File name of the archive inside each cache entry directory.
pub const ARCHIVE_FILE_NAME: &str = "source.tar.gz";

/// Identifier → archive store on local disk.
///
/// `CacheStore` is `Send + Sync`; share it behind an `Arc` between
/// concurrent resolutions.
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
    /// Per-identifier population locks. Values are `Arc`ed so the shard
    /// lock is released before awaiting the inner mutex.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CacheStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entry for `id`.
    #[must_use]
    pub fn entry_dir(&self, id: &ArxivId) -> PathBuf {
        self.root.join(id.storage_key())
    }

    /// Deterministic archive location for `id`.
    #[must_use]
    pub fn path_for(&self, id: &ArxivId) -> PathBuf {
        self.entry_dir(id).join(ARCHIVE_FILE_NAME)
    }

    /// True if an archive file is present for `id`.
    pub async fn exists(&self, id: &ArxivId) -> bool {
        tokio::fs::metadata(self.path_for(id))
            .await
            .is_ok_and(|meta| meta.is_file())
    }

    /// Acquires the population lock for `id`.
    ///
    /// Hold the guard across the exists-check / fetch / store sequence so two
    /// concurrent resolutions of the same identifier perform one fetch.
    pub async fn lock(&self, id: &ArxivId) -> CacheLock<'_> {
        let key = id.storage_key();
        let mutex = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        CacheLock {
            locks: &self.locks,
            key,
            guard: Some(mutex.lock_owned().await),
        }
    }

    /// Copies the archive at `source` into the cache entry for `id`,
    /// overwriting any previous archive.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the source cannot be read or the entry
    /// cannot be written.
    #[instrument(skip(self), fields(id = %id, source = %source.display()))]
    pub async fn store(&self, id: &ArxivId, source: &Path) -> Result<PathBuf, CacheError> {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| CacheError::io(source, e))?;
        self.store_bytes(id, bytes).await
    }

    /// Writes `bytes` as the archive for `id`, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry cannot be written.
    #[instrument(skip(self, bytes), fields(id = %id, bytes = bytes.len()))]
    pub async fn store_bytes(&self, id: &ArxivId, bytes: Vec<u8>) -> Result<PathBuf, CacheError> {
        let entry_dir = self.entry_dir(id);
        let target = self.path_for(id);

        let written = {
            let entry_dir = entry_dir.clone();
            let target = target.clone();
            tokio::task::spawn_blocking(move || write_atomically(&entry_dir, &target, &bytes))
        }
        .await
        .map_err(|e| CacheError::io(&entry_dir, std::io::Error::other(e)))??;

        info!(path = %target.display(), bytes = written, "archive cached");
        Ok(target)
    }

    /// Removes the entry for `id`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry exists but cannot be removed.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn invalidate(&self, id: &ArxivId) -> Result<bool, CacheError> {
        let entry_dir = self.entry_dir(id);
        match tokio::fs::remove_dir_all(&entry_dir).await {
            Ok(()) => {
                info!(path = %entry_dir.display(), "cache entry invalidated");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(entry_dir, e)),
        }
    }
}

/// Population lock for one identifier, released on drop.
///
/// The map entry is removed once no other task holds or awaits it, so the
/// lock table does not grow with every identifier ever resolved.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct CacheLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CacheLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of 1 means only the map is left.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

fn write_atomically(entry_dir: &Path, target: &Path, bytes: &[u8]) -> Result<u64, CacheError> {
    std::fs::create_dir_all(entry_dir).map_err(|e| CacheError::io(entry_dir, e))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".source")
        .suffix(".partial")
        .tempfile_in(entry_dir)
        .map_err(|e| CacheError::io(entry_dir, e))?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| CacheError::io(staged.path(), e))?;
    staged
        .persist(target)
        .map_err(|e| CacheError::io(target, e.error))?;

    debug!(path = %target.display(), "staged archive persisted");
    Ok(bytes.len() as u64)
}
