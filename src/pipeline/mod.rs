//! End-to-end resolution: reference → combined LaTeX source.
//!
//! Stages run strictly in order for one request:
//!
//! 1. parse the reference into an [`ArxivId`]
//! 2. take the per-identifier cache lock, fetch and store on a miss
//! 3. extract the cached archive into a working directory
//! 4. pick the entry point
//! 5. inline every `\input` / `\include`
//!
//! Filesystem stages run on the blocking pool. Requests for different
//! identifiers may run concurrently on one shared `Pipeline`; requests for
//! the same identifier share one fetch.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use arxiv_latex_core::download::HttpFetcher;
//! use arxiv_latex_core::pipeline::{Pipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new("/tmp/arxiv-cache");
//! let pipeline = Pipeline::new(config, Arc::new(HttpFetcher::new()?))?;
//! let resolution = pipeline.resolve("https://arxiv.org/abs/2301.01234").await?;
//! print!("{}", resolution.combined.text);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod observer;

pub use config::{
    MAX_MAX_DEPTH, MIN_MAX_DEPTH, PipelineConfig, TIMEOUT_RANGE_SECS, default_cache_root,
};
pub use error::{FailureKind, PipelineError};
pub use observer::{NoopObserver, PipelineEvent, PipelineObserver, TracingObserver};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, instrument};

use crate::archive::{extract_archive, strip_image_files};
use crate::cache::CacheStore;
use crate::detect::{EntryPoint, find_entry_point};
use crate::download::SourceFetcher;
use crate::inline::{Combined, combine_sources};
use crate::parser::{ArxivId, parse_reference};

/// Per-request switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep the tree under `<workdir>/<storage key>`, recreated on every
    /// run; a removed temporary directory otherwise.
    pub workdir: Option<PathBuf>,
    /// Remove image files after extraction.
    pub strip_images: bool,
    /// Drop the cache entry before resolving.
    pub refresh: bool,
}

/// Result of one successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Identifier that was resolved.
    pub id: ArxivId,
    /// Entry point, with its path relative to the extraction root.
    pub entry_point: EntryPoint,
    /// The flattened document.
    pub combined: Combined,
    /// True when no fetch was needed.
    pub from_cache: bool,
    /// Location of the cached archive.
    pub archive_path: PathBuf,
    /// Kept extraction directory (`<workdir>/<storage key>`), if requested.
    pub workdir: Option<PathBuf>,
}

/// Where a run extracts its tree.
enum Workspace {
    Temporary(TempDir),
    Kept(PathBuf),
}

impl Workspace {
    /// A kept tree lives in its own per-identifier directory, emptied first,
    /// so the detector never sees files from another resolution.
    fn prepare(workdir: Option<&Path>, id: &ArxivId) -> Result<Self, PipelineError> {
        match workdir {
            Some(dir) => {
                let tree = dir.join(id.storage_key());
                match std::fs::remove_dir_all(&tree) {
                    Ok(()) => debug!(path = %tree.display(), "cleared previous working tree"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(PipelineError::workspace(tree, e)),
                }
                Ok(Self::Kept(tree))
            }
            None => tempfile::Builder::new()
                .prefix("arxiv-latex-")
                .tempdir()
                .map(Self::Temporary)
                .map_err(|e| PipelineError::workspace(std::env::temp_dir(), e)),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }
}

/// The resolution pipeline. `Send + Sync`; share it behind an `Arc`.
pub struct Pipeline {
    config: PipelineConfig,
    cache: CacheStore,
    fetcher: Arc<dyn SourceFetcher>,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline that reports through [`TracingObserver`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let cache = CacheStore::new(config.cache_root.clone());
        Ok(Self {
            config,
            cache,
            fetcher,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Underlying cache store.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Resolves `reference` with default options.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::resolve_with`].
    pub async fn resolve(&self, reference: &str) -> Result<Resolution, PipelineError> {
        self.resolve_with(reference, &ResolveOptions::default()).await
    }

    /// Resolves `reference` into a combined document.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; its [`PipelineError::kind`] names
    /// the stage. No partial output is returned.
    pub async fn resolve_with(
        &self,
        reference: &str,
        options: &ResolveOptions,
    ) -> Result<Resolution, PipelineError> {
        let id = parse_reference(reference)?;
        self.emit(PipelineEvent::Parsed { id: id.clone() });
        self.resolve_id(id, options).await
    }

    /// Resolves an already parsed identifier.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::resolve_with`].
    #[instrument(skip(self, options), fields(id = %id, refresh = options.refresh))]
    pub async fn resolve_id(
        &self,
        id: ArxivId,
        options: &ResolveOptions,
    ) -> Result<Resolution, PipelineError> {
        let (archive_path, from_cache) = self.ensure_cached(&id, options.refresh).await?;

        let workspace = {
            let workdir = options.workdir.clone();
            let id = id.clone();
            tokio::task::spawn_blocking(move || Workspace::prepare(workdir.as_deref(), &id))
        }
        .await??;
        let root = workspace.path().to_path_buf();

        let summary = {
            let archive = archive_path.clone();
            let dest = root.clone();
            tokio::task::spawn_blocking(move || extract_archive(&archive, &dest))
        }
        .await??;
        self.emit(PipelineEvent::Extracted {
            dir: root.clone(),
            summary,
        });

        if options.strip_images {
            let dir = root.clone();
            let removed = tokio::task::spawn_blocking(move || strip_image_files(&dir)).await?;
            self.emit(PipelineEvent::ImagesStripped { removed });
        }

        let entry = {
            let dir = root.clone();
            tokio::task::spawn_blocking(move || find_entry_point(&dir))
        }
        .await??;
        self.emit(PipelineEvent::EntryPointSelected {
            entry: entry.clone(),
        });

        let combined = {
            let entry_path = entry.path.clone();
            let dir = root.clone();
            let max_depth = self.config.max_depth;
            tokio::task::spawn_blocking(move || combine_sources(&entry_path, &dir, max_depth))
        }
        .await?;
        self.emit(PipelineEvent::Inlined {
            stats: combined.stats,
            bytes: combined.text.len(),
        });

        let relative = entry
            .path
            .strip_prefix(&root)
            .map_or_else(|_| entry.path.clone(), Path::to_path_buf);
        let workdir = match workspace {
            Workspace::Kept(path) => Some(path),
            Workspace::Temporary(_) => None,
        };

        Ok(Resolution {
            id,
            entry_point: EntryPoint {
                path: relative,
                method: entry.method,
            },
            combined,
            from_cache,
            archive_path,
            workdir,
        })
    }

    /// Returns the cached archive for `id`, fetching it first on a miss.
    ///
    /// The cache lock is held for the whole check/fetch/store sequence, so a
    /// concurrent request for the same identifier waits and then hits.
    async fn ensure_cached(
        &self,
        id: &ArxivId,
        refresh: bool,
    ) -> Result<(PathBuf, bool), PipelineError> {
        let _guard = self.cache.lock(id).await;

        if refresh {
            let removed = self.cache.invalidate(id).await?;
            self.emit(PipelineEvent::CacheInvalidated {
                id: id.clone(),
                removed,
            });
        }

        if self.cache.exists(id).await {
            let path = self.cache.path_for(id);
            self.emit(PipelineEvent::CacheHit {
                id: id.clone(),
                path: path.clone(),
            });
            return Ok((path, true));
        }

        self.emit(PipelineEvent::Fetching { id: id.clone() });
        let bytes = self.fetcher.fetch(id).await?;
        let size = bytes.len();
        let path = self.cache.store_bytes(id, bytes).await?;
        debug!(path = %path.display(), "cache populated");
        self.emit(PipelineEvent::Stored {
            id: id.clone(),
            path: path.clone(),
            bytes: size,
        });
        Ok((path, false))
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }
}
