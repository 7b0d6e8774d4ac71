//! Stage-boundary progress reporting.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::archive::ExtractionSummary;
use crate::detect::EntryPoint;
use crate::inline::InlineStats;
use crate::parser::ArxivId;

/// Emitted once per stage boundary, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The reference parsed to `id`.
    Parsed { id: ArxivId },
    /// The cache entry was removed before resolving.
    CacheInvalidated { id: ArxivId, removed: bool },
    /// The archive was already cached.
    CacheHit { id: ArxivId, path: PathBuf },
    /// A network fetch is starting.
    Fetching { id: ArxivId },
    /// The archive is now cached.
    Stored { id: ArxivId, path: PathBuf, bytes: usize },
    /// The archive was unpacked into `dir`.
    Extracted { dir: PathBuf, summary: ExtractionSummary },
    /// Image files were removed from the tree.
    ImagesStripped { removed: usize },
    /// The entry point was chosen.
    EntryPointSelected { entry: EntryPoint },
    /// Inlining finished.
    Inlined { stats: InlineStats, bytes: usize },
}

/// Receives [`PipelineEvent`]s. Never influences control flow.
pub trait PipelineObserver: Send + Sync {
    /// Called at each stage boundary.
    fn on_event(&self, event: &PipelineEvent);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Parsed { id } => debug!(%id, "reference parsed"),
            PipelineEvent::CacheInvalidated { id, removed } => {
                info!(%id, removed, "cache entry invalidated");
            }
            PipelineEvent::CacheHit { id, path } => {
                info!(%id, path = %path.display(), "using cached source");
            }
            PipelineEvent::Fetching { id } => info!(%id, "fetching source bundle"),
            PipelineEvent::Stored { id, path, bytes } => {
                debug!(%id, path = %path.display(), bytes, "source bundle stored");
            }
            PipelineEvent::Extracted { dir, summary } => debug!(
                dir = %dir.display(),
                files = summary.files,
                skipped = summary.skipped,
                "source extracted"
            ),
            PipelineEvent::ImagesStripped { removed } => debug!(removed, "images stripped"),
            PipelineEvent::EntryPointSelected { entry } => info!(
                path = %entry.path.display(),
                method = entry.method.as_str(),
                "entry point selected"
            ),
            PipelineEvent::Inlined { stats, bytes } => info!(
                files = stats.files_read,
                markers = stats.markers(),
                bytes,
                "combined source ready"
            ),
        }
    }
}
