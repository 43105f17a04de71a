//! Inode index builder.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::debug;

use seedsweep_core::{FileKey, FileRef, FileStat, IndexError, IndexStats, InodeIndex, StatWarning, Torrent};

use crate::inode::InodeTracker;
use crate::progress::IndexProgress;
use crate::stat::{OsStat, StatProvider};

/// Progress is published after this many torrents.
const PROGRESS_INTERVAL: u64 = 500;

/// Builds an [`InodeIndex`] by querying every file of every torrent.
pub struct IndexBuilder<S = OsStat> {
    stat: S,
    threads: usize,
    progress_tx: broadcast::Sender<IndexProgress>,
}

impl IndexBuilder<OsStat> {
    /// Create a builder that queries the real filesystem.
    pub fn new() -> Self {
        Self::with_stat_provider(OsStat)
    }
}

impl Default for IndexBuilder<OsStat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StatProvider> IndexBuilder<S> {
    /// Create a builder with a custom stat provider.
    pub fn with_stat_provider(stat: S) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            stat,
            threads: 0,
            progress_tx,
        }
    }

    /// Set the number of stat workers (0 = rayon default pool, 1 = sequential).
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Subscribe to build progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<IndexProgress> {
        self.progress_tx.subscribe()
    }

    /// Query every file of every torrent and build the index.
    ///
    /// Files that cannot be queried are recorded as absent and reported as
    /// warnings; they never abort the build.
    pub fn build(&self, torrents: &[Torrent]) -> Result<InodeIndex, IndexError> {
        let start = Instant::now();
        let collector = Collector::new(torrents.len() as u64, start);

        match self.threads {
            1 => torrents
                .iter()
                .for_each(|torrent| self.index_torrent(torrent, &collector)),
            0 => torrents
                .par_iter()
                .for_each(|torrent| self.index_torrent(torrent, &collector)),
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("seedsweep-stat-{i}"))
                    .build()
                    .map_err(|e| IndexError::ThreadPool {
                        message: e.to_string(),
                    })?;
                pool.install(|| {
                    torrents
                        .par_iter()
                        .for_each(|torrent| self.index_torrent(torrent, &collector))
                });
            }
        }

        Ok(collector.finish(start))
    }

    /// Query the files of one torrent.
    fn index_torrent(&self, torrent: &Torrent, collector: &Collector) {
        for file in torrent.file_refs() {
            self.index_file(file, collector);
        }

        let done = collector.torrents_done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == collector.total_torrents {
            // No subscribers is not an error.
            let _ = self.progress_tx.send(collector.snapshot(done));
        }
    }

    fn index_file(&self, file: FileRef, collector: &Collector) {
        collector.files_queried.fetch_add(1, Ordering::Relaxed);
        let FileRef { key, path } = file;

        match self.stat.stat(&path) {
            Ok(stat) => {
                collector.tracker.track(stat.identity, key.torrent.clone());
                collector.files.insert(key, Some(stat));
            }
            Err(err) => {
                debug!(torrent = %key.torrent, index = key.index, error = %err, "file inaccessible");
                collector.inaccessible.fetch_add(1, Ordering::Relaxed);
                collector
                    .warnings
                    .insert(key.clone(), StatWarning::from_error(key.clone(), path, &err));
                collector.files.insert(key, None);
            }
        }
    }
}

/// Shared state written by stat workers.
struct Collector {
    tracker: InodeTracker,
    files: DashMap<FileKey, Option<FileStat>>,
    warnings: DashMap<FileKey, StatWarning>,
    total_torrents: u64,
    torrents_done: AtomicU64,
    files_queried: AtomicU64,
    inaccessible: AtomicU64,
    start: Instant,
}

impl Collector {
    fn new(total_torrents: u64, start: Instant) -> Self {
        Self {
            tracker: InodeTracker::new(),
            files: DashMap::new(),
            warnings: DashMap::new(),
            total_torrents,
            torrents_done: AtomicU64::new(0),
            files_queried: AtomicU64::new(0),
            inaccessible: AtomicU64::new(0),
            start,
        }
    }

    fn snapshot(&self, torrents_indexed: u64) -> IndexProgress {
        IndexProgress {
            torrents_indexed,
            total_torrents: self.total_torrents,
            files_queried: self.files_queried.load(Ordering::Relaxed),
            inaccessible_files: self.inaccessible.load(Ordering::Relaxed),
            elapsed: self.start.elapsed(),
        }
    }

    /// Freeze into an immutable index with deterministic ordering.
    fn finish(self, start: Instant) -> InodeIndex {
        let stats = IndexStats {
            total_torrents: self.total_torrents,
            total_files: self.files_queried.into_inner(),
            inaccessible_files: self.inaccessible.into_inner(),
        };

        let files: BTreeMap<FileKey, Option<FileStat>> = self.files.into_iter().collect();
        let warnings: BTreeMap<FileKey, StatWarning> = self.warnings.into_iter().collect();

        InodeIndex::new(
            self.tracker.into_owners(),
            files,
            stats,
            warnings.into_values().collect(),
            start.elapsed(),
        )
    }
}
