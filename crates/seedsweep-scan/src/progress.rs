//! Index build progress reporting.

use std::time::Duration;

/// Progress information while building an index.
#[derive(Debug, Clone)]
pub struct IndexProgress {
    /// Number of torrents fully processed so far.
    pub torrents_indexed: u64,
    /// Number of torrents in the run.
    pub total_torrents: u64,
    /// Number of files queried so far.
    pub files_queried: u64,
    /// Number of files that could not be resolved.
    pub inaccessible_files: u64,
    /// Time elapsed since the build started.
    pub elapsed: Duration,
}

impl IndexProgress {
    /// Calculate query rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_queried as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Check whether every torrent has been processed.
    pub fn is_complete(&self) -> bool {
        self.torrents_indexed >= self.total_torrents
    }
}
