//! Inode index container and statistics.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::StatWarning;
use crate::identity::{FileStat, FilesystemIdentity};
use crate::torrent::{FileKey, TorrentId};

/// Summary statistics for a built index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of torrents indexed.
    pub total_torrents: u64,
    /// Number of torrent files queried.
    pub total_files: u64,
    /// Number of files that could not be resolved.
    pub inaccessible_files: u64,
}

impl IndexStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files that resolved successfully.
    pub fn accessible_files(&self) -> u64 {
        self.total_files - self.inaccessible_files
    }
}

/// An identity whose owner count exceeds the smallest hardlink count recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityViolation {
    /// Affected identity.
    pub identity: FilesystemIdentity,
    /// Number of distinct torrents owning it.
    pub torrent_refs: usize,
    /// Smallest hardlink count observed for it.
    pub min_hardlinks: u64,
}

/// Mapping from filesystem identity to owning torrents, plus per-file stats.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct InodeIndex {
    /// Identity -> set of torrents with at least one file at that identity.
    owners: BTreeMap<FilesystemIdentity, BTreeSet<TorrentId>>,

    /// (torrent, file index) -> stat, `None` when the file was inaccessible.
    files: BTreeMap<FileKey, Option<FileStat>>,

    /// Summary statistics.
    pub stats: IndexStats,

    /// Files that could not be resolved.
    pub warnings: Vec<StatWarning>,

    /// When this index was built.
    pub built_at: SystemTime,

    /// Duration of the build.
    pub build_duration: Duration,
}

impl InodeIndex {
    /// Create a new index from its parts.
    pub fn new(
        owners: BTreeMap<FilesystemIdentity, BTreeSet<TorrentId>>,
        files: BTreeMap<FileKey, Option<FileStat>>,
        stats: IndexStats,
        warnings: Vec<StatWarning>,
        build_duration: Duration,
    ) -> Self {
        Self {
            owners,
            files,
            stats,
            warnings,
            built_at: SystemTime::now(),
            build_duration,
        }
    }

    /// Look up the stat of a torrent file. `None` when absent or unknown.
    pub fn file_stat(&self, torrent: &TorrentId, index: u32) -> Option<&FileStat> {
        self.files
            .get(&FileKey::new(torrent.clone(), index))
            .and_then(Option::as_ref)
    }

    /// Number of distinct torrents owning a file at this identity.
    pub fn torrent_refs(&self, identity: &FilesystemIdentity) -> usize {
        self.owners.get(identity).map_or(0, BTreeSet::len)
    }

    /// Torrents owning a file at this identity.
    pub fn owners(&self, identity: &FilesystemIdentity) -> Option<&BTreeSet<TorrentId>> {
        self.owners.get(identity)
    }

    /// Number of distinct identities seen.
    pub fn unique_identities(&self) -> usize {
        self.owners.len()
    }

    /// Iterate over every identity and its owners.
    pub fn iter_owners(&self) -> impl Iterator<Item = (&FilesystemIdentity, &BTreeSet<TorrentId>)> {
        self.owners.iter()
    }

    /// Identities whose owner count exceeds the smallest hardlink count recorded for them.
    ///
    /// Empty on a POSIX filesystem that did not change during the build.
    pub fn violations(&self) -> Vec<IdentityViolation> {
        let mut min_links: BTreeMap<FilesystemIdentity, u64> = BTreeMap::new();
        for stat in self.files.values().flatten() {
            min_links
                .entry(stat.identity)
                .and_modify(|n| *n = (*n).min(stat.hardlinks))
                .or_insert(stat.hardlinks);
        }

        min_links
            .into_iter()
            .filter_map(|(identity, min_hardlinks)| {
                let torrent_refs = self.torrent_refs(&identity);
                (torrent_refs as u64 > min_hardlinks).then_some(IdentityViolation {
                    identity,
                    torrent_refs,
                    min_hardlinks,
                })
            })
            .collect()
    }

    /// Check if any files were inaccessible.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
