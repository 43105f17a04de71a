//! Inode ownership tracking across torrents.

use std::collections::{BTreeMap, BTreeSet};

use dashmap::DashMap;
use seedsweep_core::{FilesystemIdentity, TorrentId};

/// Tracks which torrents own a file at each filesystem identity.
///
/// Safe to share between stat workers. Only set membership is recorded, so
/// the order in which workers report does not affect the result.
#[derive(Debug, Default)]
pub struct InodeTracker {
    owners: DashMap<FilesystemIdentity, BTreeSet<TorrentId>>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            owners: DashMap::new(),
        }
    }

    /// Record that `torrent` has a file at `identity`.
    ///
    /// Returns `true` if this torrent was not yet an owner of the identity.
    pub fn track(&self, identity: FilesystemIdentity, torrent: TorrentId) -> bool {
        self.owners.entry(identity).or_default().insert(torrent)
    }

    /// Get the number of unique identities tracked.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no identities have been tracked.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Freeze into an ordered map.
    pub fn into_owners(self) -> BTreeMap<FilesystemIdentity, BTreeSet<TorrentId>> {
        self.owners.into_iter().collect()
    }
}
