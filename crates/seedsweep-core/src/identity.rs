//! Filesystem identity types for hardlink accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (device, inode) pair identifying one physical file on one filesystem.
///
/// Two paths with the same identity are hardlinks of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilesystemIdentity {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl FilesystemIdentity {
    /// Create a new identity.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }
}

impl fmt::Display for FilesystemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.inode)
    }
}

/// Result of resolving one torrent file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Identity of the file data.
    pub identity: FilesystemIdentity,
    /// Total hardlink count reported by the OS, including links outside the client.
    pub hardlinks: u64,
}

impl FileStat {
    /// Create a new file stat.
    pub fn new(identity: FilesystemIdentity, hardlinks: u64) -> Self {
        Self {
            identity,
            hardlinks,
        }
    }
}
