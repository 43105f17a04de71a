//! Inode index building for seedsweep.
//!
//! This crate resolves every file of every torrent to its filesystem
//! identity (device + inode) and hardlink count, and records which
//! torrents own a file at each identity.
//!
//! # Overview
//!
//! - **Pluggable metadata source** via the [`StatProvider`] trait
//! - **Parallel queries** via rayon, or sequential with `threads(1)`
//! - **Progress updates** via broadcast channels
//! - **Best effort**: inaccessible files become absent entries, never errors
//!
//! # Example
//!
//! ```rust,no_run
//! use seedsweep_core::{Torrent, TorrentFile};
//! use seedsweep_scan::IndexBuilder;
//!
//! let torrents = vec![
//!     Torrent::new("abc", "Example", "/downloads")
//!         .with_files(vec![TorrentFile::new(0, "Example/file.mkv", 1024)]),
//! ];
//!
//! let index = IndexBuilder::new().build(&torrents).unwrap();
//! println!("Unique inodes: {}", index.unique_identities());
//! println!("Inaccessible: {}", index.stats.inaccessible_files);
//! ```

mod builder;
mod inode;
mod progress;
mod stat;

pub use builder::IndexBuilder;
pub use inode::InodeTracker;
pub use progress::IndexProgress;
pub use stat::{MemoryStat, OsStat, StatProvider};

// Re-export core types for convenience
pub use seedsweep_core::{
    FileKey, FileRef, FileStat, FilesystemIdentity, IndexError, IndexStats, InodeIndex, StatError,
    StatWarning, Torrent, TorrentFile, TorrentId, WarningKind,
};
