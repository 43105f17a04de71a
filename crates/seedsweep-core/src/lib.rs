//! Core types for seedsweep.
//!
//! This crate provides the value types shared by the scanning and analysis
//! crates: torrents as reported by the client, filesystem identities, the
//! per-run inode index, and configuration.

mod config;
mod error;
mod identity;
mod index;
mod torrent;

pub use config::{
    CleanupConfig, CleanupConfigBuilder, DEFAULT_EXCLUDE_TAGS, DEFAULT_TAG_REMOVABLE,
    FilterConfig, FilterConfigBuilder, split_list,
};
pub use error::{IndexError, StatError, StatWarning, WarningKind};
pub use identity::{FileStat, FilesystemIdentity};
pub use index::{IdentityViolation, IndexStats, InodeIndex};
pub use torrent::{FileKey, FileRef, Torrent, TorrentFile, TorrentId};
