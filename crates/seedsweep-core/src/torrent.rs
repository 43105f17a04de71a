//! Torrent and torrent file value types.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::config::split_list;

/// Stable unique identifier of a torrent (the info hash for qBittorrent).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TorrentId(pub CompactString);

impl TorrentId {
    /// Create a new TorrentId.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(CompactString::new(id))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TorrentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TorrentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One file of a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Index of the file, unique within its torrent.
    pub index: u32,
    /// Path of the file relative to the torrent's save path.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl TorrentFile {
    /// Create a new torrent file.
    pub fn new(index: u32, name: impl Into<String>, size: u64) -> Self {
        Self {
            index,
            name: name.into(),
            size,
        }
    }
}

/// A torrent as reported by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    /// Stable unique identifier.
    pub id: TorrentId,
    /// Display name.
    pub name: String,
    /// Directory the torrent's files are saved under.
    pub save_path: PathBuf,
    /// Files in client order.
    pub files: Vec<TorrentFile>,
    /// Total size in bytes.
    pub size: u64,
    /// Tags assigned in the client.
    pub tags: BTreeSet<String>,
    /// Category, empty when unset.
    pub category: String,
    /// When the torrent was added, if the client reports it.
    pub added_on: Option<DateTime<Utc>>,
}

impl Torrent {
    /// Create a torrent with no files, tags or category.
    pub fn new(id: impl Into<TorrentId>, name: impl Into<String>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            save_path: save_path.into(),
            files: Vec::new(),
            size: 0,
            tags: BTreeSet::new(),
            category: String::new(),
            added_on: None,
        }
    }

    /// Set the files. The torrent size becomes the sum of file sizes.
    pub fn with_files(mut self, files: Vec<TorrentFile>) -> Self {
        self.size = files.iter().map(|f| f.size).sum();
        self.files = files;
        self
    }

    /// Set the total size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set tags from the client's comma-separated tag string.
    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = split_list(tags);
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the time the torrent was added.
    pub fn with_added_on(mut self, added_on: DateTime<Utc>) -> Self {
        self.added_on = Some(added_on);
        self
    }

    /// Full on-disk path of one of this torrent's files.
    pub fn file_path(&self, file: &TorrentFile) -> PathBuf {
        self.save_path.join(&file.name)
    }

    /// Resolve every file of the torrent into a [`FileRef`].
    pub fn file_refs(&self) -> impl Iterator<Item = FileRef> + '_ {
        self.files.iter().map(move |file| FileRef {
            key: FileKey::new(self.id.clone(), file.index),
            path: self.file_path(file),
        })
    }

    /// Check whether the torrent carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Lookup key of one file of one torrent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileKey {
    /// Owning torrent.
    pub torrent: TorrentId,
    /// File index within the torrent.
    pub index: u32,
}

impl FileKey {
    /// Create a new file key.
    pub fn new(torrent: TorrentId, index: u32) -> Self {
        Self { torrent, index }
    }
}

/// One file of one torrent with its resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Torrent and file index.
    pub key: FileKey,
    /// `save_path / file.name`.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_file_path_joins_save_path() {
        let file = TorrentFile::new(0, "Show/S01E01.mkv", 10);
        let torrent = Torrent::new("abc", "Show", "/data/torrents").with_files(vec![file.clone()]);

        assert_eq!(
            torrent.file_path(&file),
            PathBuf::from("/data/torrents/Show/S01E01.mkv")
        );
    }

    #[test]
    fn test_with_files_sums_size() {
        let torrent = Torrent::new("abc", "x", "/d").with_files(vec![
            TorrentFile::new(0, "a", 100),
            TorrentFile::new(1, "b", 23),
        ]);
        assert_eq!(torrent.size, 123);
    }

    #[test]
    fn test_with_tags_trims_entries() {
        let torrent = Torrent::new("abc", "x", "/d").with_tags("keep, cross-seed ,,");
        assert!(torrent.has_tag("keep"));
        assert!(torrent.has_tag("cross-seed"));
        assert_eq!(torrent.tags.len(), 2);
    }

    #[test]
    fn test_file_refs_carry_keys() {
        let torrent = Torrent::new("abc", "x", "/d").with_files(vec![
            TorrentFile::new(3, "a", 1),
            TorrentFile::new(7, "b", 1),
        ]);

        let refs: Vec<FileRef> = torrent.file_refs().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].key, FileKey::new(TorrentId::new("abc"), 7));
        assert_eq!(refs[1].path, Path::new("/d/b"));
    }
}
