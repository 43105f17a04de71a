//! Wire types of the qBittorrent WebUI API.

use std::path::PathBuf;

use chrono::DateTime;
use serde::Deserialize;

use seedsweep_core::{Torrent, TorrentFile};

/// One entry of `GET /api/v2/torrents/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentInfo {
    /// Info hash.
    pub hash: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Save directory.
    pub save_path: PathBuf,
    /// Size of the selected files in bytes.
    #[serde(default)]
    pub size: u64,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
    /// Category, empty when unset.
    #[serde(default)]
    pub category: String,
    /// Unix timestamp of when the torrent was added.
    #[serde(default)]
    pub added_on: i64,
}

/// One entry of `GET /api/v2/torrents/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentFileInfo {
    /// File index; missing from servers older than API 2.8.2.
    #[serde(default)]
    pub index: Option<u32>,
    /// Path relative to the save path.
    pub name: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl TorrentInfo {
    /// Combine with the torrent's file list into a core [`Torrent`].
    pub fn into_torrent(self, files: Vec<TorrentFileInfo>) -> Torrent {
        let files = files
            .into_iter()
            .enumerate()
            .map(|(position, file)| {
                let index = file.index.unwrap_or(position as u32);
                TorrentFile::new(index, file.name, file.size)
            })
            .collect();

        let torrent = Torrent::new(self.hash.as_str(), self.name, self.save_path)
            .with_files(files)
            .with_size(self.size)
            .with_tags(&self.tags)
            .with_category(self.category);

        match DateTime::from_timestamp(self.added_on, 0) {
            Some(added_on) if self.added_on > 0 => torrent.with_added_on(added_on),
            _ => torrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_convert() {
        let info: TorrentInfo = serde_json::from_str(
            r#"{
                "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
                "name": "Linux ISO",
                "save_path": "/downloads/iso",
                "size": 4096,
                "tags": "cross-seed, tracker-b",
                "category": "iso",
                "added_on": 1700000000,
                "state": "stalledUP"
            }"#,
        )
        .unwrap();
        let files: Vec<TorrentFileInfo> = serde_json::from_str(
            r#"[
                {"index": 0, "name": "Linux ISO/disc.iso", "size": 4000},
                {"index": 1, "name": "Linux ISO/README", "size": 96}
            ]"#,
        )
        .unwrap();

        let torrent = info.into_torrent(files);

        assert_eq!(torrent.id.as_str(), "8c212779b4abde7c6bc608063a0d008b7e40ce32");
        assert_eq!(torrent.size, 4096);
        assert!(torrent.has_tag("tracker-b"));
        assert_eq!(torrent.category, "iso");
        assert_eq!(torrent.files[1].index, 1);
        assert_eq!(torrent.added_on.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_missing_index_uses_position() {
        let info: TorrentInfo =
            serde_json::from_str(r#"{"hash": "h", "save_path": "/d"}"#).unwrap();
        let files: Vec<TorrentFileInfo> =
            serde_json::from_str(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();

        let torrent = info.into_torrent(files);

        assert_eq!(torrent.files[0].index, 0);
        assert_eq!(torrent.files[1].index, 1);
        assert!(torrent.added_on.is_none());
        assert!(torrent.tags.is_empty());
    }
}
