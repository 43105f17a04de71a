//! Hardlink-based torrent classification.
//!
//! A file's hardlink count covers every directory entry pointing at its
//! inode: the client's own cross-seeded copies and anything outside the
//! client (a media library, for example). The index tells us how many
//! torrents reference the inode, so any surplus of hardlinks over torrent
//! references is a link the client does not know about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use seedsweep_core::{FilesystemIdentity, FilterConfig, InodeIndex, Torrent, TorrentFile, TorrentId};

use crate::filter::TorrentFilter;
use crate::report::{ClassificationReport, ExcludedTorrent, TorrentVerdict};

/// Outcome for one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// Every accessible file is only linked by torrents in the client.
    Removable,
    /// At least one file has a hardlink outside the client.
    Kept {
        /// The first file found to be linked externally.
        evidence: LinkEvidence,
    },
    /// None of the torrent's files could be resolved.
    SkippedNoFiles,
}

impl Classification {
    /// Check if this is a removable torrent.
    pub fn is_removable(&self) -> bool {
        matches!(self, Classification::Removable)
    }

    /// Check if this is a kept torrent.
    pub fn is_kept(&self) -> bool {
        matches!(self, Classification::Kept { .. })
    }

    /// Check if this torrent was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Classification::SkippedNoFiles)
    }
}

/// Link counts of a single torrent file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEvidence {
    /// File index within the torrent.
    pub file_index: u32,
    /// File path relative to the save path.
    pub file_name: String,
    /// Identity of the file data.
    pub identity: FilesystemIdentity,
    /// Hardlink count reported by the OS.
    pub hardlinks: u64,
    /// Number of torrents in the client referencing the identity.
    pub torrent_refs: usize,
}

impl LinkEvidence {
    /// Links not accounted for by any torrent.
    pub fn external_links(&self) -> u64 {
        self.hardlinks.saturating_sub(self.torrent_refs as u64)
    }
}

/// A file with fewer hardlinks than torrents referencing its identity.
///
/// Impossible on a POSIX filesystem that did not change while it was being
/// indexed. The file is treated as not externally linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Torrent owning the file.
    pub torrent: TorrentId,
    /// The offending file.
    pub evidence: LinkEvidence,
}

/// Classification of one torrent plus anomalies seen while examining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// The outcome.
    pub classification: Classification,
    /// Files that violated the index invariant.
    pub anomalies: Vec<Anomaly>,
}

/// Classifies torrents as removable, kept or skipped.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    filter: TorrentFilter,
}

impl Classifier {
    /// Create a classifier with the given filter configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            filter: TorrentFilter::new(config),
        }
    }

    /// Filter and classify every torrent.
    ///
    /// `now` is used by the minimum age rule only.
    pub fn classify(
        &self,
        index: &InodeIndex,
        torrents: &[Torrent],
        now: DateTime<Utc>,
    ) -> ClassificationReport {
        let mut verdicts = Vec::new();
        let mut excluded = Vec::new();
        let mut anomalies = Vec::new();

        for torrent in torrents {
            if let Err(reason) = self.filter.check(torrent, now) {
                debug!(torrent = %torrent.id, %reason, "excluded");
                excluded.push(ExcludedTorrent {
                    id: torrent.id.clone(),
                    name: torrent.name.clone(),
                    reason,
                });
                continue;
            }

            let assessment = self.assess(index, torrent);
            anomalies.extend(assessment.anomalies);
            verdicts.push(TorrentVerdict::new(torrent, assessment.classification));
        }

        ClassificationReport::new(
            verdicts,
            excluded,
            anomalies,
            index.stats.clone(),
            index.unique_identities(),
        )
    }

    /// Classify a single torrent, ignoring the filter.
    pub fn assess(&self, index: &InodeIndex, torrent: &Torrent) -> Assessment {
        let mut has_files = false;
        let mut anomalies = Vec::new();

        for file in &torrent.files {
            let Some(stat) = index.file_stat(&torrent.id, file.index) else {
                continue;
            };
            has_files = true;

            let torrent_refs = index.torrent_refs(&stat.identity);
            let link_evidence = || evidence(file, stat.identity, stat.hardlinks, torrent_refs);

            if stat.hardlinks > torrent_refs as u64 {
                return Assessment {
                    classification: Classification::Kept {
                        evidence: link_evidence(),
                    },
                    anomalies,
                };
            }

            if stat.hardlinks < torrent_refs as u64 {
                warn!(
                    torrent = %torrent.id,
                    file = file.index,
                    identity = %stat.identity,
                    hardlinks = stat.hardlinks,
                    torrent_refs,
                    "fewer hardlinks than referencing torrents"
                );
                anomalies.push(Anomaly {
                    torrent: torrent.id.clone(),
                    evidence: link_evidence(),
                });
            }
        }

        let classification = if has_files {
            Classification::Removable
        } else {
            Classification::SkippedNoFiles
        };

        Assessment {
            classification,
            anomalies,
        }
    }
}

fn evidence(
    file: &TorrentFile,
    identity: FilesystemIdentity,
    hardlinks: u64,
    torrent_refs: usize,
) -> LinkEvidence {
    LinkEvidence {
        file_index: file.index,
        file_name: file.name.clone(),
        identity,
        hardlinks,
        torrent_refs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::time::Duration;

    use seedsweep_core::{FileKey, FileStat, IndexStats};

    fn index(entries: &[(&str, u32, Option<(u64, u64)>)]) -> InodeIndex {
        let mut owners: BTreeMap<FilesystemIdentity, BTreeSet<TorrentId>> = BTreeMap::new();
        let mut files = BTreeMap::new();
        for (torrent, file, stat) in entries {
            let key = FileKey::new(TorrentId::new(torrent), *file);
            let stat = stat.map(|(inode, links)| FileStat::new(FilesystemIdentity::new(1, inode), links));
            if let Some(stat) = stat {
                owners
                    .entry(stat.identity)
                    .or_default()
                    .insert(TorrentId::new(torrent));
            }
            files.insert(key, stat);
        }
        InodeIndex::new(owners, files, IndexStats::new(), Vec::new(), Duration::ZERO)
    }

    fn torrent(id: &str, files: u32) -> Torrent {
        Torrent::new(id, id, "/d").with_files(
            (0..files)
                .map(|i| TorrentFile::new(i, format!("f{i}"), 1))
                .collect(),
        )
    }

    #[test]
    fn test_single_external_link_keeps() {
        let index = index(&[("c", 0, Some((10, 2)))]);
        let assessment = Classifier::default().assess(&index, &torrent("c", 1));

        match assessment.classification {
            Classification::Kept { evidence } => {
                assert_eq!(evidence.hardlinks, 2);
                assert_eq!(evidence.torrent_refs, 1);
                assert_eq!(evidence.external_links(), 1);
            }
            other => panic!("expected kept, got {other:?}"),
        }
    }

    #[test]
    fn test_short_circuit_on_first_external_file() {
        // File 0 is externally linked, file 1 would be an anomaly but is never examined.
        let index = index(&[
            ("e", 0, Some((1, 3))),
            ("e", 1, Some((2, 1))),
            ("x", 0, Some((2, 1))),
            ("y", 0, Some((2, 1))),
        ]);
        let assessment = Classifier::default().assess(&index, &torrent("e", 2));

        assert!(assessment.classification.is_kept());
        assert!(assessment.anomalies.is_empty());
    }

    #[test]
    fn test_anomaly_is_not_external() {
        let index = index(&[("a", 0, Some((5, 1))), ("b", 0, Some((5, 1)))]);
        let assessment = Classifier::default().assess(&index, &torrent("a", 1));

        assert!(assessment.classification.is_removable());
        assert_eq!(assessment.anomalies.len(), 1);
        assert_eq!(assessment.anomalies[0].evidence.torrent_refs, 2);
    }

    #[test]
    fn test_all_absent_is_skipped() {
        let index = index(&[("s", 0, None), ("s", 1, None)]);
        let assessment = Classifier::default().assess(&index, &torrent("s", 2));
        assert!(assessment.classification.is_skipped());
    }

    #[test]
    fn test_no_files_is_skipped() {
        let index = index(&[]);
        let assessment = Classifier::default().assess(&index, &torrent("n", 0));
        assert_eq!(assessment.classification, Classification::SkippedNoFiles);
    }
}
