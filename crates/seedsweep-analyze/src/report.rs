//! Classification results.

use serde::{Deserialize, Serialize};

use seedsweep_core::{IndexStats, Torrent, TorrentId};

use crate::classify::{Anomaly, Classification};
use crate::filter::ExclusionReason;

/// Classification of one torrent that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentVerdict {
    /// Torrent identifier.
    pub id: TorrentId,
    /// Display name.
    pub name: String,
    /// Category, empty when unset.
    pub category: String,
    /// Total size in bytes.
    pub size: u64,
    /// The outcome.
    pub classification: Classification,
}

impl TorrentVerdict {
    /// Create a verdict for a torrent.
    pub fn new(torrent: &Torrent, classification: Classification) -> Self {
        Self {
            id: torrent.id.clone(),
            name: torrent.name.clone(),
            category: torrent.category.clone(),
            size: torrent.size,
            classification,
        }
    }
}

/// A torrent left out by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedTorrent {
    /// Torrent identifier.
    pub id: TorrentId,
    /// Display name.
    pub name: String,
    /// First rule that rejected it.
    pub reason: ExclusionReason,
}

/// Bucket counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Torrents with an external hardlink.
    pub kept: usize,
    /// Torrents only linked by other torrents.
    pub removable: usize,
    /// Torrents with no accessible files.
    pub skipped: usize,
    /// Torrents left out by the filter.
    pub excluded: usize,
    /// Files with fewer hardlinks than referencing torrents.
    pub anomalies: usize,
}

/// Results of classifying a torrent list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One verdict per classified torrent, in input order.
    pub verdicts: Vec<TorrentVerdict>,
    /// Torrents left out by the filter, in input order.
    pub excluded: Vec<ExcludedTorrent>,
    /// Anomalous files.
    pub anomalies: Vec<Anomaly>,
    /// Statistics of the index the report was computed from.
    pub index_stats: IndexStats,
    /// Number of distinct filesystem identities in the index.
    pub unique_identities: usize,
}

impl ClassificationReport {
    /// Create a new report.
    pub fn new(
        verdicts: Vec<TorrentVerdict>,
        excluded: Vec<ExcludedTorrent>,
        anomalies: Vec<Anomaly>,
        index_stats: IndexStats,
        unique_identities: usize,
    ) -> Self {
        Self {
            verdicts,
            excluded,
            anomalies,
            index_stats,
            unique_identities,
        }
    }

    /// Torrents with no external hardlinks.
    pub fn removable(&self) -> impl Iterator<Item = &TorrentVerdict> {
        self.verdicts
            .iter()
            .filter(|v| v.classification.is_removable())
    }

    /// Torrents with at least one external hardlink.
    pub fn kept(&self) -> impl Iterator<Item = &TorrentVerdict> {
        self.verdicts.iter().filter(|v| v.classification.is_kept())
    }

    /// Torrents with no accessible files.
    pub fn skipped(&self) -> impl Iterator<Item = &TorrentVerdict> {
        self.verdicts
            .iter()
            .filter(|v| v.classification.is_skipped())
    }

    /// Removable torrents, largest first.
    pub fn removable_by_size(&self) -> Vec<&TorrentVerdict> {
        let mut removable: Vec<_> = self.removable().collect();
        removable.sort_by(|a, b| b.size.cmp(&a.size));
        removable
    }

    /// Identifiers of removable torrents, in input order.
    pub fn removable_ids(&self) -> Vec<TorrentId> {
        self.removable().map(|v| v.id.clone()).collect()
    }

    /// Total size of removable torrents.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.removable().map(|v| v.size).sum()
    }

    /// Look up the verdict of a torrent.
    pub fn verdict(&self, id: &TorrentId) -> Option<&TorrentVerdict> {
        self.verdicts.iter().find(|v| &v.id == id)
    }

    /// Check whether a torrent was excluded by the filter.
    pub fn is_excluded(&self, id: &TorrentId) -> bool {
        self.excluded.iter().any(|e| &e.id == id)
    }

    /// Count torrents per bucket.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            kept: self.kept().count(),
            removable: self.removable().count(),
            skipped: self.skipped().count(),
            excluded: self.excluded.len(),
            anomalies: self.anomalies.len(),
        }
    }

    /// Check if anything can be tagged.
    pub fn has_removable(&self) -> bool {
        self.removable().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(id: &str, size: u64, classification: Classification) -> TorrentVerdict {
        let torrent = Torrent::new(id, id, "/d").with_size(size);
        TorrentVerdict::new(&torrent, classification)
    }

    fn report() -> ClassificationReport {
        ClassificationReport::new(
            vec![
                verdict("small", 10, Classification::Removable),
                verdict("skipped", 5, Classification::SkippedNoFiles),
                verdict("large", 300, Classification::Removable),
            ],
            vec![ExcludedTorrent {
                id: TorrentId::new("pinned"),
                name: "pinned".to_string(),
                reason: ExclusionReason::ExcludedTag {
                    tag: "pinned".to_string(),
                },
            }],
            Vec::new(),
            IndexStats::new(),
            0,
        )
    }

    #[test]
    fn test_removable_sorted_by_size() {
        let report = report();
        let names: Vec<&str> = report
            .removable_by_size()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["large", "small"]);
        assert_eq!(report.reclaimable_bytes(), 310);
    }

    #[test]
    fn test_summary_counts() {
        let summary = report().summary();
        assert_eq!(
            summary,
            ReportSummary {
                kept: 0,
                removable: 2,
                skipped: 1,
                excluded: 1,
                anomalies: 0,
            }
        );
    }

    #[test]
    fn test_lookup() {
        let report = report();
        assert!(report.is_excluded(&TorrentId::new("pinned")));
        assert!(report.verdict(&TorrentId::new("pinned")).is_none());
        assert!(report.verdict(&TorrentId::new("small")).is_some());
        assert!(report.has_removable());
    }
}
