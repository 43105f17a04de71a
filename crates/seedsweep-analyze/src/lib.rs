//! Torrent classification for seedsweep.
//!
//! Given an [`InodeIndex`](seedsweep_core::InodeIndex) built by
//! `seedsweep-scan`, this crate decides for each torrent whether its data
//! is referenced outside the torrent client:
//!
//! - **Removable** - every hardlink of every accessible file belongs to a
//!   torrent in the client (pure cross-seed duplication)
//! - **Kept** - some file has more hardlinks than torrents referencing it,
//!   so something else (a media library) links to it
//! - **Skipped** - no file of the torrent could be resolved
//!
//! Torrents rejected by the [`TorrentFilter`] appear in none of the buckets.
//!
//! ```rust,ignore
//! use seedsweep_analyze::Classifier;
//! use seedsweep_core::FilterConfig;
//! use seedsweep_scan::IndexBuilder;
//!
//! let index = IndexBuilder::new().build(&torrents).unwrap();
//! let report = Classifier::new(FilterConfig::default()).classify(&index, &torrents, chrono::Utc::now());
//!
//! for verdict in report.removable_by_size() {
//!     println!("{} ({} bytes)", verdict.name, verdict.size);
//! }
//! ```

mod classify;
mod filter;
mod report;

pub use classify::{Anomaly, Assessment, Classification, Classifier, LinkEvidence};
pub use filter::{ExclusionReason, TorrentFilter};
pub use report::{ClassificationReport, ExcludedTorrent, ReportSummary, TorrentVerdict};

// Re-export core types
pub use seedsweep_core::{FilterConfig, InodeIndex, Torrent, TorrentId};
