//! qBittorrent WebUI client for seedsweep.
//!
//! Covers the handful of API v2 calls the cleanup needs: login, version
//! probe, torrent and file listing, and tagging. Responses are converted
//! into [`seedsweep_core::Torrent`] values so the rest of the pipeline never
//! sees wire types.

mod error;
mod models;
mod qbit;

pub use error::ClientError;
pub use models::{TorrentFileInfo, TorrentInfo};
pub use qbit::{QbitClient, QbitConfig};
