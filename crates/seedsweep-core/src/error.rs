//! Error types for inode index building.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent::FileKey;

/// Errors returned when resolving a single file on disk.
#[derive(Debug, Error)]
pub enum StatError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The platform does not expose device and inode numbers.
    #[error("Inode metadata unavailable on this platform: {path}")]
    Unsupported { path: PathBuf },
}

impl StatError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Get the warning kind matching this error.
    pub fn kind(&self) -> WarningKind {
        match self {
            Self::PermissionDenied { .. } => WarningKind::PermissionDenied,
            Self::NotFound { .. } => WarningKind::NotFound,
            Self::Io { .. } => WarningKind::ReadError,
            Self::Unsupported { .. } => WarningKind::Unsupported,
        }
    }
}

/// Errors that abort building an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The worker pool could not be created.
    #[error("Failed to build stat worker pool: {message}")]
    ThreadPool { message: String },
}

/// Kind of stat warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// File does not exist.
    NotFound,
    /// Error reading metadata.
    ReadError,
    /// Inode metadata unsupported.
    Unsupported,
}

/// A torrent file that could not be resolved. The file is treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatWarning {
    /// Torrent and file index.
    pub file: FileKey,
    /// Path that was queried.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl StatWarning {
    /// Create a warning from a failed stat.
    pub fn from_error(file: FileKey, path: impl Into<PathBuf>, error: &StatError) -> Self {
        Self {
            file,
            path: path.into(),
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}
