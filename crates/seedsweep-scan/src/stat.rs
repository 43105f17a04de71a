//! Filesystem metadata queries.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use seedsweep_core::{FileStat, FilesystemIdentity, StatError};

/// Resolves a path to its filesystem identity and hardlink count.
pub trait StatProvider: Send + Sync {
    /// Query the file at `path`, following symlinks.
    fn stat(&self, path: &Path) -> Result<FileStat, StatError>;
}

impl<T: StatProvider + ?Sized> StatProvider for &T {
    fn stat(&self, path: &Path) -> Result<FileStat, StatError> {
        (**self).stat(path)
    }
}

/// Queries the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsStat;

impl StatProvider for OsStat {
    fn stat(&self, path: &Path) -> Result<FileStat, StatError> {
        let metadata = std::fs::metadata(path).map_err(|e| StatError::io(path, e))?;
        file_stat(path, &metadata)
    }
}

#[cfg(unix)]
fn file_stat(_path: &Path, metadata: &std::fs::Metadata) -> Result<FileStat, StatError> {
    Ok(FileStat::new(
        FilesystemIdentity::new(metadata.dev(), metadata.ino()),
        metadata.nlink(),
    ))
}

#[cfg(not(unix))]
fn file_stat(path: &Path, _metadata: &std::fs::Metadata) -> Result<FileStat, StatError> {
    Err(StatError::Unsupported {
        path: path.to_path_buf(),
    })
}

/// In-memory provider backed by a path table.
///
/// Paths not in the table resolve to [`StatError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStat {
    entries: HashMap<PathBuf, FileStat>,
    denied: HashSet<PathBuf>,
}

impl MemoryStat {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, stat: FileStat) -> &mut Self {
        self.entries.insert(path.into(), stat);
        self
    }

    /// Register a path that fails with permission denied.
    pub fn deny(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.denied.insert(path.into());
        self
    }
}

impl StatProvider for MemoryStat {
    fn stat(&self, path: &Path) -> Result<FileStat, StatError> {
        if self.denied.contains(path) {
            return Err(StatError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        self.entries
            .get(path)
            .copied()
            .ok_or_else(|| StatError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stat_lookup() {
        let stat = FileStat::new(FilesystemIdentity::new(1, 2), 3);
        let mut provider = MemoryStat::new();
        provider.insert("/a", stat).deny("/b");

        assert_eq!(provider.stat(Path::new("/a")).unwrap(), stat);
        assert!(matches!(
            provider.stat(Path::new("/b")),
            Err(StatError::PermissionDenied { .. })
        ));
        assert!(matches!(
            provider.stat(Path::new("/c")),
            Err(StatError::NotFound { .. })
        ));
    }

    #[test]
    fn test_os_stat_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = OsStat.stat(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, StatError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_os_stat_counts_hardlinks() {
        let temp = tempfile::TempDir::new().unwrap();
        let original = temp.path().join("original.bin");
        let link = temp.path().join("link.bin");
        std::fs::write(&original, b"payload").unwrap();
        std::fs::hard_link(&original, &link).unwrap();

        let a = OsStat.stat(&original).unwrap();
        let b = OsStat.stat(&link).unwrap();

        assert_eq!(a.identity, b.identity);
        assert_eq!(a.hardlinks, 2);
    }
}
