//! storage::traits
//!
//! Filesystem capability used to persist claims.
//!
//! # Design
//!
//! The `ClaimFs` trait is the narrow slice of a filesystem the ledger
//! needs: write a whole file with given permission bits, read it back, and
//! stat it. Keeping it this small lets tests swap in [`MemFs`] and lets a
//! host rebase all writes under a directory with [`OsFs::rooted`].
//!
//! [`MemFs`]: super::MemFs
//! [`OsFs::rooted`]: super::OsFs::rooted

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// No file exists at the given path.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Underlying I/O failure.
    #[error("i/o error at '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path cannot name a file under the filesystem's root.
    #[error("invalid claims file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Provider not available or not configured.
    #[error("filesystem provider not available: {0}")]
    ProviderNotAvailable(String),
}

impl FsError {
    /// Wrap an I/O error, mapping `NotFound` to [`FsError::NotFound`].
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound(path.to_path_buf())
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Metadata for a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Size in bytes.
    pub len: u64,
    /// Permission bits (`mode & 0o777`).
    pub mode: u32,
}

/// Trait for filesystems that can hold persisted claims.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait ClaimFs: Send + Sync {
    /// Write `data` to `path`, replacing any existing file, with the
    /// permission bits `mode`.
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> Result<(), FsError>;

    /// Read the whole file at `path`.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Stat the file at `path`.
    ///
    /// Returns [`FsError::NotFound`] if nothing is there.
    fn stat(&self, path: &Path) -> Result<FileMeta, FsError>;

    /// Check if a file exists.
    ///
    /// Default implementation uses `stat()`.
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
