//! storage::os_fs
//!
//! Disk-backed claim filesystem.
//!
//! # Behavior
//!
//! - Parent directories are created as needed
//! - Content goes to a hidden `.<name>.tmp` sibling first, is synced, then
//!   renamed over the target; a failed write leaves the old file intact
//! - On Unix the temp file is created with the requested mode, then the mode
//!   is set explicitly so the process umask cannot narrow it
//! - Under a root, paths containing `..` are rejected
//!
//! # Example
//!
//! ```no_run
//! use claimledger::storage::{ClaimFs, OsFs};
//! use std::path::Path;
//!
//! let fs = OsFs::rooted("/var/lib/myapp");
//! fs.write_file(Path::new("claims.json"), b"{}", 0o640)?;
//! # Ok::<(), claimledger::storage::FsError>(())
//! ```

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

use super::traits::{ClaimFs, FileMeta, FsError};

/// Disk-backed claim filesystem.
///
/// With a root, relative paths resolve under it and absolute paths are
/// re-anchored beneath it. Without a root, paths are used as given.
#[derive(Debug, Clone, Default)]
pub struct OsFs {
    root: Option<PathBuf>,
}

impl OsFs {
    /// Create a filesystem that uses paths as given.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Create a filesystem whose paths all resolve under `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Get the root directory, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve `path` against the root.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidPath`] if a rooted path contains `..` or
    /// names the root itself.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, FsError> {
        let root = match &self.root {
            None => return Ok(path.to_path_buf()),
            Some(root) => root,
        };

        let mut relative = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::ParentDir => return Err(FsError::InvalidPath(path.to_path_buf())),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        // The root itself is a directory, never a claims file.
        if relative.as_os_str().is_empty() {
            return Err(FsError::InvalidPath(path.to_path_buf()));
        }
        Ok(root.join(relative))
    }

    /// Hidden sibling that receives the content before the rename.
    fn temp_path(full: &Path) -> Result<PathBuf, FsError> {
        let name = full
            .file_name()
            .ok_or_else(|| FsError::InvalidPath(full.to_path_buf()))?;

        let mut temp = OsString::from(".");
        temp.push(name);
        temp.push(".tmp");
        Ok(full.with_file_name(temp))
    }

    /// Create `temp` with `mode`, write `data` and sync it.
    fn write_temp(temp: &Path, data: &[u8], mode: u32) -> Result<(), FsError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(mode);

        let mut file = options.open(temp).map_err(|e| FsError::from_io(temp, e))?;

        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| FsError::from_io(temp, e))?;
        #[cfg(not(unix))]
        let _ = mode;

        file.write_all(data).map_err(|e| FsError::from_io(temp, e))?;
        file.sync_all().map_err(|e| FsError::from_io(temp, e))
    }
}

impl ClaimFs for OsFs {
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        let temp = Self::temp_path(&full)?;

        if let Some(parent) = full.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FsError::from_io(parent, e))?;
            }
        }

        if let Err(e) = Self::write_temp(&temp, data, mode) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        fs::rename(&temp, &full).map_err(|e| FsError::from_io(&full, e))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| FsError::from_io(&full, e))
    }

    fn stat(&self, path: &Path) -> Result<FileMeta, FsError> {
        let full = self.resolve(path)?;
        let metadata = fs::metadata(&full).map_err(|e| FsError::from_io(&full, e))?;

        #[cfg(unix)]
        let mode = metadata.permissions().mode() & 0o777;
        #[cfg(not(unix))]
        let mode = if metadata.permissions().readonly() {
            0o444
        } else {
            0o644
        };

        Ok(FileMeta {
            len: metadata.len(),
            mode,
        })
    }
}
