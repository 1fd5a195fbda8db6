//! storage::mem_fs
//!
//! In-memory claim filesystem for tests and dry runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::traits::{ClaimFs, FileMeta, FsError};

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    mode: u32,
}

/// In-memory claim filesystem.
///
/// Files live only as long as the `MemFs` value. Paths are compared as
/// given; no normalization is performed.
#[derive(Debug, Default)]
pub struct MemFs {
    files: Mutex<BTreeMap<PathBuf, MemFile>>,
}

impl MemFs {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// List stored paths in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }
}

impl ClaimFs for MemFs {
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> Result<(), FsError> {
        self.files.lock().insert(
            path.to_path_buf(),
            MemFile {
                data: data.to_vec(),
                mode: mode & 0o777,
            },
        );
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.files
            .lock()
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn stat(&self, path: &Path) -> Result<FileMeta, FsError> {
        self.files
            .lock()
            .get(path)
            .map(|f| FileMeta {
                len: f.data.len() as u64,
                mode: f.mode,
            })
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read() {
        let fs = MemFs::new();
        fs.write_file(Path::new("claim"), br#"{"foo":1}"#, 0o700)
            .expect("write");

        assert_eq!(
            fs.read_file(Path::new("claim")).expect("read"),
            br#"{"foo":1}"#
        );
    }

    #[test]
    fn stat_reports_mode_and_length() {
        let fs = MemFs::new();
        fs.write_file(Path::new("claim"), b"abc", 0o640)
            .expect("write");

        let meta = fs.stat(Path::new("claim")).expect("stat");
        assert_eq!(meta, FileMeta { len: 3, mode: 0o640 });
    }

    #[test]
    fn mode_is_masked_to_permission_bits() {
        let fs = MemFs::new();
        fs.write_file(Path::new("claim"), b"", 0o100644)
            .expect("write");

        assert_eq!(fs.stat(Path::new("claim")).expect("stat").mode, 0o644);
    }

    #[test]
    fn missing_file_not_found() {
        let fs = MemFs::new();
        assert!(matches!(
            fs.read_file(Path::new("nope")),
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(
            fs.stat(Path::new("nope")),
            Err(FsError::NotFound(_))
        ));
        assert!(!fs.exists(Path::new("nope")).expect("exists"));
    }

    #[test]
    fn paths_are_sorted() {
        let fs = MemFs::new();
        fs.write_file(Path::new("b"), b"", 0o644).unwrap();
        fs.write_file(Path::new("a"), b"", 0o644).unwrap();

        assert_eq!(fs.paths(), vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
