//! storage
//!
//! Filesystem abstraction for persisting claims.
//!
//! # Architecture
//!
//! Claims are written through the `ClaimFs` trait, which has two
//! implementations:
//!
//! - [`OsFs`]: Real disk, optionally rooted under a base directory (default)
//! - [`MemFs`]: In-memory map, for tests and dry runs
//!
//! # Provider Selection
//!
//! Use [`create_fs`] to create a filesystem based on configuration:
//!
//! ```
//! use claimledger::storage::create_fs;
//!
//! let fs = create_fs("memory", None).unwrap();
//! assert!(!fs.exists("claims.json".as_ref()).unwrap());
//! ```

mod mem_fs;
mod os_fs;
mod traits;

use std::path::Path;

pub use mem_fs::MemFs;
pub use os_fs::OsFs;
pub use traits::{ClaimFs, FileMeta, FsError};

/// The default filesystem provider name.
pub const DEFAULT_PROVIDER: &str = "os";

/// Names accepted by [`create_fs`].
pub fn valid_provider_names() -> &'static [&'static str] {
    &["os", "memory"]
}

/// Create a filesystem based on the provider name.
///
/// # Providers
///
/// - `"os"` (default): [`OsFs`], rooted under `root` when given
/// - `"memory"`: [`MemFs`]; `root` is ignored
///
/// # Errors
///
/// Returns [`FsError::ProviderNotAvailable`] for an unknown provider name.
pub fn create_fs(provider: &str, root: Option<&Path>) -> Result<Box<dyn ClaimFs>, FsError> {
    match provider {
        "os" => Ok(Box::new(match root {
            Some(root) => OsFs::rooted(root),
            None => OsFs::new(),
        })),
        "memory" => Ok(Box::new(MemFs::new())),
        other => Err(FsError::ProviderNotAvailable(format!(
            "unknown filesystem provider: '{}' (valid: {})",
            other,
            valid_provider_names().join(", ")
        ))),
    }
}
