//! ledger
//!
//! The claims ledger: one claim tree, the claimer registry and its lock.
//!
//! # Architecture
//!
//! A [`Ledger`] owns exactly one [`ClaimTree`]. Callers never get a handle
//! into the tree; they write through [`Ledger::make`] and [`Ledger::push`]
//! and read back serialized snapshots.
//!
//! Claimers register with [`Ledger::add_claimer`]. Each registration appends
//! a [`ClaimerRecord`] to the array at [`CLAIMERS_PATH`]. Duplicate names or
//! identities are accepted; uniqueness is the registering policy's job.
//!
//! [`Ledger::lock_claimers`] freezes the registry exactly once: it stores
//! the serialized claimer list as a string at [`LOCKED_CLAIMERS_PATH`] and
//! rejects every later registration.
//!
//! # Concurrency
//!
//! Every operation, reads included, takes one exclusive lock for the whole
//! ledger and holds it until the call returns. That includes
//! [`Ledger::write_file`], so a slow filesystem blocks other callers for the
//! duration of the write. Two racing `make` calls on the same path resolve
//! to exactly one winner; the loser sees [`ClaimError::AlreadyClaimed`].
//!
//! # States
//!
//! ```text
//! Unlocked --lock_claimers--> Locked
//! ```
//!
//! `add_claimer` is only legal while unlocked. Everything else works in
//! both states.
//!
//! # Example
//!
//! ```
//! use claimledger::core::claimer::StaticClaimer;
//! use claimledger::ledger::{ClaimError, Ledger};
//!
//! let ledger = Ledger::new();
//! ledger.make("app.version", "1.2.0").unwrap();
//! ledger.push("app.features", "sync").unwrap();
//!
//! ledger.add_claimer(&StaticClaimer::new("Mocky", "GABC")).unwrap();
//! ledger.lock_claimers().unwrap();
//!
//! assert!(matches!(
//!     ledger.add_claimer(&StaticClaimer::new("Late", "GDEF")),
//!     Err(ClaimError::RegistryLocked)
//! ));
//! ```

pub mod default;

use std::path::Path;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::claimer::{ClaimerRecord, MakesClaims};
use crate::core::config::Config;
use crate::core::tree::{ClaimTree, TreeError, EMPTY_TREE};
use crate::core::types::{ClaimPath, Fingerprint, TypeError};
use crate::storage::{create_fs, ClaimFs, FsError};

/// Claim path holding the live list of registered claimers.
pub const CLAIMERS_PATH: &str = "protocols.claim.claimers";

/// Claim path holding the claimer list serialized at lock time.
pub const LOCKED_CLAIMERS_PATH: &str = "protocols.claim.locked-claimers";

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// A set-once claim targeted a path that already holds a value.
    #[error("claim already made at '{path}'")]
    AlreadyClaimed { path: String },

    /// An append targeted a path holding a non-array value.
    #[error("claim at '{path}' is not appendable")]
    NotAppendable { path: String },

    /// A write would have to descend through a non-object value.
    #[error("cannot claim '{path}': '{segment}' holds a non-object value")]
    PathCollision { path: String, segment: String },

    /// Claimer registration after the registry was locked.
    #[error("cannot add claimer after claimers are locked")]
    RegistryLocked,

    /// A second attempt to lock the registry.
    #[error("claimers already locked")]
    AlreadyLocked,

    /// The claim path failed validation.
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    /// The claim value could not be converted into a tree node.
    #[error("claim value cannot be represented: {0}")]
    InvalidValue(String),

    /// Persisting claims failed.
    #[error("claim write failed: {0}")]
    Io(#[from] FsError),
}

impl From<TreeError> for ClaimError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::AlreadySet { path } => ClaimError::AlreadyClaimed { path },
            TreeError::NotAnArray { path } => ClaimError::NotAppendable { path },
            TreeError::PathCollision { path, segment } => {
                ClaimError::PathCollision { path, segment }
            }
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    tree: ClaimTree,
    locked: bool,
    claimers: Vec<ClaimerRecord>,
}

/// A single set of claims made by the running process.
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Create an empty, unlocked ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a set-once claim at `path`.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::AlreadyClaimed`] if `path` already holds a value
    /// - [`ClaimError::PathCollision`] if a parent segment is not an object
    /// - [`ClaimError::InvalidPath`] / [`ClaimError::InvalidValue`] on bad input
    pub fn make<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), ClaimError> {
        let path = ClaimPath::new(path)?;
        let value = to_node(value)?;

        let mut state = self.state.lock();
        state.tree.set_once(&path, value).map_err(|e| {
            tracing::debug!(path = %path, error = %e, "claim rejected");
            ClaimError::from(e)
        })?;

        tracing::debug!(path = %path, "claim made");
        Ok(())
    }

    /// Append a claim to the array at `path`, creating it if absent.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::NotAppendable`] if `path` holds a non-array value
    /// - [`ClaimError::PathCollision`] if a parent segment is not an object
    /// - [`ClaimError::InvalidPath`] / [`ClaimError::InvalidValue`] on bad input
    pub fn push<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), ClaimError> {
        let path = ClaimPath::new(path)?;
        let value = to_node(value)?;

        let mut state = self.state.lock();
        state.tree.append_to(&path, value).map_err(|e| {
            tracing::debug!(path = %path, error = %e, "claim push rejected");
            ClaimError::from(e)
        })?;

        tracing::debug!(path = %path, "claim pushed");
        Ok(())
    }

    /// Register `claimer` as an identity that makes claims on this ledger.
    ///
    /// The claimer is snapshotted into a [`ClaimerRecord`] before the ledger
    /// lock is taken, so claimer code never runs while the ledger is locked.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::RegistryLocked`] if [`Ledger::lock_claimers`] has run
    /// - [`ClaimError::NotAppendable`] if something else already occupies
    ///   [`CLAIMERS_PATH`]
    pub fn add_claimer(&self, claimer: &dyn MakesClaims) -> Result<(), ClaimError> {
        let record = ClaimerRecord::of(claimer);
        let node = to_node(&record)?;
        let path = ClaimPath::new(CLAIMERS_PATH)?;

        let mut state = self.state.lock();
        if state.locked {
            tracing::warn!(claimer = %record.name, "claimer registration after lock");
            return Err(ClaimError::RegistryLocked);
        }

        state.tree.append_to(&path, node)?;
        tracing::debug!(
            claimer = %record.name,
            identity = %record.identity,
            "claimer added"
        );
        state.claimers.push(record);
        Ok(())
    }

    /// Freeze the claimer registry.
    ///
    /// Writes the serialized claimer list, as a string, to
    /// [`LOCKED_CLAIMERS_PATH`]. With no claimers registered the snapshot is
    /// `{}`. The ledger only becomes locked once that write succeeds.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::AlreadyLocked`] on any call after the first success
    /// - [`ClaimError::AlreadyClaimed`] if the snapshot path was claimed by
    ///   someone else first
    pub fn lock_claimers(&self) -> Result<(), ClaimError> {
        let claimers_path = ClaimPath::new(CLAIMERS_PATH)?;
        let locked_path = ClaimPath::new(LOCKED_CLAIMERS_PATH)?;

        let mut state = self.state.lock();
        if state.locked {
            tracing::warn!("claimers already locked");
            return Err(ClaimError::AlreadyLocked);
        }

        let snapshot = state
            .tree
            .get(&claimers_path)
            .map_or_else(|| EMPTY_TREE.to_string(), Value::to_string);

        state
            .tree
            .set_once(&locked_path, Value::String(snapshot))?;
        state.locked = true;

        tracing::info!(claimers = state.claimers.len(), "claimers locked");
        Ok(())
    }

    /// Serialize every claim recorded so far.
    pub fn current_claims(&self) -> String {
        self.state.lock().tree.serialize()
    }

    /// Write the serialized claims to `path` on `fs` with permission bits
    /// `mode`.
    ///
    /// The ledger lock is held for the whole write.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Io`] if the filesystem write fails.
    pub fn write_file(&self, fs: &dyn ClaimFs, path: &Path, mode: u32) -> Result<(), ClaimError> {
        let state = self.state.lock();
        let bytes = state.tree.bytes();

        fs.write_file(path, &bytes, mode).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "claim write failed");
            ClaimError::Io(e)
        })?;

        tracing::info!(
            path = %path.display(),
            bytes = bytes.len(),
            mode = %format!("{:o}", mode),
            "claims written"
        );
        Ok(())
    }

    /// Write the serialized claims where `config` says to.
    ///
    /// Returns the filesystem the claims were written to; the file lives at
    /// [`Config::output_path`] on it. With the `memory` provider this is the
    /// only handle on the written bytes.
    pub fn write_configured(&self, config: &Config) -> Result<Box<dyn ClaimFs>, ClaimError> {
        let fs = create_fs(config.storage_provider(), config.storage_root())?;
        self.write_file(fs.as_ref(), config.output_path(), config.file_mode())?;
        Ok(fs)
    }

    /// Returns `true` once [`Ledger::lock_claimers`] has succeeded.
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Registered claimers, in registration order.
    pub fn claimers(&self) -> Vec<ClaimerRecord> {
        self.state.lock().claimers.clone()
    }

    /// Get a copy of the claim at `path`, if any.
    pub fn claim(&self, path: &str) -> Result<Option<Value>, ClaimError> {
        let path = ClaimPath::new(path)?;
        Ok(self.state.lock().tree.get(&path).cloned())
    }

    /// The claimer list as serialized at lock time.
    ///
    /// `None` until the registry is locked.
    pub fn locked_snapshot(&self) -> Option<String> {
        let path = ClaimPath::new(LOCKED_CLAIMERS_PATH).ok()?;
        let state = self.state.lock();
        state
            .tree
            .get(&path)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Content hash of the current serialized claims.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.state.lock().tree.bytes())
    }
}

impl std::fmt::Display for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.current_claims())
    }
}

/// Convert a caller value into a tree node.
fn to_node<T: Serialize + ?Sized>(value: &T) -> Result<Value, ClaimError> {
    serde_json::to_value(value).map_err(|e| ClaimError::InvalidValue(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::claimer::StaticClaimer;
    use crate::storage::MemFs;
    use std::path::PathBuf;
    use serde_json::json;

    const MOCKY_ID: &str = "GCG26FSCQEVSHQHUUHPMZQKIB76CIURZSPZ2QXEPGPQSN6JMO3WXXIQM";
    const MOCKY2_ID: &str = "GB3YVHSOJINX357I6FKK4K22SXIPTNGAW7GZIOI54DPLUICKNARMPAAW";
    const MOCKY3_ID: &str = "GBPSRJEFPCHHSMRVUKXLJTQ2PHUOQ5SOTQN2XPUJQFIZSMUPRWRYHOPJ";

    const MOCKY_RECORD: &str = r#"[{"claims":"","identity":"GCG26FSCQEVSHQHUUHPMZQKIB76CIURZSPZ2QXEPGPQSN6JMO3WXXIQM","name":"Mocky"}]"#;

    fn mocky() -> StaticClaimer {
        StaticClaimer::new("Mocky", MOCKY_ID)
    }

    #[test]
    fn make_root_claim() {
        let ledger = Ledger::new();
        ledger.make("foo", &1).expect("make");
        assert_eq!(ledger.claim("foo").unwrap(), Some(json!(1)));
    }

    #[test]
    fn make_nested_claim() {
        let ledger = Ledger::new();
        ledger.make("nested.1.2", &1).expect("make");
        assert_eq!(ledger.claim("nested.1.2").unwrap(), Some(json!(1)));
        assert_eq!(ledger.current_claims(), r#"{"nested":{"1":{"2":1}}}"#);
    }

    #[test]
    fn make_rejects_reclaim() {
        let ledger = Ledger::new();
        ledger.make("foo", &1).unwrap();

        let err = ledger.make("foo", "something else").unwrap_err();
        assert!(matches!(err, ClaimError::AlreadyClaimed { ref path } if path == "foo"));
        assert_eq!(ledger.claim("foo").unwrap(), Some(json!(1)));
    }

    #[test]
    fn make_rejects_pushed_path() {
        let ledger = Ledger::new();
        ledger.push("blah", &1).unwrap();

        assert!(matches!(
            ledger.make("blah", "something else"),
            Err(ClaimError::AlreadyClaimed { .. })
        ));
    }

    #[test]
    fn push_root_claim() {
        let ledger = Ledger::new();
        ledger.push("foo", &1).expect("push");
        assert_eq!(ledger.claim("foo").unwrap(), Some(json!([1])));
    }

    #[test]
    fn push_nested_claim() {
        let ledger = Ledger::new();
        ledger.push("nested.1.2", &1).expect("push");
        assert_eq!(ledger.claim("nested.1.2").unwrap(), Some(json!([1])));
    }

    #[test]
    fn push_accumulates_in_order() {
        let ledger = Ledger::new();
        ledger.push("foo", &1).unwrap();
        ledger.push("foo", &2).unwrap();
        assert_eq!(ledger.current_claims(), r#"{"foo":[1,2]}"#);
    }

    #[test]
    fn push_rejects_made_path() {
        let ledger = Ledger::new();
        ledger.make("blah", &1).unwrap();

        let err = ledger.push("blah", "something else").unwrap_err();
        assert!(matches!(err, ClaimError::NotAppendable { ref path } if path == "blah"));
    }

    #[test]
    fn write_through_scalar_is_collision() {
        let ledger = Ledger::new();
        ledger.make("a", &1).unwrap();

        assert!(matches!(
            ledger.make("a.b", &2),
            Err(ClaimError::PathCollision { ref segment, .. }) if segment == "a"
        ));
    }

    #[test]
    fn invalid_path_rejected() {
        let ledger = Ledger::new();
        assert!(matches!(
            ledger.make("", &1),
            Err(ClaimError::InvalidPath(_))
        ));
        assert!(matches!(
            ledger.push("a..b", &1),
            Err(ClaimError::InvalidPath(_))
        ));
        assert_eq!(ledger.current_claims(), "{}");
    }

    #[test]
    fn structured_values() {
        #[derive(Serialize)]
        struct Build {
            commit: String,
            dirty: bool,
        }

        let ledger = Ledger::new();
        ledger
            .make(
                "build",
                &Build {
                    commit: "abc123".into(),
                    dirty: false,
                },
            )
            .unwrap();

        assert_eq!(
            ledger.current_claims(),
            r#"{"build":{"commit":"abc123","dirty":false}}"#
        );
    }

    #[test]
    fn add_claimer_records_structured_entry() {
        let ledger = Ledger::new();
        ledger.add_claimer(&mocky()).expect("add claimer");

        assert_eq!(
            ledger.claim(CLAIMERS_PATH).unwrap().map(|v| v.to_string()),
            Some(MOCKY_RECORD.to_string())
        );
    }

    #[test]
    fn add_claimer_preserves_order_and_duplicates() {
        let ledger = Ledger::new();
        ledger.add_claimer(&mocky()).unwrap();
        ledger
            .add_claimer(&StaticClaimer::new("Mocky2: Electric Boogaloo", MOCKY2_ID))
            .unwrap();
        ledger.add_claimer(&mocky()).unwrap();

        let names: Vec<_> = ledger.claimers().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Mocky", "Mocky2: Electric Boogaloo", "Mocky"]);

        let listed = ledger.claim(CLAIMERS_PATH).unwrap().unwrap();
        assert_eq!(listed.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn add_claimer_after_lock_fails() {
        let ledger = Ledger::new();
        ledger.add_claimer(&mocky()).unwrap();
        ledger
            .add_claimer(&StaticClaimer::new("Mocky2: Electric Boogaloo", MOCKY2_ID))
            .unwrap();
        ledger.lock_claimers().expect("lock");

        let err = ledger
            .add_claimer(&StaticClaimer::new(
                "Mocky3: Now with more mocking",
                MOCKY3_ID,
            ))
            .unwrap_err();
        assert!(matches!(err, ClaimError::RegistryLocked));
        assert_eq!(ledger.claimers().len(), 2);
    }

    #[test]
    fn add_claimer_blocked_by_occupied_path() {
        let ledger = Ledger::new();
        ledger.make(CLAIMERS_PATH, "taken").unwrap();

        assert!(matches!(
            ledger.add_claimer(&mocky()),
            Err(ClaimError::NotAppendable { .. })
        ));
        assert!(ledger.claimers().is_empty());
    }

    #[test]
    fn lock_with_no_claimers() {
        let ledger = Ledger::new();
        ledger.lock_claimers().expect("lock");

        assert!(ledger.is_locked());
        assert_eq!(ledger.locked_snapshot().as_deref(), Some("{}"));
    }

    #[test]
    fn lock_after_one_claimer() {
        let ledger = Ledger::new();
        ledger.add_claimer(&mocky()).unwrap();
        ledger.lock_claimers().expect("lock");

        assert_eq!(ledger.locked_snapshot().as_deref(), Some(MOCKY_RECORD));
    }

    #[test]
    fn relocking_fails() {
        let ledger = Ledger::new();
        ledger.lock_claimers().expect("first lock");

        assert!(matches!(
            ledger.lock_claimers(),
            Err(ClaimError::AlreadyLocked)
        ));
        assert!(ledger.is_locked());
    }

    #[test]
    fn snapshot_is_frozen() {
        let ledger = Ledger::new();
        ledger.add_claimer(&mocky()).unwrap();
        ledger.lock_claimers().unwrap();

        let _ = ledger.add_claimer(&StaticClaimer::new("Late", MOCKY2_ID));
        let _ = ledger.lock_claimers();

        assert_eq!(ledger.locked_snapshot().as_deref(), Some(MOCKY_RECORD));
    }

    #[test]
    fn lock_fails_if_snapshot_path_taken() {
        let ledger = Ledger::new();
        ledger.make(LOCKED_CLAIMERS_PATH, "squatter").unwrap();

        assert!(matches!(
            ledger.lock_claimers(),
            Err(ClaimError::AlreadyClaimed { .. })
        ));
        assert!(!ledger.is_locked());
        ledger.add_claimer(&mocky()).expect("still unlocked");
    }

    #[test]
    fn make_and_push_allowed_after_lock() {
        let ledger = Ledger::new();
        ledger.lock_claimers().unwrap();

        ledger.make("late.make", &1).expect("make after lock");
        ledger.push("late.push", &1).expect("push after lock");
    }

    #[test]
    fn snapshot_none_before_lock() {
        let ledger = Ledger::new();
        assert!(ledger.locked_snapshot().is_none());
        assert!(!ledger.is_locked());
    }

    #[test]
    fn write_file_to_memory() {
        let ledger = Ledger::new();
        ledger.make("foo", &1).unwrap();

        let fs = MemFs::new();
        ledger
            .write_file(&fs, Path::new("claim"), 0o700)
            .expect("write");

        let read = fs.read_file(Path::new("claim")).expect("read");
        assert_eq!(read, br#"{"foo":1}"#);
        assert_eq!(fs.stat(Path::new("claim")).expect("stat").mode, 0o700);
    }

    #[test]
    fn write_configured_memory_provider() {
        let config = Config::new(crate::core::config::ClaimsConfig {
            output: Some(PathBuf::from("out.json")),
            mode: Some("0600".into()),
            storage: Some(crate::core::config::StorageConfig {
                provider: Some("memory".into()),
                root: None,
            }),
        })
        .unwrap();

        let ledger = Ledger::new();
        ledger.make("foo", &1).unwrap();

        let fs = ledger.write_configured(&config).expect("write");
        let output = config.output_path();
        assert_eq!(fs.read_file(output).unwrap(), br#"{"foo":1}"#);
        assert_eq!(fs.stat(output).unwrap().mode, 0o600);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Ledger::new();
        let b = Ledger::new();
        assert_eq!(a.fingerprint(), b.fingerprint());

        a.make("foo", &1).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());

        b.make("foo", &1).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn display_matches_current_claims() {
        let ledger = Ledger::new();
        ledger.make("foo", "bar").unwrap();
        assert_eq!(ledger.to_string(), ledger.current_claims());
    }

    #[test]
    fn error_display_formatting() {
        let err = ClaimError::AlreadyClaimed { path: "foo".into() };
        assert!(err.to_string().contains("already made"));

        let err = ClaimError::NotAppendable { path: "foo".into() };
        assert!(err.to_string().contains("not appendable"));

        let err = ClaimError::RegistryLocked;
        assert!(err.to_string().contains("locked"));

        let err = ClaimError::AlreadyLocked;
        assert!(err.to_string().contains("already locked"));

        let err = ClaimError::from(FsError::NotFound(PathBuf::from("claim")));
        assert!(err.to_string().contains("write failed"));
    }
}
