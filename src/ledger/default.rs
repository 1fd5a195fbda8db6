//! ledger::default
//!
//! The process-wide default ledger and free functions that forward to it.
//!
//! # Lifetime
//!
//! The default ledger is built on first use and lives until the process
//! exits. There is no way to reset or replace it. Code that needs a fresh
//! ledger (tests, embedded hosts) should construct a [`Ledger`] and pass it
//! explicitly instead.
//!
//! # Example
//!
//! ```
//! use claimledger::ledger::default as claims;
//!
//! claims::make("process.pid", &std::process::id()).unwrap();
//! assert!(claims::current_claims().contains("\"pid\""));
//! ```

use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;

use super::{ClaimError, Ledger};
use crate::core::claimer::MakesClaims;
use crate::storage::ClaimFs;

static DEFAULT: OnceLock<Ledger> = OnceLock::new();

/// Get the default ledger, creating it on first call.
pub fn default_ledger() -> &'static Ledger {
    DEFAULT.get_or_init(Ledger::new)
}

/// Make a set-once claim on the default ledger.
pub fn make<T: Serialize + ?Sized>(path: &str, value: &T) -> Result<(), ClaimError> {
    default_ledger().make(path, value)
}

/// Push a claim onto an array on the default ledger.
pub fn push<T: Serialize + ?Sized>(path: &str, value: &T) -> Result<(), ClaimError> {
    default_ledger().push(path, value)
}

/// Register a claimer on the default ledger.
pub fn add_claimer(claimer: &dyn MakesClaims) -> Result<(), ClaimError> {
    default_ledger().add_claimer(claimer)
}

/// Lock the default ledger's claimer registry.
pub fn lock_claimers() -> Result<(), ClaimError> {
    default_ledger().lock_claimers()
}

/// Serialize the claims recorded on the default ledger.
pub fn current_claims() -> String {
    default_ledger().current_claims()
}

/// Write the default ledger's claims to `path` on `fs`.
pub fn write_file(fs: &dyn ClaimFs, path: &Path, mode: u32) -> Result<(), ClaimError> {
    default_ledger().write_file(fs, path, mode)
}
