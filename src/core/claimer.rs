//! core::claimer
//!
//! The claimer capability and its recorded form.
//!
//! # Design
//!
//! A claimer is anything that can describe itself with three strings:
//! a friendly name for humans, an identity (typically a public key), and
//! an opaque blob of claims it makes about itself. The ledger never
//! interprets any of them.
//!
//! When a claimer is registered, the ledger takes a [`ClaimerRecord`]
//! snapshot of it. Later changes to the claimer are not reflected in the
//! ledger.
//!
//! # Example
//!
//! ```
//! use claimledger::core::claimer::{ClaimerRecord, MakesClaims, StaticClaimer};
//!
//! let claimer = StaticClaimer::new("Mocky", "GCG26FSCQEVSHQHUUHPMZQKIB76CIURZSPZ2QXEPGPQSN6JMO3WXXIQM");
//! let record = ClaimerRecord::of(&claimer);
//!
//! assert_eq!(record.name, "Mocky");
//! assert_eq!(record.claims, "");
//! ```

use serde::{Deserialize, Serialize};

/// Trait for entities that make claims and can register as claimers.
///
/// Implementations must be thread-safe (Send + Sync) since a ledger may be
/// shared across the threads applying startup policies.
pub trait MakesClaims: Send + Sync {
    /// A friendly name for humans.
    fn claimer_name(&self) -> String;

    /// An opaque identity string, usually a public key.
    fn claimer_identity(&self) -> String;

    /// An opaque, claimer-supplied serialized blob of claims.
    fn claimer_claims(&self) -> String;
}

/// The structured descriptor recorded for each registered claimer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimerRecord {
    pub name: String,
    pub identity: String,
    pub claims: String,
}

impl ClaimerRecord {
    /// Snapshot a claimer's current name, identity and claims.
    pub fn of(claimer: &dyn MakesClaims) -> Self {
        Self {
            name: claimer.claimer_name(),
            identity: claimer.claimer_identity(),
            claims: claimer.claimer_claims(),
        }
    }
}

/// A claimer with fixed name, identity and claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticClaimer {
    pub name: String,
    pub identity: String,
    pub claims: String,
}

impl StaticClaimer {
    /// Create a claimer that makes no claims about itself.
    pub fn new(name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: identity.into(),
            claims: String::new(),
        }
    }

    /// Attach a claims blob.
    pub fn with_claims(mut self, claims: impl Into<String>) -> Self {
        self.claims = claims.into();
        self
    }
}

impl MakesClaims for StaticClaimer {
    fn claimer_name(&self) -> String {
        self.name.clone()
    }

    fn claimer_identity(&self) -> String {
        self.identity.clone()
    }

    fn claimer_claims(&self) -> String {
        self.claims.clone()
    }
}
