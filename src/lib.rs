//! claimledger - a path-addressed claims ledger
//!
//! While a process initializes, the policies it applies make claims about
//! it: what version is running, which features are on, who vouches for it.
//! The ledger records those claims in a JSON tree, keeps a registry of the
//! contributors ("claimers") that make them, freezes that registry exactly
//! once, and serializes the whole thing to disk.
//!
//! # Architecture
//!
//! - [`core`] - Claim tree, validated paths, the claimer capability, config
//! - [`ledger`] - The locked, concurrent ledger and the process default
//! - [`storage`] - Filesystem abstraction used for persistence
//!
//! # Invariants
//!
//! 1. A set-once claim is never overwritten
//! 2. An appended path only ever holds an array
//! 3. The claimer registry locks once and never unlocks
//! 4. Serialization is deterministic for a given set of claims

pub mod core;
pub mod ledger;
pub mod storage;

pub use ledger::{ClaimError, Ledger, CLAIMERS_PATH, LOCKED_CLAIMERS_PATH};
