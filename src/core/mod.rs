//! core
//!
//! Core domain types for the claims ledger.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ClaimPath, Fingerprint
//! - [`tree`] - The path-addressed claim tree
//! - [`claimer`] - The claimer capability and its recorded form
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Paths are validated once, at the boundary
//! - A tree always has backing storage; there is no half-built state
//! - All serialization is deterministic

pub mod claimer;
pub mod config;
pub mod tree;
pub mod types;
