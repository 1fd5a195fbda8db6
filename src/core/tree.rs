//! core::tree
//!
//! The in-memory claim tree.
//!
//! # Design
//!
//! The tree is a JSON document rooted at an object. Every node is a
//! [`serde_json::Value`], so the set of node kinds is closed:
//! null, bool, number, string, array and object.
//!
//! Writes come in two flavors:
//! - **Set-once** ([`ClaimTree::set_once`]): fails if anything is already
//!   present at the path.
//! - **Append** ([`ClaimTree::append_to`]): creates an array on first use,
//!   fails if the path holds anything other than an array.
//!
//! Intermediate segments are created as empty objects on demand. A write
//! that would have to descend through a non-object value fails with
//! [`TreeError::PathCollision`] and leaves the tree unchanged.
//!
//! # Serialization
//!
//! Serialization is compact JSON. Object keys are emitted in lexicographic
//! order, so the output depends only on the tree's contents and not on the
//! order in which sibling keys were written.
//!
//! # Example
//!
//! ```
//! use claimledger::core::tree::ClaimTree;
//! use claimledger::core::types::ClaimPath;
//! use serde_json::json;
//!
//! let mut tree = ClaimTree::new();
//! let path = ClaimPath::new("a.b.c").unwrap();
//!
//! tree.set_once(&path, json!(1)).unwrap();
//! assert_eq!(tree.serialize(), r#"{"a":{"b":{"c":1}}}"#);
//! assert!(tree.set_once(&path, json!(2)).is_err());
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::ClaimPath;

/// Serialized form of a tree with no claims.
pub const EMPTY_TREE: &str = "{}";

/// Errors from structural tree writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A set-once write targeted a path that already holds a value.
    #[error("claim already set at '{path}'")]
    AlreadySet { path: String },

    /// An append targeted a path holding a non-array value.
    #[error("claim at '{path}' is not an array")]
    NotAnArray { path: String },

    /// A write would have to descend through a non-object value.
    #[error("cannot write '{path}': '{segment}' holds a non-object value")]
    PathCollision { path: String, segment: String },
}

/// A hierarchical, path-addressed claim document.
///
/// The only way to obtain a tree is [`ClaimTree::new`] (or `Default`), which
/// always allocates the root object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimTree {
    root: Map<String, Value>,
}

impl ClaimTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self { root: Map::new() }
    }

    /// Check whether any value is present at `path`.
    pub fn exists(&self, path: &ClaimPath) -> bool {
        self.get(path).is_some()
    }

    /// Get the value at `path`, if any.
    pub fn get(&self, path: &ClaimPath) -> Option<&Value> {
        let (parents, last) = path.split_last();
        let mut node = &self.root;
        for segment in parents {
            node = node.get(segment)?.as_object()?;
        }
        node.get(last)
    }

    /// Returns `true` if no claims have been written.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Write `value` at `path` unless something is already there.
    ///
    /// # Errors
    ///
    /// - [`TreeError::AlreadySet`] if `path` already holds a value
    /// - [`TreeError::PathCollision`] if an intermediate segment holds a
    ///   non-object value
    pub fn set_once(&mut self, path: &ClaimPath, value: Value) -> Result<(), TreeError> {
        if self.exists(path) {
            return Err(TreeError::AlreadySet {
                path: path.to_string(),
            });
        }

        let (_, last) = path.split_last();
        let parent = self.parent_mut(path)?;
        parent.insert(last.to_string(), value);
        Ok(())
    }

    /// Append `value` to the array at `path`, creating the array if absent.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotAnArray`] if `path` holds a non-array value
    /// - [`TreeError::PathCollision`] if an intermediate segment holds a
    ///   non-object value
    pub fn append_to(&mut self, path: &ClaimPath, value: Value) -> Result<(), TreeError> {
        let (_, last) = path.split_last();
        let parent = self.parent_mut(path)?;

        match parent
            .entry(last.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(TreeError::NotAnArray {
                path: path.to_string(),
            }),
        }
    }

    /// Canonical compact JSON for the whole tree.
    pub fn serialize(&self) -> String {
        // A string-keyed map of JSON values always serializes.
        serde_json::to_string(&self.root).unwrap_or_else(|_| EMPTY_TREE.to_string())
    }

    /// UTF-8 bytes of [`ClaimTree::serialize`], for file writes.
    pub fn bytes(&self) -> Vec<u8> {
        self.serialize().into_bytes()
    }

    /// Serialize an optional tree; an absent tree renders as `{}`.
    pub fn render(tree: Option<&ClaimTree>) -> String {
        tree.map_or_else(|| EMPTY_TREE.to_string(), ClaimTree::serialize)
    }

    /// Find the first parent segment that holds a non-object value.
    fn collision<'p>(&self, path: &'p ClaimPath) -> Option<&'p str> {
        let (parents, _) = path.split_last();
        let mut node = &self.root;
        for segment in parents {
            match node.get(segment) {
                None => return None,
                Some(Value::Object(child)) => node = child,
                Some(_) => return Some(segment.as_str()),
            }
        }
        None
    }

    /// Walk to the parent object of `path`, creating missing objects.
    ///
    /// Collisions are detected before anything is created, so a failed
    /// write leaves no empty intermediate objects behind.
    fn parent_mut(&mut self, path: &ClaimPath) -> Result<&mut Map<String, Value>, TreeError> {
        if let Some(segment) = self.collision(path) {
            return Err(TreeError::PathCollision {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }

        let (parents, _) = path.split_last();
        let mut node = &mut self.root;
        for segment in parents {
            let child = node
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => {
                    return Err(TreeError::PathCollision {
                        path: path.to_string(),
                        segment: segment.clone(),
                    })
                }
            };
        }
        Ok(node)
    }
}

impl std::fmt::Display for ClaimTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}
