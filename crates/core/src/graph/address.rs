//! Hierarchical addresses for graph nodes and edges
//!
//! An address is an ordered list of string parts such as
//! `["github", "issue", "123"]`. Node and edge addresses share one
//! representation but are distinct types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Marker naming an address namespace
pub trait AddressKind {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKind;

impl AddressKind for NodeKind {
    const NAME: &'static str = "NodeAddress";
}

impl AddressKind for EdgeKind {
    const NAME: &'static str = "EdgeAddress";
}

/// Address of a node
pub type NodeAddress = Address<NodeKind>;

/// Address of an edge
pub type EdgeAddress = Address<EdgeKind>;

/// Immutable hierarchical address.
///
/// Ordering is lexicographic over parts, so every address carrying a given
/// prefix sorts into one contiguous run starting at the prefix itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address<K> {
    parts: Vec<String>,
    kind: PhantomData<K>,
}

impl<K> Address<K> {
    /// The root address, a prefix of every address
    pub fn empty() -> Self {
        Self {
            parts: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Build an address from its parts
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            kind: PhantomData,
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// New address with extra parts appended
    pub fn append<I, S>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.parts.clone();
        next.extend(parts.into_iter().map(Into::into));
        Self {
            parts: next,
            kind: PhantomData,
        }
    }

    /// True if `prefix` is a leading run of this address's parts
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        self.parts.starts_with(&prefix.parts)
    }
}

impl<K> Default for Address<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: AddressKind> fmt::Display for Address<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = serde_json::to_string(&self.parts).map_err(|_| fmt::Error)?;
        write!(f, "{}{}", K::NAME, parts)
    }
}
