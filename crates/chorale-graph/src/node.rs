//! Node identity and state for the rack container.
//!
//! A node carries a stable [`NodePath`] (its address across serialization),
//! an opaque kind id resolved through the registry, and a parameter map that
//! forms its snapshot-visible mutable state. The most recent note routed to
//! a node is kept as transient runtime state and never serialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::note::NoteMessage;

/// Unique identifier for a node within one [`Rack`](crate::Rack) instance.
///
/// Node IDs are arena indices, assigned sequentially and never reused within
/// a rack. They are *not* stable across serialization — use [`NodePath`]
/// when identity must survive a snapshot round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Builds an id from a raw arena index.
    ///
    /// Useful for tests and tooling; an id is only meaningful against the
    /// rack that assigned the index.
    #[inline]
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Stable node address, unique within a rack.
///
/// Paths survive serialization and are the key used to match template nodes
/// with their counterparts in a per-voice clone.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl From<String> for NodePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NodePath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single processing node in a rack.
///
/// The rack treats nodes opaquely: the kind id says what the node is to the
/// host, the parameter map is the state the snapshot codec captures, and
/// `last_note` records the most recent note routed here (runtime-only).
#[derive(Debug, Clone)]
pub struct Node {
    path: NodePath,
    kind: String,
    params: BTreeMap<String, f32>,
    last_note: Option<NoteMessage>,
}

impl Node {
    pub(crate) fn new(kind: String, path: NodePath) -> Self {
        Self {
            path,
            kind,
            params: BTreeMap::new(),
            last_note: None,
        }
    }

    /// Returns the node's stable path.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Returns the node's kind id.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the parameter map (the node's snapshot-visible state).
    pub fn params(&self) -> &BTreeMap<String, f32> {
        &self.params
    }

    /// Returns a parameter value, or `None` if the parameter is unset.
    pub fn param(&self, name: &str) -> Option<f32> {
        self.params.get(name).copied()
    }

    pub(crate) fn set_param(&mut self, name: &str, value: f32) {
        self.params.insert(name.to_string(), value);
    }

    /// Returns the most recent note routed to this node, if any.
    ///
    /// Transient runtime state — not captured by snapshots.
    pub fn last_note(&self) -> Option<&NoteMessage> {
        self.last_note.as_ref()
    }

    pub(crate) fn receive_note(&mut self, message: NoteMessage) {
        self.last_note = Some(message);
    }
}
