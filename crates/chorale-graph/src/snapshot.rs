//! Snapshot codec — capture and two-phase reconstruction of racks.
//!
//! A [`RackSnapshot`] splits a rack into structural layout (node paths and
//! kinds, connections addressed by path) and mutable state (parameter maps
//! by path). [`instantiate`](RackSnapshot::instantiate) rebuilds a rack in
//! two phases: topology first, then state applied onto the fresh nodes.
//! Consumers treat the snapshot as an opaque blob; the TOML surface exists
//! for hosts that persist it.
//!
//! # TOML Format
//!
//! ```toml
//! [[layout.nodes]]
//! path = "osc1"
//! kind = "oscillator"
//!
//! [[layout.connections]]
//! from = "osc1"
//! to = "out"
//!
//! [[state.nodes]]
//! path = "osc1"
//! [state.nodes.params]
//! freq = 220.0
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::node::NodePath;
use crate::rack::Rack;
use crate::registry::NodeRegistry;

/// Inert capture of a rack: structure plus state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RackSnapshot {
    /// Structural layout — node paths, kinds, and topology.
    pub layout: RackLayout,
    /// Mutable state — parameter values by node path.
    pub state: RackState,
}

/// Structural half of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RackLayout {
    /// Nodes in arena order.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Connections addressed by node path.
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

/// One node in a layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    /// Stable node path.
    pub path: NodePath,
    /// Kind id resolved through the registry at instantiation.
    pub kind: String,
}

/// One connection in a layout, addressed by stable paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSpec {
    /// Source node path.
    pub from: NodePath,
    /// Destination node path.
    pub to: NodePath,
}

/// State half of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RackState {
    /// Per-node parameter maps.
    #[serde(default)]
    pub nodes: Vec<NodeState>,
}

/// Parameter state for one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeState {
    /// Path of the node this state belongs to.
    pub path: NodePath,
    /// Parameter values in name order.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl RackSnapshot {
    /// Captures a rack into a snapshot.
    ///
    /// Fails if the rack's path invariant is broken (two live nodes sharing
    /// a path), which would make the snapshot unrestorable.
    pub fn capture(rack: &Rack) -> Result<Self, SnapshotError> {
        let mut seen = BTreeSet::new();
        let mut nodes = Vec::with_capacity(rack.node_count());
        let mut state = Vec::with_capacity(rack.node_count());

        for (_, node) in rack.nodes() {
            if !seen.insert(node.path().clone()) {
                return Err(SnapshotError::DuplicatePath(node.path().clone()));
            }
            nodes.push(NodeSpec {
                path: node.path().clone(),
                kind: node.kind().to_string(),
            });
            state.push(NodeState {
                path: node.path().clone(),
                params: node.params().clone(),
            });
        }

        let connections = rack
            .connections()
            .iter()
            .filter_map(|conn| {
                let from = rack.node(conn.from)?.path().clone();
                let to = rack.node(conn.to)?.path().clone();
                Some(ConnectionSpec { from, to })
            })
            .collect();

        Ok(Self {
            layout: RackLayout { nodes, connections },
            state: RackState { nodes: state },
        })
    }

    /// Reconstructs a rack from this snapshot.
    ///
    /// Phase one builds the topology: every node in the layout is created
    /// through the registry (unknown kinds fail), defaults applied, then
    /// connections are re-established by path. Phase two applies the state
    /// blob onto the freshly built nodes.
    pub fn instantiate(&self, registry: &NodeRegistry) -> Result<Rack, SnapshotError> {
        let mut rack = Rack::new();

        // Phase 1: topology.
        for spec in &self.layout.nodes {
            let descriptor =
                registry
                    .descriptor(&spec.kind)
                    .ok_or_else(|| SnapshotError::UnknownKind {
                        kind: spec.kind.clone(),
                        path: spec.path.clone(),
                    })?;

            let id = rack
                .add_node(&spec.kind, spec.path.clone())
                .map_err(|_| SnapshotError::DuplicatePath(spec.path.clone()))?;

            for &(name, value) in descriptor.defaults {
                // Node was just created; the id is live.
                let _ = rack.set_param(id, name, value);
            }
        }

        for conn in &self.layout.connections {
            let from = rack
                .find_node(&conn.from)
                .ok_or_else(|| SnapshotError::DanglingConnection(conn.from.clone()))?;
            let to = rack
                .find_node(&conn.to)
                .ok_or_else(|| SnapshotError::DanglingConnection(conn.to.clone()))?;
            let _ = rack.connect(from, to);
        }

        // Phase 2: state.
        for node_state in &self.state.nodes {
            let id = rack
                .find_node(&node_state.path)
                .ok_or_else(|| SnapshotError::UnknownStatePath(node_state.path.clone()))?;
            for (name, value) in &node_state.params {
                let _ = rack.set_param(id, name, *value);
            }
        }

        Ok(rack)
    }

    /// Returns true if this snapshot and `other` describe the same structure
    /// (same nodes, kinds, and topology), ignoring state.
    pub fn structurally_equivalent(&self, other: &Self) -> bool {
        self.layout == other.layout
    }

    /// Parses a snapshot from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, SnapshotError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Converts the snapshot to a TOML string.
    pub fn to_toml(&self) -> Result<String, SnapshotError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads a snapshot from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Saves the snapshot to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| SnapshotError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
