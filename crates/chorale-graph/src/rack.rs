//! The rack container — node arena, edge list, and note routing.
//!
//! A [`Rack`] holds nodes in an arena (`Vec<Option<Node>>`) and connections
//! as an explicit edge list over arena indices. Nothing here traverses the
//! topology, so feedback cycles are legal; the snapshot codec copies edges
//! as data.

use crate::error::GraphError;
use crate::node::{Node, NodeId, NodePath};
use crate::note::NoteMessage;
use crate::snapshot::RackSnapshot;

/// A directed connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
}

/// Editable container of processing nodes.
///
/// Owned and mutated on the control thread. The polyphony engine reads
/// snapshots of a template rack and owns one private rack per sounding
/// voice; it never mutates the template itself.
#[derive(Debug, Clone, Default)]
pub struct Rack {
    nodes: Vec<Option<Node>>,
    connections: Vec<Connection>,
    next_node_slot: u32,
}

impl Rack {
    /// Creates an empty rack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node of the given kind at the given path.
    ///
    /// Paths must be unique within the rack; the path is how the node is
    /// matched with its counterpart after a snapshot round trip. The node
    /// starts with an empty parameter map.
    pub fn add_node(
        &mut self,
        kind: impl Into<String>,
        path: impl Into<NodePath>,
    ) -> Result<NodeId, GraphError> {
        let path = path.into();
        if self.find_node(&path).is_some() {
            return Err(GraphError::DuplicatePath(path));
        }

        let id = NodeId(self.next_node_slot);
        self.next_node_slot += 1;
        self.nodes.push(Some(Node::new(kind.into(), path)));

        tracing::debug!("rack_add: node {id}");
        Ok(id)
    }

    /// Connects two nodes with a directed edge.
    ///
    /// Cycles are permitted — the rack records topology, it does not
    /// schedule it.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.node(from).ok_or(GraphError::NodeNotFound(from))?;
        self.node(to).ok_or(GraphError::NodeNotFound(to))?;

        self.connections.push(Connection { from, to });
        tracing::debug!("rack_connect: {from} → {to}");
        Ok(())
    }

    /// Returns a reference to a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    /// Returns a mutable reference to a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Resolves a path to a node id.
    pub fn find_node(&self, path: impl AsRef<str>) -> Option<NodeId> {
        let path = path.as_ref();
        self.nodes()
            .find(|(_, node)| node.path().as_str() == path)
            .map(|(id, _)| id)
    }

    /// Sets a parameter on a node.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: f32) -> Result<(), GraphError> {
        let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.set_param(name, value);
        Ok(())
    }

    /// Enumerates live nodes as `(id, node)` pairs in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|node| (NodeId(idx as u32), node)))
    }

    /// Returns the number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns the connection edge list.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Routes a note into a node, recording it as the node's last note.
    pub fn route_note(&mut self, id: NodeId, message: NoteMessage) -> Result<(), GraphError> {
        let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.receive_note(message);
        tracing::debug!(pitch = message.pitch, "rack_note: {id}");
        Ok(())
    }

    /// Captures the rack as a snapshot (structure + state).
    pub fn snapshot(&self) -> Result<RackSnapshot, crate::SnapshotError> {
        RackSnapshot::capture(self)
    }

    /// Removes all nodes and connections. Id assignment restarts from zero,
    /// so ids handed out before the clear are invalid afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.next_node_slot = 0;
        tracing::debug!("rack_clear");
    }
}
