//! Node-graph container and snapshot codec for the chorale polyphony engine.
//!
//! A [`Rack`] is an editable container of processing nodes: an arena of
//! [`Node`]s addressed by stable string paths, plus an explicit list of
//! [`Connection`]s between them. The rack never interprets what a node
//! *does* — node behavior lives with the host — it only tracks identity,
//! parameters, topology, and note routing.
//!
//! # Architecture
//!
//! - [`Rack`] — owned by the control thread. Holds topology (nodes, edges)
//!   and mutable node state (parameter maps). Mutations happen here.
//! - [`RackSnapshot`] — an inert capture of a rack, split into structural
//!   layout (paths, kinds, connections) and mutable state (parameters).
//!   Reconstruction runs in two phases: build the topology, then apply the
//!   state onto the freshly built nodes.
//! - [`NodeRegistry`] — the instantiation authority: kind ids mapped to
//!   descriptors with default parameters. Snapshots containing a kind the
//!   registry doesn't know fail to instantiate.
//!
//! Connections are a plain edge list over arena indices, so feedback cycles
//! are legal and cloning a rack never needs to traverse anything.
//!
//! # Example
//!
//! ```rust
//! use chorale_graph::{NodeDescriptor, NodeRegistry, Rack, RackSnapshot};
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(NodeDescriptor {
//!     id: "oscillator",
//!     name: "Oscillator",
//!     description: "Pitched tone source",
//!     defaults: &[("freq", 440.0), ("gain", 1.0)],
//! });
//!
//! let mut rack = Rack::new();
//! let osc = rack.add_node("oscillator", "osc1").unwrap();
//! rack.set_param(osc, "freq", 220.0).unwrap();
//!
//! let snapshot = rack.snapshot().unwrap();
//! let clone = snapshot.instantiate(&registry).unwrap();
//! assert_eq!(clone.node_count(), rack.node_count());
//! ```

pub mod error;
pub mod node;
pub mod note;
pub mod rack;
pub mod registry;
pub mod snapshot;

pub use error::{GraphError, SnapshotError};
pub use node::{Node, NodeId, NodePath};
pub use note::{ModulationParameters, NoteCable, NoteMessage};
pub use rack::{Connection, Rack};
pub use registry::{NodeDescriptor, NodeRegistry};
pub use snapshot::{ConnectionSpec, NodeSpec, NodeState, RackLayout, RackSnapshot, RackState};
