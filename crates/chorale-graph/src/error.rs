//! Error types for rack mutation and snapshot codec operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::node::{NodeId, NodePath};

/// Errors from rack mutation and lookup operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node already exists at this path.
    #[error("a node already exists at path '{0}'")]
    DuplicatePath(NodePath),

    /// The specified node was not found in the rack.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
}

/// Errors from the snapshot codec.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The registry has no descriptor for a node kind in the layout.
    #[error("unknown node kind '{kind}' at path '{path}'")]
    UnknownKind {
        /// Kind id the registry could not resolve.
        kind: String,
        /// Path of the node that carried the unknown kind.
        path: NodePath,
    },

    /// The layout contains two nodes with the same path.
    #[error("duplicate node path '{0}' in snapshot")]
    DuplicatePath(NodePath),

    /// A connection endpoint names a path absent from the layout.
    #[error("connection references missing node '{0}'")]
    DanglingConnection(NodePath),

    /// A state entry names a path absent from the layout.
    #[error("state entry references missing node '{0}'")]
    UnknownStatePath(NodePath),

    /// Failed to read a snapshot file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a snapshot file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
