//! Node-kind registry — the instantiation authority for the snapshot codec.
//!
//! The registry maps kind ids to descriptors carrying display metadata and
//! default parameter values. Deserializing a snapshot consults the registry
//! for every node in the layout; an unregistered kind fails the restore.

/// Describes a node kind available for instantiation.
#[derive(Debug, Clone, Copy)]
pub struct NodeDescriptor {
    /// Unique kind id (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the node kind.
    pub description: &'static str,
    /// Parameter names with default values, applied before snapshot state.
    pub defaults: &'static [(&'static str, f32)],
}

/// Registry of node kinds the host has made available.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    descriptors: Vec<NodeDescriptor>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node kind. A later registration with the same id wins.
    pub fn register(&mut self, descriptor: NodeDescriptor) {
        self.descriptors.retain(|d| d.id != descriptor.id);
        self.descriptors.push(descriptor);
    }

    /// Looks up a descriptor by kind id.
    pub fn descriptor(&self, id: &str) -> Option<&NodeDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Iterates over all registered descriptors.
    pub fn all(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.descriptors.iter()
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSC: NodeDescriptor = NodeDescriptor {
        id: "oscillator",
        name: "Oscillator",
        description: "Pitched tone source",
        defaults: &[("freq", 440.0)],
    };

    #[test]
    fn register_and_lookup() {
        let mut registry = NodeRegistry::new();
        assert!(registry.is_empty());

        registry.register(OSC);
        assert_eq!(registry.len(), 1);

        let desc = registry.descriptor("oscillator").unwrap();
        assert_eq!(desc.name, "Oscillator");
        assert!(registry.descriptor("reverb").is_none());
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = NodeRegistry::new();
        registry.register(OSC);
        registry.register(NodeDescriptor {
            description: "Wavetable tone source",
            ..OSC
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.descriptor("oscillator").unwrap().description,
            "Wavetable tone source"
        );
    }
}
