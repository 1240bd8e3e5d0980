//! Per-voice graph clones.
//!
//! Each sounding voice owns a private [`Rack`] reconstructed from the
//! template's snapshot, plus a local note cable whose targets live in the
//! clone. The identity map ties clone nodes back to their template
//! counterparts by path, so template-side patching can be mirrored into
//! clones without the two racks sharing any state.

use std::collections::BTreeMap;

use chorale_graph::{GraphError, NodeId, NoteCable, NoteMessage, Rack};

/// One live voice: a private rack clone and its local note routing.
#[derive(Debug)]
pub struct VoiceInstance {
    rack: Rack,
    /// Template node id → clone node id, resolved by path.
    node_map: BTreeMap<NodeId, NodeId>,
    cable: NoteCable,
}

impl VoiceInstance {
    /// Builds a voice from a freshly instantiated clone.
    ///
    /// The identity map is resolved by node path: every clone node is looked
    /// up in the template, and pairs that cannot be resolved (or resolve to
    /// an already-claimed template node) are logged and skipped rather than
    /// failing the voice.
    pub(crate) fn new(clone: Rack, template: &Rack, template_cable: &NoteCable) -> Self {
        let mut node_map = BTreeMap::new();
        for (clone_id, node) in clone.nodes() {
            match template.find_node(node.path()) {
                Some(template_id) => {
                    if node_map.insert(template_id, clone_id).is_some() {
                        tracing::warn!(path = %node.path(), "duplicate path in identity map");
                    }
                }
                None => {
                    tracing::warn!(path = %node.path(), "clone node has no template counterpart");
                }
            }
        }

        // Additive remap: the template cable's targets, translated into the
        // clone. The template cable itself is never touched.
        let mut cable = NoteCable::new();
        for &target in template_cable.targets() {
            match node_map.get(&target) {
                Some(&clone_id) => cable.add_target(clone_id),
                None => {
                    tracing::warn!(node = %target, "cable target missing from identity map");
                }
            }
        }

        Self {
            rack: clone,
            node_map,
            cable,
        }
    }

    /// The voice's private rack.
    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    /// The voice's local note cable.
    pub fn cable(&self) -> &NoteCable {
        &self.cable
    }

    /// Resolves a template node to its counterpart in this voice's clone.
    pub fn clone_of(&self, template_node: NodeId) -> Option<NodeId> {
        self.node_map.get(&template_node).copied()
    }

    /// Routes a note into every cable target in this voice's clone.
    pub(crate) fn deliver(&mut self, message: NoteMessage) -> Result<(), GraphError> {
        let Self { rack, cable, .. } = self;
        for &target in cable.targets() {
            rack.route_note(target, message)?;
        }
        Ok(())
    }

    /// Sets a parameter on every cable target node.
    pub(crate) fn set_target_param(&mut self, name: &str, value: f32) -> Result<(), GraphError> {
        let Self { rack, cable, .. } = self;
        for &target in cable.targets() {
            rack.set_param(target, name, value)?;
        }
        Ok(())
    }

    /// Tears the voice down, clearing the private rack.
    pub(crate) fn teardown(mut self) {
        self.rack.clear();
    }
}
