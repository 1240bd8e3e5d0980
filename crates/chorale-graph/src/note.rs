//! Note-routing vocabulary shared by templates and per-voice clones.
//!
//! A [`NoteCable`] is a routing source with a target list: patching is
//! additive, and a cable never owns the nodes it points at. Notes travel as
//! [`NoteMessage`] values carrying pitch, intensity, the handling voice slot,
//! and per-note modulation.

use crate::node::NodeId;

/// Per-note expressive modulation delivered alongside a note event.
///
/// All fields default to neutral (zero) values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModulationParameters {
    /// Pitch bend in semitones, bipolar.
    pub pitch_bend: f32,
    /// Modulation wheel position, 0.0 to 1.0.
    pub mod_wheel: f32,
    /// Channel or poly pressure, 0.0 to 1.0.
    pub pressure: f32,
    /// Stereo pan, -1.0 (left) to 1.0 (right).
    pub pan: f32,
}

/// A note event as routed through cables into nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMessage {
    /// Event time in the host's clock domain (seconds or ticks).
    pub time: f64,
    /// MIDI-style pitch number.
    pub pitch: i32,
    /// Intensity — velocity for note-ons.
    pub amount: f32,
    /// Voice slot handling this note, when dispatched polyphonically.
    pub voice: Option<usize>,
    /// Per-note modulation.
    pub modulation: ModulationParameters,
}

/// A note-routing source: an ordered set of target nodes.
///
/// The template-side voice cable and each voice's local cable are both this
/// type. Adding a target is idempotent; the same node is never targeted
/// twice by one cable.
#[derive(Debug, Clone, Default)]
pub struct NoteCable {
    targets: Vec<NodeId>,
}

impl NoteCable {
    /// Creates an empty cable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target node. No-op if the node is already targeted.
    pub fn add_target(&mut self, node: NodeId) {
        if !self.targets.contains(&node) {
            self.targets.push(node);
        }
    }

    /// Returns the target list in patch order.
    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Returns the number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if the cable has no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_target_deduplicates() {
        let mut cable = NoteCable::new();
        cable.add_target(NodeId(3));
        cable.add_target(NodeId(1));
        cable.add_target(NodeId(3));

        assert_eq!(cable.len(), 2);
        assert_eq!(cable.targets(), &[NodeId(3), NodeId(1)]);
    }

    #[test]
    fn empty_cable_reports_empty() {
        let cable = NoteCable::new();
        assert!(cable.is_empty());
        assert_eq!(cable.len(), 0);
    }

    #[test]
    fn modulation_defaults_are_neutral() {
        let m = ModulationParameters::default();
        assert_eq!(m.pitch_bend, 0.0);
        assert_eq!(m.mod_wheel, 0.0);
        assert_eq!(m.pressure, 0.0);
        assert_eq!(m.pan, 0.0);
    }
}
