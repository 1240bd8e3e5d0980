//! Voice allocation and per-voice graph cloning.
//!
//! chorale-poly turns a single template [`Rack`](chorale_graph::Rack) into a
//! polyphonic instrument. A fixed-capacity [`PolyphonyScheduler`] assigns
//! note events to voice slots (round-robin with oldest-voice stealing), and
//! a [`PolyphonicEngine`] gives each assigned slot its own private clone of
//! the template, reconstructed through the snapshot codec so clones share no
//! state with the template or each other.
//!
//! ```
//! use chorale_graph::{NodeDescriptor, NodeRegistry, NoteMessage};
//! use chorale_poly::{PolyConfig, PolyphonicEngine};
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(NodeDescriptor {
//!     id: "oscillator",
//!     name: "Oscillator",
//!     description: "Pitched tone source",
//!     defaults: &[("freq", 440.0)],
//! });
//!
//! let config = PolyConfig { voices: 8, ..Default::default() };
//! let mut engine = PolyphonicEngine::with_config(registry, &config);
//! let osc = engine.template_mut().add_node("oscillator", "osc1").unwrap();
//! engine.connect_voice_output(osc).unwrap();
//!
//! for (i, pitch) in [60, 64, 67].into_iter().enumerate() {
//!     engine.play_note(NoteMessage {
//!         time: i as f64,
//!         pitch,
//!         amount: 0.8,
//!         voice: None,
//!         modulation: Default::default(),
//!     });
//! }
//! assert_eq!(engine.active_voices(), 3);
//! ```

pub mod config;
pub mod engine;
pub mod scheduler;
pub mod voice;

pub use config::{ConfigError, PolyConfig};
pub use engine::PolyphonicEngine;
pub use scheduler::{MAX_VOICES, PITCH_FREE, PolyphonyReceiver, PolyphonyScheduler, SlotInfo};
pub use voice::VoiceInstance;
