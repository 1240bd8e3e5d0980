//! The polyphonic engine: template rack, voice table, and note dispatch.
//!
//! The engine owns a template [`Rack`], a [`NodeRegistry`], a
//! [`PolyphonyScheduler`], and one optional [`VoiceInstance`] per slot.
//! Note-ons snapshot the template and reconstruct it as a private clone for
//! the assigned slot; note-offs tear the clone down. Scheduler bookkeeping
//! and voice state stay in lockstep through the receiver callbacks.

use chorale_graph::{
    GraphError, ModulationParameters, NodeId, NodeRegistry, NoteCable, NoteMessage, Rack,
};

use crate::scheduler::{PolyphonyReceiver, PolyphonyScheduler};
use crate::voice::VoiceInstance;

/// Polyphonic wrapper around a template rack.
///
/// ```
/// use chorale_graph::{NodeDescriptor, NodeRegistry, NoteMessage};
/// use chorale_poly::PolyphonicEngine;
///
/// let mut registry = NodeRegistry::new();
/// registry.register(NodeDescriptor {
///     id: "oscillator",
///     name: "Oscillator",
///     description: "Pitched tone source",
///     defaults: &[("freq", 440.0)],
/// });
///
/// let mut engine = PolyphonicEngine::new(registry, 8);
/// let osc = engine.template_mut().add_node("oscillator", "osc1").unwrap();
/// engine.connect_voice_output(osc).unwrap();
///
/// engine.play_note(NoteMessage {
///     time: 0.0,
///     pitch: 60,
///     amount: 0.8,
///     voice: None,
///     modulation: Default::default(),
/// });
/// assert_eq!(engine.active_voices(), 1);
/// ```
#[derive(Debug)]
pub struct PolyphonicEngine {
    template: Rack,
    registry: NodeRegistry,
    scheduler: PolyphonyScheduler,
    voices: Vec<Option<VoiceInstance>>,
    voice_cable: NoteCable,
    enabled: bool,
}

/// Split borrow of the engine handed to the scheduler per call.
///
/// The scheduler takes its receiver as a parameter instead of owning one, so
/// the engine can lend out the voice table while the scheduler borrows its
/// own state mutably.
struct VoiceLifecycle<'a> {
    template: &'a Rack,
    registry: &'a NodeRegistry,
    voices: &'a mut Vec<Option<VoiceInstance>>,
    cable: &'a NoteCable,
}

impl PolyphonyReceiver for VoiceLifecycle<'_> {
    fn start_voice(
        &mut self,
        voice: usize,
        time: f64,
        pitch: i32,
        amount: f32,
        modulation: ModulationParameters,
    ) {
        // A retriggered or stolen slot discards its previous clone first.
        if let Some(previous) = self.voices[voice].take() {
            previous.teardown();
        }

        let clone = match self
            .template
            .snapshot()
            .and_then(|snapshot| snapshot.instantiate(self.registry))
        {
            Ok(clone) => clone,
            Err(err) => {
                // Voice start aborts; the slot stays empty and the engine
                // keeps running on its remaining voices.
                tracing::error!(voice, %err, "voice clone failed");
                return;
            }
        };
        if clone.node_count() != self.template.node_count() {
            tracing::error!(
                voice,
                expected = self.template.node_count(),
                got = clone.node_count(),
                "voice clone structure mismatch"
            );
            return;
        }

        let mut instance = VoiceInstance::new(clone, self.template, self.cable);
        let message = NoteMessage {
            time,
            pitch,
            amount,
            voice: Some(voice),
            modulation,
        };
        if let Err(err) = instance.deliver(message) {
            tracing::error!(voice, %err, "note delivery failed");
        }
        tracing::debug!(voice, pitch, "voice_start");
        self.voices[voice] = Some(instance);
    }

    fn stop_voice(&mut self, voice: usize, _pitch: i32, _time: f64) {
        // Teardown keys off the slot index alone; the pitch argument carries
        // the already-cleared sentinel.
        if let Some(instance) = self.voices[voice].take() {
            instance.teardown();
            tracing::debug!(voice, "voice_stop");
        }
    }
}

impl PolyphonicEngine {
    /// Creates an engine with `capacity` voice slots over an empty template.
    pub fn new(registry: NodeRegistry, capacity: usize) -> Self {
        let scheduler = PolyphonyScheduler::new(capacity);
        let voices = (0..scheduler.capacity()).map(|_| None).collect();
        Self {
            template: Rack::new(),
            registry,
            scheduler,
            voices,
            voice_cable: NoteCable::new(),
            enabled: true,
        }
    }

    /// Creates an engine from a validated configuration.
    pub fn with_config(registry: NodeRegistry, config: &crate::PolyConfig) -> Self {
        let mut engine = Self::new(registry, config.voices);
        engine.set_stealing(config.allow_stealing);
        if let Some(limit) = config.voice_limit {
            engine.set_voice_limit(limit);
        }
        engine
    }

    /// The template rack.
    pub fn template(&self) -> &Rack {
        &self.template
    }

    /// Mutable access to the template rack for patching.
    ///
    /// Edits affect future voice starts only; live clones are private.
    pub fn template_mut(&mut self) -> &mut Rack {
        &mut self.template
    }

    /// The node registry clones are instantiated against.
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The scheduler's slot bookkeeping.
    pub fn scheduler(&self) -> &PolyphonyScheduler {
        &self.scheduler
    }

    /// Adds a template node to the voice output cable.
    ///
    /// Notes entering the engine are delivered to each cable target's
    /// counterpart inside the assigned voice's clone. Patching is additive
    /// and idempotent.
    pub fn connect_voice_output(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.template
            .node(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        self.voice_cable.add_target(node);
        tracing::debug!(node = %node, "voice_output_connect");
        Ok(())
    }

    /// The template-side voice output cable.
    pub fn voice_cable(&self) -> &NoteCable {
        &self.voice_cable
    }

    /// Handles one note event.
    ///
    /// A positive `amount` is a note-on and allocates (or steals) a voice; a
    /// zero `amount` is a note-off and releases the oldest matching voice.
    /// `message.voice` forces a specific slot. Disabled engines drop note
    /// events entirely.
    pub fn play_note(&mut self, message: NoteMessage) {
        if !self.enabled {
            return;
        }

        if message.amount > 0.0 {
            self.start(
                message.time,
                message.pitch,
                message.amount,
                message.voice,
                message.modulation,
            );
        } else {
            self.stop(message.time, message.pitch, message.voice);
        }
    }

    /// Splits the engine into the scheduler and the lifecycle state it
    /// dispatches into.
    fn lifecycle(&mut self) -> (&mut PolyphonyScheduler, VoiceLifecycle<'_>) {
        let Self {
            template,
            registry,
            scheduler,
            voices,
            voice_cable,
            ..
        } = self;
        (
            scheduler,
            VoiceLifecycle {
                template,
                registry,
                voices,
                cable: voice_cable,
            },
        )
    }

    /// Starts a voice for a note-on, cloning the template into the assigned
    /// slot.
    pub fn start(
        &mut self,
        time: f64,
        pitch: i32,
        amount: f32,
        voice: Option<usize>,
        modulation: ModulationParameters,
    ) {
        let (scheduler, mut lifecycle) = self.lifecycle();
        scheduler.start(&mut lifecycle, time, pitch, amount, voice, modulation);
    }

    /// Releases the oldest voice holding `pitch` (or the explicit slot) and
    /// tears its clone down.
    pub fn stop(&mut self, time: f64, pitch: i32, voice: Option<usize>) {
        let (scheduler, mut lifecycle) = self.lifecycle();
        scheduler.stop(&mut lifecycle, time, pitch, voice);
    }

    /// Releases every sounding voice.
    pub fn kill_all(&mut self) {
        let (scheduler, mut lifecycle) = self.lifecycle();
        scheduler.kill_all(&mut lifecycle);
    }

    /// Broadcasts channel pressure to every live voice.
    ///
    /// The value lands as the `pressure` parameter on each voice's cable
    /// target nodes. Voice-addressed pressure is not distinguished; the
    /// whole table hears it.
    pub fn send_pressure(&mut self, value: f32) {
        self.broadcast_param("pressure", value);
    }

    /// Broadcasts a control change to every live voice as a `cc<N>`
    /// parameter on each voice's cable target nodes.
    pub fn send_cc(&mut self, control: u8, value: f32) {
        self.broadcast_param(&format!("cc{control}"), value);
    }

    fn broadcast_param(&mut self, name: &str, value: f32) {
        for instance in self.voices.iter_mut().flatten() {
            if let Err(err) = instance.set_target_param(name, value) {
                tracing::error!(%err, "broadcast failed");
            }
        }
    }

    /// Returns whether the engine is accepting notes.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the engine. Disabling releases every voice.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.kill_all();
        }
        self.enabled = enabled;
    }

    /// Throttles allocation to the first `limit` slots.
    pub fn set_voice_limit(&mut self, limit: usize) {
        self.scheduler.set_voice_limit(limit);
    }

    /// Enables or disables voice stealing.
    pub fn set_stealing(&mut self, allow: bool) {
        self.scheduler.set_stealing(allow);
    }

    /// Returns the voice occupying a slot, if any.
    pub fn voice(&self, slot: usize) -> Option<&VoiceInstance> {
        self.voices.get(slot)?.as_ref()
    }

    /// Returns the number of slots currently holding a clone.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|slot| slot.is_some()).count()
    }

    /// One line of slot state per voice, for debug display.
    pub fn debug_lines(&self) -> Vec<String> {
        self.scheduler.debug_lines()
    }
}
