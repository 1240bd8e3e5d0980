//! Integration tests for the polyphonic engine.
//!
//! Exercises the full note-on path — snapshot, reconstruct, identity map,
//! cable remap, delivery — against a realistic multi-node patch, plus voice
//! stealing, broadcast expression, and config-driven construction.

use chorale_graph::{NodeDescriptor, NodeId, NodeRegistry, NoteMessage, Rack};
use chorale_poly::{PolyConfig, PolyphonicEngine};
use tempfile::TempDir;

fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(NodeDescriptor {
        id: "oscillator",
        name: "Oscillator",
        description: "Pitched tone source",
        defaults: &[("freq", 440.0), ("gain", 1.0)],
    });
    registry.register(NodeDescriptor {
        id: "filter",
        name: "Filter",
        description: "Tone shaper",
        defaults: &[("cutoff", 1000.0)],
    });
    registry.register(NodeDescriptor {
        id: "out",
        name: "Output",
        description: "Voice output sink",
        defaults: &[],
    });
    registry
}

/// osc → filter → out, with the osc as the voice output target.
fn build_patch(template: &mut Rack) -> (NodeId, NodeId, NodeId) {
    let osc = template.add_node("oscillator", "osc1").unwrap();
    let filt = template.add_node("filter", "filt1").unwrap();
    let out = template.add_node("out", "out").unwrap();
    template.connect(osc, filt).unwrap();
    template.connect(filt, out).unwrap();
    template.set_param(osc, "freq", 220.0).unwrap();
    template.set_param(filt, "cutoff", 800.0).unwrap();
    (osc, filt, out)
}

fn engine(capacity: usize) -> (PolyphonicEngine, NodeId) {
    let mut engine = PolyphonicEngine::new(registry(), capacity);
    let (osc, _, _) = build_patch(engine.template_mut());
    engine.connect_voice_output(osc).unwrap();
    (engine, osc)
}

fn note_on(pitch: i32, time: f64) -> NoteMessage {
    NoteMessage {
        time,
        pitch,
        amount: 0.8,
        voice: None,
        modulation: Default::default(),
    }
}

fn note_off(pitch: i32, time: f64) -> NoteMessage {
    NoteMessage {
        amount: 0.0,
        ..note_on(pitch, time)
    }
}

#[test]
fn voice_clone_matches_template_structure_and_state() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));

    let voice = engine.voice(0).expect("slot 0 holds the voice");
    assert_eq!(voice.rack().node_count(), 3);
    assert_eq!(voice.rack().connections().len(), 2);

    let clone_osc = voice.clone_of(osc).unwrap();
    let node = voice.rack().node(clone_osc).unwrap();
    assert_eq!(node.param("freq"), Some(220.0));
    // Registry default fills the untouched parameter.
    assert_eq!(node.param("gain"), Some(1.0));
}

#[test]
fn identity_map_covers_every_template_node() {
    let (mut engine, _) = engine(4);
    engine.play_note(note_on(60, 0.0));

    let template_ids: Vec<NodeId> = engine.template().nodes().map(|(id, _)| id).collect();
    let voice = engine.voice(0).unwrap();
    for id in template_ids {
        let clone_id = voice.clone_of(id).expect("every template node maps");
        let template_path = engine.template().node(id).unwrap().path().clone();
        assert_eq!(voice.rack().node(clone_id).unwrap().path(), &template_path);
    }
}

#[test]
fn note_lands_in_the_clone_not_the_template() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(67, 2.5));

    let voice = engine.voice(0).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    let delivered = voice.rack().node(clone_osc).unwrap().last_note().unwrap();
    assert_eq!(delivered.pitch, 67);
    assert_eq!(delivered.time, 2.5);
    assert_eq!(delivered.voice, Some(0));

    assert!(engine.template().node(osc).unwrap().last_note().is_none());
}

#[test]
fn chord_voices_are_mutually_independent() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));
    engine.play_note(note_on(64, 1.0));

    let pitch_in = |slot: usize| {
        let voice = engine.voice(slot).unwrap();
        let id = voice.clone_of(osc).unwrap();
        voice.rack().node(id).unwrap().last_note().unwrap().pitch
    };
    assert_eq!(pitch_in(0), 60);
    assert_eq!(pitch_in(1), 64);
}

#[test]
fn template_edits_do_not_reach_live_voices() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));

    engine.template_mut().set_param(osc, "freq", 55.0).unwrap();

    let voice = engine.voice(0).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    assert_eq!(voice.rack().node(clone_osc).unwrap().param("freq"), Some(220.0));

    // But the next voice start picks the edit up.
    engine.play_note(note_on(64, 1.0));
    let voice = engine.voice(1).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    assert_eq!(voice.rack().node(clone_osc).unwrap().param("freq"), Some(55.0));
}

#[test]
fn stealing_replaces_the_oldest_clone() {
    let (mut engine, osc) = engine(2);
    engine.play_note(note_on(60, 0.0));
    engine.play_note(note_on(64, 1.0));
    assert_eq!(engine.active_voices(), 2);

    engine.play_note(note_on(72, 2.0));
    assert_eq!(engine.active_voices(), 2);

    let voice = engine.voice(0).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    assert_eq!(voice.rack().node(clone_osc).unwrap().last_note().unwrap().pitch, 72);
}

#[test]
fn explicit_slot_retrigger_replaces_the_instance() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));

    engine.play_note(NoteMessage {
        voice: Some(0),
        ..note_on(72, 1.0)
    });

    assert_eq!(engine.active_voices(), 1);
    let voice = engine.voice(0).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    assert_eq!(voice.rack().node(clone_osc).unwrap().last_note().unwrap().pitch, 72);
}

#[test]
fn kill_all_clears_scheduler_and_voice_table() {
    let (mut engine, _) = engine(4);
    for (i, pitch) in [60, 64, 67].into_iter().enumerate() {
        engine.play_note(note_on(pitch, i as f64));
    }

    engine.kill_all();
    assert_eq!(engine.active_voices(), 0);
    assert_eq!(engine.scheduler().active_count(), 0);
}

#[test]
fn pressure_broadcast_reaches_all_live_voices() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));
    engine.play_note(note_on(64, 1.0));

    engine.send_pressure(0.6);

    for slot in 0..2 {
        let voice = engine.voice(slot).unwrap();
        let clone_osc = voice.clone_of(osc).unwrap();
        assert_eq!(voice.rack().node(clone_osc).unwrap().param("pressure"), Some(0.6));
    }
    // The template never hears expression.
    assert_eq!(engine.template().node(osc).unwrap().param("pressure"), None);
}

#[test]
fn cc_broadcast_uses_numbered_parameter() {
    let (mut engine, osc) = engine(4);
    engine.play_note(note_on(60, 0.0));

    engine.send_cc(74, 0.25);

    let voice = engine.voice(0).unwrap();
    let clone_osc = voice.clone_of(osc).unwrap();
    assert_eq!(voice.rack().node(clone_osc).unwrap().param("cc74"), Some(0.25));
}

#[test]
fn voice_limit_throttles_without_dropping_existing_clones() {
    let (mut engine, _) = engine(4);
    for (i, pitch) in [60, 62, 64, 65].into_iter().enumerate() {
        engine.play_note(note_on(pitch, i as f64));
    }
    assert_eq!(engine.active_voices(), 4);

    engine.set_voice_limit(2);
    // New allocations stay within the window; slots 2 and 3 keep sounding
    // until released.
    engine.play_note(note_off(64, 5.0));
    engine.play_note(note_on(70, 6.0));
    assert!(engine.scheduler().slots()[0].pitch == 70 || engine.scheduler().slots()[1].pitch == 70);
}

#[test]
fn config_file_drives_engine_construction() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poly.toml");
    std::fs::write(&path, "voices = 3\nallow_stealing = false\n").unwrap();

    let config = PolyConfig::load(&path).unwrap();
    let mut engine = PolyphonicEngine::with_config(registry(), &config);
    let (osc, _, _) = build_patch(engine.template_mut());
    engine.connect_voice_output(osc).unwrap();

    assert_eq!(engine.scheduler().capacity(), 3);
    for (i, pitch) in [60, 62, 64].into_iter().enumerate() {
        engine.play_note(note_on(pitch, i as f64));
    }
    // Full table with stealing off: the fourth note is dropped.
    engine.play_note(note_on(70, 3.0));
    let pitches: Vec<i32> = engine.scheduler().slots().iter().map(|s| s.pitch).collect();
    assert_eq!(pitches, vec![60, 62, 64]);
}
