use gridseq::engine::clock::{ClockListener, ClockOutputState};
use gridseq::generators::{EuclideanGenerator, NoteSequenceBuilder};
use gridseq::model::logic_sequence::GateLogic;
use gridseq::model::note_sequence::NoteLayer;
use gridseq::model::track::TrackKind;
use gridseq::model::types::MidiPort;
use gridseq::{create_midi_byte_channel, Clock, Engine, MidiParser, NullTimer, Project};
use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex};

// Ringbuffer capacity for inbound MIDI bytes
// - MIDI wire rate tops out around 3125 bytes/second (31250 baud)
// - the demo drains once per tick (~0.5ms at 120 BPM / 96 PPQN)
// - 512 bytes is >150ms of headroom at the full wire rate
const MIDI_RINGBUFFER_CAPACITY: usize = 512;

/// Collects the clock's MIDI output for the demo printout.
struct DemoClockListener {
    midi: Arc<Mutex<Vec<u8>>>,
    pulses: Arc<Mutex<u32>>,
}

impl ClockListener for DemoClockListener {
    fn on_clock_output(&mut self, state: ClockOutputState) {
        if state.pulse {
            *self.pulses.lock().unwrap() += 1;
        }
    }

    fn on_clock_midi(&mut self, message: u8) {
        self.midi.lock().unwrap().push(message);
    }
}

fn main() {
    println!("=== gridseq ===");
    println!("Offline engine demo\n");

    // Build a small demo project: a four-on-the-floor kick, a
    // euclidean snare and a logic track combining both.
    let mut project = Project::new();
    project.set_name("Demo");
    project.set_tempo(120.0);

    project.track_mut(0).set_name("Kick");
    if let TrackKind::Note(data) = project.track_mut(0).kind_mut() {
        let sequence = &mut data.sequences[0];
        sequence.set_divisor(24);
        sequence.set_first_step(0);
        sequence.set_last_step(15);
        for step in [0usize, 4, 8, 12] {
            sequence.step_mut(step).set_gate(true);
            sequence.step_mut(step).set_length(8);
        }
    }

    project.track_mut(1).set_name("Snare");
    if let TrackKind::Note(data) = project.track_mut(1).kind_mut() {
        let sequence = &mut data.sequences[0];
        sequence.set_divisor(24);
        let mut generator = EuclideanGenerator::new();
        generator.set_steps(16);
        generator.set_beats(5);
        generator.set_offset(2);
        let mut builder = NoteSequenceBuilder::new(sequence, NoteLayer::Gate);
        generator.update(&mut builder);
    }

    project.track_mut(2).set_name("Both");
    project.track_mut(2).set_kind_tag(4);
    if let TrackKind::Logic(data) = project.track_mut(2).kind_mut() {
        let sequence = &mut data.sequences[0];
        sequence.set_input_track_a(0);
        sequence.set_input_track_b(1);
        sequence.set_divisor(24);
        sequence.set_first_step(0);
        sequence.set_last_step(15);
        for step in 0..16 {
            sequence.step_mut(step).set_gate_logic(GateLogic::And);
        }
    }

    println!("Project '{}' at {} BPM", project.name(), project.tempo());

    // Wire the clock with a listener collecting its outputs
    let midi_out = Arc::new(Mutex::new(Vec::new()));
    let pulses = Arc::new(Mutex::new(0));
    let mut clock = Clock::new(Box::new(NullTimer));
    clock.set_listener(Box::new(DemoClockListener {
        midi: midi_out.clone(),
        pulses: pulses.clone(),
    }));
    clock.set_master_bpm(project.tempo());
    clock.output_configure(
        project.clock_setup().output_divisor(),
        project.clock_setup().output_pulse_us(),
    );
    clock.output_configure_swing(project.swing() as u8);

    let mut engine = Engine::new(&project);

    // The MIDI input path: bytes arrive through the per-port ring and
    // a streaming parser, exactly as they would from the UART ISR.
    let (mut midi_producer, mut midi_consumer) = create_midi_byte_channel(MIDI_RINGBUFFER_CAPACITY);
    let mut parser = MidiParser::new();
    for byte in [0xb0u8, 0x01, 0x40] {
        let _ = midi_producer.try_push(byte);
    }

    println!("Clock started (master)\n");
    clock.master_start();
    let events = clock.check_event();
    engine.handle_clock_events(&mut project, events);

    // Render two bars
    let dt = clock.tick_duration();
    let mut gate_edges = [0u32; 3];
    let mut note_events = 0;
    for _ in 0..(gridseq::config::MEASURE_TICKS * 2) {
        clock.on_timer_tick();
        while let Some(byte) = midi_consumer.try_pop() {
            if parser.feed(byte) {
                engine.receive_midi(&project, MidiPort::Midi, parser.message());
            }
        }
        while let Some(tick) = clock.check_tick() {
            let before: [bool; 3] = [engine.gate(0), engine.gate(1), engine.gate(2)];
            engine.tick(&mut project, tick, dt);
            for track in 0..3 {
                if engine.gate(track) && !before[track] {
                    gate_edges[track] += 1;
                }
            }
            note_events += engine
                .midi_events()
                .iter()
                .filter(|(_, m)| m.is_note_on())
                .count();
        }
    }
    clock.master_stop();

    println!("Rendered 2 bars at {} PPQN:", clock.ppqn());
    for track in 0..3 {
        println!(
            "  {:<8} {} gates",
            project.track(track).name(),
            gate_edges[track]
        );
    }
    println!("  {} NoteOn events on the MIDI output map", note_events);
    println!(
        "  {} MIDI clock bytes, {} output pulses",
        midi_out.lock().unwrap().len(),
        pulses.lock().unwrap()
    );

    println!("\n=== done ===");
}
