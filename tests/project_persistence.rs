// Project persistence integration tests - full save/load round trips
// through real files, across the track variant matrix and boundary
// values.

use gridseq::config::{SEQUENCE_COUNT, TRACK_COUNT};
use gridseq::model::arpeggiator::ArpMode;
use gridseq::model::curve_sequence::{CurveShape, TriggerShape};
use gridseq::model::logic_sequence::{GateLogic, NoteLogic};
use gridseq::model::note_sequence::Step;
use gridseq::model::routing::{Route, RoutingSource, RoutingTarget};
use gridseq::model::track::TrackKind;
use gridseq::model::types::{Condition, MidiPort, RunMode};
use gridseq::model::ClockMode;
use gridseq::{load_project, save_project, Project, SerializeError};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use tempfile::tempdir;

fn round_trip_through_file(project: &Project) -> Project {
    let dir = tempdir().unwrap();
    let path = dir.path().join("project.gsq");

    let mut file = File::create(&path).unwrap();
    save_project(project, &mut file).unwrap();
    file.sync_all().unwrap();

    let mut file = File::open(&path).unwrap();
    load_project(&mut file).unwrap()
}

#[test]
fn test_default_project_round_trip() {
    let project = Project::new();
    let loaded = round_trip_through_file(&project);
    assert_eq!(loaded, project);
}

#[test]
fn test_all_track_variants_round_trip() {
    let mut project = Project::new();
    project.set_name("Variant Matrix");

    // one of each variant, with variant-specific data set
    project.track_mut(0).set_kind_tag(0);
    if let TrackKind::Note(data) = project.track_mut(0).kind_mut() {
        let sequence = &mut data.sequences[3];
        sequence.set_divisor(24);
        sequence.set_run_mode(RunMode::PingPong);
        sequence.step_mut(0).set_gate(true);
        sequence.step_mut(0).set_note(-24);
        sequence.step_mut(0).set_condition(Condition::Loop2of4);
    }

    project.track_mut(1).set_kind_tag(1);
    if let TrackKind::Curve(data) = project.track_mut(1).kind_mut() {
        data.set_input_track(0);
        let sequence = &mut data.sequences[0];
        sequence.set_min(-2.5);
        sequence.set_max(2.5);
        sequence.set_trigger_shape(TriggerShape::Both);
        sequence.step_mut(5).set_shape(CurveShape::Bell);
    }

    project.track_mut(2).set_kind_tag(2);
    if let TrackKind::MidiCv(data) = project.track_mut(2).kind_mut() {
        data.port = MidiPort::Usb;
        data.channel = 7;
        data.pitch_bend_range = 12;
        data.retrigger = true;
    }

    project.track_mut(3).set_kind_tag(3);
    if let TrackKind::Stochastic(data) = project.track_mut(3).kind_mut() {
        let sequence = &mut data.sequences[0];
        sequence.set_rest_probability_2(25);
        sequence.set_rest_probability_15(80);
        sequence.set_use_loop(true);
        sequence.set_loop_first_step(8);
        sequence.set_loop_last_step(23);
        sequence.set_seed(999);
        sequence.step_mut(1).set_octave(3);
    }

    project.track_mut(4).set_kind_tag(4);
    if let TrackKind::Logic(data) = project.track_mut(4).kind_mut() {
        let sequence = &mut data.sequences[0];
        sequence.set_input_track_a(0);
        sequence.set_input_track_b(3);
        sequence.step_mut(2).set_gate_logic(GateLogic::Xor);
        sequence.step_mut(2).set_note_logic(NoteLogic::Combine);
    }

    project.track_mut(5).set_kind_tag(5);
    if let TrackKind::Arp(data) = project.track_mut(5).kind_mut() {
        data.arpeggiator.set_mode(ArpMode::Converge);
        data.arpeggiator.set_divisor(6);
        data.arpeggiator.set_octaves(2);
        data.arpeggiator.set_hold(true);
        data.midi_keyboard = true;
        data.sequences[0].step_mut(0).set_gate(true);
    }

    let loaded = round_trip_through_file(&project);
    assert_eq!(loaded, project);
    for track in 0..6 {
        assert_eq!(
            loaded.track(track).kind().tag(),
            project.track(track).kind().tag()
        );
    }
}

#[test]
fn test_boundary_values_round_trip() {
    let mut project = Project::new();
    project.set_tempo(1000.0);
    project.set_swing(75);
    project.set_slot(127);

    if let TrackKind::Note(data) = project.track_mut(0).kind_mut() {
        for pattern in 0..SEQUENCE_COUNT {
            let sequence = &mut data.sequences[pattern];
            sequence.set_divisor(192);
            let step = sequence.step_mut(0);
            step.set_note(Step::NOTE_MAX);
            step.set_gate_offset(Step::GATE_OFFSET_MIN);
            step.set_note_variation_range(Step::NOTE_VARIATION_RANGE_MIN);
            step.set_length(Step::LENGTH_MAX);
            step.set_retrigger(Step::RETRIGGER_MAX);
        }
    }
    project.track_mut(0).set_octave(-10);
    project.track_mut(0).set_transpose(100);
    project.track_mut(0).set_rotate(-64);

    let loaded = round_trip_through_file(&project);
    assert_eq!(loaded, project);
}

#[test]
fn test_full_project_state_round_trip() {
    let mut project = Project::new();
    project.set_name("Everything");
    project.set_tempo(133.7);
    project.set_swing(66);
    project.set_auto_loaded(true);

    project.clock_setup_mut().set_mode(ClockMode::Slave);
    project.clock_setup_mut().set_output_divisor(12);
    project.clock_setup_mut().set_output_swing(60);
    project.clock_setup_mut().set_slave(1, 48, false);

    *project.routing_mut().route_mut(3) = Route {
        target: RoutingTarget::CurveMax,
        tracks: 0b0101_0101,
        min: -5.0,
        max: 5.0,
        source: RoutingSource::CvIn(2),
    };

    project.user_scale_mut(2).set_name("Pelog");
    project.user_scale_mut(2).set_size(5);
    project.user_scale_mut(2).set_item(1, 1);
    project.user_scale_mut(2).set_item(2, 3);

    project.song_mut().set_name("SetList");
    project.song_mut().set_length(4);
    project.song_mut().slot_mut(1).set_pattern(2, 9);
    project.song_mut().slot_mut(1).set_repeats(16);

    project.play_state_mut().set_song_mode(true);
    project.play_state_mut().set_fill_amount(33);
    project.play_state_mut().track_mut(5).set_muted(true);
    project.play_state_mut().track_mut(6).set_pattern(11);

    for track in 0..TRACK_COUNT {
        project.track_mut(track).set_name(&format!("T{}x", track));
    }

    let loaded = round_trip_through_file(&project);
    assert_eq!(loaded, project);
}

#[test]
fn test_truncated_file_fails_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("truncated.gsq");

    let mut buffer = Vec::new();
    save_project(&Project::new(), &mut buffer).unwrap();
    buffer.truncate(buffer.len() / 2);
    std::fs::write(&path, &buffer).unwrap();

    let mut file = File::open(&path).unwrap();
    assert!(matches!(
        load_project(&mut file),
        Err(SerializeError::Io(_))
    ));
}

#[test]
fn test_corrupted_checksum_fails_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.gsq");

    let mut file = File::create(&path).unwrap();
    save_project(&Project::new(), &mut file).unwrap();

    // flip one byte in the middle of the stream
    let length = file.metadata().unwrap().len();
    file.seek(SeekFrom::Start(length / 2)).unwrap();
    file.write_all(&[0xff]).unwrap();
    file.sync_all().unwrap();

    let mut file = File::open(&path).unwrap();
    assert!(load_project(&mut file).is_err());
}

#[test]
fn test_wrong_magic_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_a_project.gsq");
    std::fs::write(&path, b"definitely not a project stream").unwrap();

    let mut file = File::open(&path).unwrap();
    assert!(matches!(
        load_project(&mut file),
        Err(SerializeError::BadMagic)
    ));
}

#[test]
fn test_failed_load_leaves_existing_project_intact() {
    let mut current = Project::new();
    current.set_name("Precious");
    current.set_tempo(140.0);

    let mut garbage = std::io::Cursor::new(vec![0u8; 64]);
    let result = load_project(&mut garbage);
    assert!(result.is_err());

    // the editing session's project was never touched
    assert_eq!(current.name(), "Precious");
    assert_eq!(current.tempo(), 140.0);
}
