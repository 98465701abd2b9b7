// Engine - per-tick orchestration
// Order within a tick is fixed: routing first, bar-boundary play-state
// and song handling, then track engines in index order, then the MIDI
// output map. Logic and curve reads of later-indexed tracks see the
// previous tick's output.

use crate::config::{CV_INPUT_COUNT, MEASURE_TICKS, MIDI_OUTPUT_COUNT, ROUTE_COUNT, TRACK_COUNT};
use crate::engine::arp_track_engine::ArpTrackEngine;
use crate::engine::clock::ClockEvents;
use crate::engine::curve_track_engine::CurveTrackEngine;
use crate::engine::logic_track_engine::LogicTrackEngine;
use crate::engine::midi_cv_track_engine::MidiCvTrackEngine;
use crate::engine::note_track_engine::NoteTrackEngine;
use crate::engine::stochastic_track_engine::StochasticTrackEngine;
use crate::engine::track_engine::{TickInfo, TrackOutput};
use crate::midi::MidiMessage;
use crate::model::midi_output::MidiOutputTarget;
use crate::model::routing::{Route, RoutingSource, RoutingTarget};
use crate::model::track::TrackKind;
use crate::model::types::{MidiPort, PlayMode, RunMode};
use crate::model::Project;

enum TrackEngineKind {
    Note(NoteTrackEngine),
    Curve(CurveTrackEngine),
    MidiCv(MidiCvTrackEngine),
    Stochastic(StochasticTrackEngine),
    Logic(LogicTrackEngine),
    Arp(ArpTrackEngine),
}

impl TrackEngineKind {
    fn for_track(index: usize, tag: u8) -> Self {
        match tag {
            1 => Self::Curve(CurveTrackEngine::new(index)),
            2 => Self::MidiCv(MidiCvTrackEngine::new()),
            3 => Self::Stochastic(StochasticTrackEngine::new(index)),
            4 => Self::Logic(LogicTrackEngine::new(index)),
            5 => Self::Arp(ArpTrackEngine::new(index)),
            _ => Self::Note(NoteTrackEngine::new(index)),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Note(_) => 0,
            Self::Curve(_) => 1,
            Self::MidiCv(_) => 2,
            Self::Stochastic(_) => 3,
            Self::Logic(_) => 4,
            Self::Arp(_) => 5,
        }
    }
}

pub struct Engine {
    track_engines: [TrackEngineKind; TRACK_COUNT],
    outputs: [TrackOutput; TRACK_COUNT],
    cv_inputs: [f32; CV_INPUT_COUNT],
    route_cc: [Option<f32>; ROUTE_COUNT],
    midi_events: Vec<(MidiPort, MidiMessage)>,
    active_notes: [Option<(MidiPort, u8, u8)>; MIDI_OUTPUT_COUNT],
    active_cc: [Option<u8>; MIDI_OUTPUT_COUNT],
    measure: u32,
    song_slot: usize,
    song_repeat: u32,
}

impl Engine {
    pub fn new(project: &Project) -> Self {
        Self {
            track_engines: std::array::from_fn(|index| {
                TrackEngineKind::for_track(index, project.track(index).kind().tag())
            }),
            outputs: [TrackOutput::default(); TRACK_COUNT],
            cv_inputs: [0.0; CV_INPUT_COUNT],
            route_cc: [None; ROUTE_COUNT],
            midi_events: Vec::with_capacity(64),
            active_notes: [None; MIDI_OUTPUT_COUNT],
            active_cc: [None; MIDI_OUTPUT_COUNT],
            measure: 0,
            song_slot: 0,
            song_repeat: 0,
        }
    }

    /// Rebuild all per-track state; called on transport start/reset.
    pub fn reset(&mut self, project: &Project) {
        self.track_engines = std::array::from_fn(|index| {
            TrackEngineKind::for_track(index, project.track(index).kind().tag())
        });
        self.outputs = [TrackOutput::default(); TRACK_COUNT];
        self.measure = 0;
        self.song_slot = 0;
        self.song_repeat = 0;
        // pending note-offs so external gear doesn't hang
        self.flush_active_notes();
    }

    /// Transport events from the clock, applied in arrival order.
    pub fn handle_clock_events(&mut self, project: &mut Project, events: ClockEvents) {
        if events.contains(ClockEvents::RESET) {
            self.reset(project);
        }
        if events.contains(ClockEvents::START) || events.contains(ClockEvents::CONTINUE) {
            project.play_state_mut().set_running(true);
        }
        if events.contains(ClockEvents::STOP) {
            project.play_state_mut().set_running(false);
            self.flush_active_notes();
        }
    }

    pub fn set_cv_input(&mut self, channel: usize, volts: f32) {
        if channel < CV_INPUT_COUNT {
            self.cv_inputs[channel] = volts.clamp(-5.0, 5.0);
        }
    }

    pub fn gate(&self, track: usize) -> bool {
        self.outputs[track.min(TRACK_COUNT - 1)].gate
    }

    pub fn cv(&self, track: usize) -> f32 {
        self.outputs[track.min(TRACK_COUNT - 1)].cv
    }

    pub fn outputs(&self) -> &[TrackOutput; TRACK_COUNT] {
        &self.outputs
    }

    /// MIDI produced by the last tick, in emission order.
    pub fn midi_events(&self) -> &[(MidiPort, MidiMessage)] {
        &self.midi_events
    }

    /// Restore a stochastic track's generator to its stored seed.
    pub fn reseed_track(&mut self, project: &Project, track: usize) {
        if track >= TRACK_COUNT {
            return;
        }
        if let (TrackEngineKind::Stochastic(engine), TrackKind::Stochastic(data)) = (
            &mut self.track_engines[track],
            project.track(track).kind(),
        ) {
            let pattern = project.play_state().track(track).pattern();
            engine.reseed(data.sequences[pattern].seed());
        }
    }

    /// Feed a parsed inbound MIDI message to the interested consumers:
    /// MIDI/CV voices, arp keyboards and routing CC latches.
    pub fn receive_midi(&mut self, project: &Project, port: MidiPort, message: &MidiMessage) {
        if message.is_control_change() {
            for (index, route) in project.routing().routes().iter().enumerate() {
                if let RoutingSource::MidiCc {
                    port: route_port,
                    channel,
                    controller,
                } = route.source
                {
                    if route_port == port
                        && (channel >= 16 || channel == message.channel())
                        && controller == message.control_number()
                    {
                        self.route_cc[index] = Some(message.control_value() as f32 / 127.0);
                    }
                }
            }
        }

        for index in 0..TRACK_COUNT {
            match (&mut self.track_engines[index], project.track(index).kind()) {
                (TrackEngineKind::MidiCv(engine), TrackKind::MidiCv(data)) => {
                    engine.receive_midi(data, port, message);
                }
                (TrackEngineKind::Arp(engine), TrackKind::Arp(data)) => {
                    engine.receive_midi(data, port, message);
                }
                _ => {}
            }
        }
    }

    /// Advance the whole engine by one sequencer tick.
    pub fn tick(&mut self, project: &mut Project, tick: u32, dt: f32) {
        self.midi_events.clear();

        if !project.play_state().running() {
            return;
        }

        self.update_routing(project);

        if tick % MEASURE_TICKS == 0 {
            self.measure = tick / MEASURE_TICKS;
            self.advance_song(project, tick);
            project.play_state_mut().apply_scheduled(self.measure);
        }

        let project = &*project;
        let play_state = project.play_state();
        let any_solo = play_state.any_soloed();
        let global_fill = play_state.fill();
        let fill_amount = play_state.fill_amount();

        for index in 0..TRACK_COUNT {
            let track = project.track(index);
            // the UI may have switched the variant since the last reset
            if self.track_engines[index].tag() != track.kind().tag() {
                self.track_engines[index] = TrackEngineKind::for_track(index, track.kind().tag());
            }

            let track_state = play_state.track(index);
            let info = TickInfo {
                tick,
                dt,
                audible: !track_state.muted() && (!any_solo || track_state.soloed()),
                fill: global_fill || track_state.fill(),
                fill_amount,
                pattern: track_state.pattern(),
            };

            let output = match (&mut self.track_engines[index], track.kind()) {
                (TrackEngineKind::Note(engine), TrackKind::Note(data)) => {
                    engine.tick(&info, project, track, data)
                }
                (TrackEngineKind::Curve(engine), TrackKind::Curve(data)) => {
                    engine.tick(&info, project, track, data, &self.outputs)
                }
                (TrackEngineKind::MidiCv(engine), TrackKind::MidiCv(data)) => {
                    engine.tick(&info, track, data)
                }
                (TrackEngineKind::Stochastic(engine), TrackKind::Stochastic(data)) => {
                    engine.tick(&info, project, track, data)
                }
                (TrackEngineKind::Logic(engine), TrackKind::Logic(data)) => {
                    engine.tick(&info, project, track, data, &self.outputs)
                }
                (TrackEngineKind::Arp(engine), TrackKind::Arp(data)) => {
                    engine.tick(&info, project, track, data)
                }
                _ => TrackOutput::default(),
            };
            self.outputs[index] = output;
        }

        self.emit_midi_outputs(project);
    }

    fn advance_song(&mut self, project: &mut Project, tick: u32) {
        if !project.play_state().song_mode() || project.song().length() == 0 {
            return;
        }

        if tick > 0 {
            self.song_repeat += 1;
            if self.song_repeat >= project.song().slot(self.song_slot).repeats() {
                self.song_repeat = 0;
                self.song_slot = (self.song_slot + 1) % project.song().length();
            }
        }

        let slot = *project.song().slot(self.song_slot);
        let play_state = project.play_state_mut();
        for track in 0..TRACK_COUNT {
            play_state.track_mut(track).set_pattern(slot.pattern(track) as i32);
        }
    }

    fn update_routing(&mut self, project: &mut Project) {
        let routes = *project.routing().routes();
        for (index, route) in routes.iter().enumerate() {
            if !route.active() {
                continue;
            }
            let raw = match route.source {
                RoutingSource::None => continue,
                RoutingSource::CvIn(channel) => {
                    (self.cv_inputs[channel as usize % CV_INPUT_COUNT] + 5.0) / 10.0
                }
                RoutingSource::TrackCv(track) => {
                    (self.outputs[track as usize % TRACK_COUNT].cv + 5.0) / 10.0
                }
                RoutingSource::MidiCc { .. } => match self.route_cc[index] {
                    Some(value) => value,
                    None => continue,
                },
            };
            let value = route.min + raw.clamp(0.0, 1.0) * (route.max - route.min);
            apply_route(project, route, value);
        }
    }

    fn emit_midi_outputs(&mut self, project: &Project) {
        for index in 0..MIDI_OUTPUT_COUNT {
            let output = project.midi_output().output(index);
            match output.target {
                MidiOutputTarget::None => {}
                MidiOutputTarget::Notes { track } => {
                    let source = self.outputs[track as usize % TRACK_COUNT];
                    let note = (60 + source.note).clamp(0, 127) as u8;
                    match (source.gate, self.active_notes[index]) {
                        (true, None) => {
                            self.midi_events.push((
                                output.port,
                                MidiMessage::note_on(output.channel, note, 100),
                            ));
                            self.active_notes[index] = Some((output.port, output.channel, note));
                        }
                        (true, Some((port, channel, active))) if active != note => {
                            self.midi_events
                                .push((port, MidiMessage::note_off(channel, active)));
                            self.midi_events.push((
                                output.port,
                                MidiMessage::note_on(output.channel, note, 100),
                            ));
                            self.active_notes[index] = Some((output.port, output.channel, note));
                        }
                        (false, Some((port, channel, active))) => {
                            self.midi_events
                                .push((port, MidiMessage::note_off(channel, active)));
                            self.active_notes[index] = None;
                        }
                        _ => {}
                    }
                }
                MidiOutputTarget::ControlChange { track, controller } => {
                    let source = self.outputs[track as usize % TRACK_COUNT];
                    let value = (((source.cv + 5.0) / 10.0 * 127.0).round()).clamp(0.0, 127.0) as u8;
                    if self.active_cc[index] != Some(value) {
                        self.midi_events.push((
                            output.port,
                            MidiMessage::control_change(output.channel, controller, value),
                        ));
                        self.active_cc[index] = Some(value);
                    }
                }
            }
        }
    }

    fn flush_active_notes(&mut self) {
        for index in 0..MIDI_OUTPUT_COUNT {
            if let Some((port, channel, note)) = self.active_notes[index].take() {
                self.midi_events
                    .push((port, MidiMessage::note_off(channel, note)));
            }
        }
    }
}

fn apply_route(project: &mut Project, route: &Route, value: f32) {
    match route.target {
        RoutingTarget::None => {}
        RoutingTarget::Tempo => project.set_tempo_routed(value),
        RoutingTarget::Swing => project.set_swing_routed(value as i32),
        RoutingTarget::Fill => project.play_state_mut().set_fill(value >= 0.5),
        RoutingTarget::FillAmount => project.play_state_mut().set_fill_amount(value as i32),
        RoutingTarget::Mute => {
            for track in track_mask(route.tracks) {
                project
                    .play_state_mut()
                    .track_mut(track)
                    .set_muted(value >= 0.5);
            }
        }
        _ => {
            for track in track_mask(route.tracks) {
                apply_track_route(project, route.target, track, value);
            }
        }
    }
}

fn apply_track_route(project: &mut Project, target: RoutingTarget, index: usize, value: f32) {
    let pattern = project.play_state().track(index).pattern();
    let track = project.track_mut(index);
    match target {
        RoutingTarget::SlideTime => track.set_slide_time_routed(value as i32),
        RoutingTarget::Octave => track.set_octave_routed(value.round() as i32),
        RoutingTarget::Transpose => track.set_transpose_routed(value.round() as i32),
        RoutingTarget::Rotate => track.set_rotate_routed(value.round() as i32),
        RoutingTarget::Divisor => {
            let divisor = value.round() as i32;
            match track.kind_mut() {
                TrackKind::Note(data) => data.sequences[pattern].set_divisor_routed(divisor),
                TrackKind::Curve(data) => data.sequences[pattern].set_divisor_routed(divisor),
                TrackKind::Stochastic(data) => data.sequences[pattern].set_divisor_routed(divisor),
                TrackKind::Logic(data) => data.sequences[pattern].set_divisor_routed(divisor),
                TrackKind::Arp(data) => data.sequences[pattern].set_divisor_routed(divisor),
                TrackKind::MidiCv(_) => {}
            }
        }
        RoutingTarget::RunMode => {
            let mode = RunMode::from_u8((value.round() as i32).clamp(0, 4) as u8);
            match track.kind_mut() {
                TrackKind::Note(data) => data.sequences[pattern].set_run_mode_routed(mode),
                TrackKind::Stochastic(data) => data.sequences[pattern].set_run_mode(mode),
                TrackKind::Logic(data) => data.sequences[pattern].set_run_mode(mode),
                TrackKind::Curve(data) => data.sequences[pattern].set_run_mode(mode),
                TrackKind::Arp(data) => data.sequences[pattern].set_run_mode(mode),
                TrackKind::MidiCv(_) => {}
            }
        }
        RoutingTarget::FirstStep => {
            let step = value.round() as i32;
            match track.kind_mut() {
                TrackKind::Note(data) => data.sequences[pattern].set_first_step(step),
                TrackKind::Stochastic(data) => data.sequences[pattern].set_first_step(step),
                TrackKind::Logic(data) => data.sequences[pattern].set_first_step(step),
                TrackKind::Curve(data) => data.sequences[pattern].set_first_step(step),
                TrackKind::Arp(data) => data.sequences[pattern].set_first_step(step),
                TrackKind::MidiCv(_) => {}
            }
        }
        RoutingTarget::LastStep => {
            let step = value.round() as i32;
            match track.kind_mut() {
                TrackKind::Note(data) => data.sequences[pattern].set_last_step(step),
                TrackKind::Stochastic(data) => data.sequences[pattern].set_last_step(step),
                TrackKind::Logic(data) => data.sequences[pattern].set_last_step(step),
                TrackKind::Curve(data) => data.sequences[pattern].set_last_step(step),
                TrackKind::Arp(data) => data.sequences[pattern].set_last_step(step),
                TrackKind::MidiCv(_) => {}
            }
        }
        RoutingTarget::CurveMin => {
            if let TrackKind::Curve(data) = track.kind_mut() {
                data.sequences[pattern].set_min_routed(value);
            }
        }
        RoutingTarget::CurveMax => {
            if let TrackKind::Curve(data) = track.kind_mut() {
                data.sequences[pattern].set_max_routed(value);
            }
        }
        RoutingTarget::CurveOffset => {
            if let TrackKind::Curve(data) = track.kind_mut() {
                data.sequences[pattern].set_offset_routed(value);
            }
        }
        _ => {}
    }
}

fn track_mask(mask: u8) -> impl Iterator<Item = usize> {
    (0..TRACK_COUNT).filter(move |track| mask & (1 << track) != 0)
}

/// Pattern scheduling helper: free tracks switch immediately, aligned
/// tracks latch to the next bar.
pub fn request_pattern(project: &mut Project, engine_measure: u32, track: usize, pattern: i32) {
    let play_mode = project.track(track).play_mode();
    match play_mode {
        PlayMode::Free => project
            .play_state_mut()
            .track_mut(track)
            .set_pattern(pattern),
        PlayMode::Aligned => {
            let pattern = pattern.clamp(0, crate::config::SEQUENCE_COUNT as i32 - 1) as u8;
            project.play_state_mut().schedule(
                engine_measure + 1,
                track,
                crate::model::play_state::TrackOp::Pattern(pattern),
            );
        }
    }
}

impl Engine {
    /// Bar counter maintained by the tick loop.
    pub fn measure(&self) -> u32 {
        self.measure
    }
}
