// Arp track engine - traverses a held-note set (from the MIDI keyboard
// or from the sequence's gated steps) while the sequence supplies the
// per-step articulation.

use crate::config::HELD_NOTE_COUNT;
use crate::engine::note_track_engine::{effective_pattern, relative_tick};
use crate::engine::rng::Rng;
use crate::engine::track_engine::{
    biased, probability, rotated, schedule_gate, slide_toward, GateQueue, StepCursor, TickInfo,
    TrackOutput,
};
use crate::midi::MidiMessage;
use crate::model::arp_sequence::ArpSequence;
use crate::model::arpeggiator::ArpMode;
use crate::model::track::{ArpTrackData, Track};
use crate::model::types::{ConditionState, MidiPort};
use crate::model::Project;

pub struct ArpTrackEngine {
    rng: Rng,
    cursor: StepCursor,
    gate_queue: GateQueue,
    gate: bool,
    cv_current: f32,
    cv_target: f32,
    slide_active: bool,
    note: i32,
    last_played: bool,
    held: [i32; HELD_NOTE_COUNT],
    held_len: usize,
    traversal_index: u32,
    octave_position: i32,
}

impl ArpTrackEngine {
    pub fn new(track_index: usize) -> Self {
        Self {
            rng: Rng::with_seed(track_index as u32 + 1),
            cursor: StepCursor::new(),
            gate_queue: GateQueue::new(),
            gate: false,
            cv_current: 0.0,
            cv_target: 0.0,
            slide_active: false,
            note: 0,
            last_played: false,
            held: [0; HELD_NOTE_COUNT],
            held_len: 0,
            traversal_index: 0,
            octave_position: 0,
        }
    }

    pub fn reset(&mut self, track_index: usize) {
        *self = Self::new(track_index);
    }

    /// Keyboard feed for the held-note set, active only when the track
    /// has MIDI keyboard input enabled.
    pub fn receive_midi(&mut self, data: &ArpTrackData, _port: MidiPort, message: &MidiMessage) {
        if !data.midi_keyboard || !message.is_channel_message() {
            return;
        }
        let mut message = *message;
        message.fix_fake_note_off();

        if message.is_note_on() {
            let note = message.note() as i32 - 60;
            if !self.held[..self.held_len].contains(&note) {
                if self.held_len == HELD_NOTE_COUNT {
                    self.held.copy_within(1.., 0);
                    self.held_len -= 1;
                }
                self.held[self.held_len] = note;
                self.held_len += 1;
            }
        } else if message.is_note_off() && !data.arpeggiator.hold() {
            let note = message.note() as i32 - 60;
            if let Some(position) = self.held[..self.held_len].iter().position(|&n| n == note) {
                self.held.copy_within(position + 1.., position);
                self.held_len -= 1;
            }
        }
    }

    pub fn clear_held_notes(&mut self) {
        self.held_len = 0;
    }

    pub fn tick(
        &mut self,
        info: &TickInfo,
        project: &Project,
        track: &Track,
        data: &ArpTrackData,
    ) -> TrackOutput {
        let pattern = effective_pattern(info, track);
        let sequence = &data.sequences[pattern];
        let divisor = data.arpeggiator.divisor().max(1);

        let relative = relative_tick(info.tick, sequence.reset_measure());
        if relative % divisor == 0 {
            if relative == 0 {
                self.cursor.reset();
                self.traversal_index = 0;
                self.octave_position = 0;
            }
            self.evaluate_step(info, project, track, data, sequence, divisor);
        }

        while let Some(gate) = self.gate_queue.pop_due(info.tick) {
            self.gate = gate;
        }

        self.cv_current = if self.slide_active {
            slide_toward(self.cv_current, self.cv_target, track.slide_time(), info.dt)
        } else {
            self.cv_target
        };

        TrackOutput {
            gate: self.gate,
            cv: self.cv_current,
            note: self.note,
        }
    }

    fn evaluate_step(
        &mut self,
        info: &TickInfo,
        project: &Project,
        track: &Track,
        data: &ArpTrackData,
        sequence: &ArpSequence,
        divisor: u32,
    ) {
        let first = sequence.first_step();
        let last = sequence.last_step();
        let raw = self
            .cursor
            .advance(sequence.run_mode(), first, last, &mut self.rng);
        let step_index = rotated(raw, track.rotate(), first, last);
        let step = sequence.step(step_index);

        // the note pool: live keyboard notes or the gated steps
        let mut pool = [0i32; HELD_NOTE_COUNT];
        let pool_len = if data.midi_keyboard {
            pool[..self.held_len].copy_from_slice(&self.held[..self.held_len]);
            self.held_len
        } else {
            let mut len = 0;
            for index in first..=last {
                let candidate = sequence.step(index);
                if candidate.gate() && len < HELD_NOTE_COUNT {
                    pool[len] = candidate.note();
                    len += 1;
                }
            }
            len
        };

        let condition_state = ConditionState {
            fill: info.fill,
            pre: self.last_played,
            iteration: self.cursor.iteration(),
        };
        let condition_ok = step.condition().evaluate(&condition_state);

        if pool_len == 0 {
            self.last_played = false;
            return;
        }

        let mode = data.arpeggiator.mode();
        self.advance_octave(data.arpeggiator.octaves(), cycle_length(mode, pool_len));
        let pool_note = self.traverse(mode, &pool[..pool_len]);

        let fires = info.audible
            && condition_ok
            && self.rng.coin(probability(biased(
                step.gate_probability(),
                track.gate_probability_bias(),
            )));
        self.last_played = fires;
        if !fires {
            return;
        }

        let semitones = if data.midi_keyboard || step.bypass_scale() {
            sequence.root_note() + pool_note
        } else {
            project.scale_note_to_semitone(sequence.scale(), sequence.root_note() + pool_note)
        };
        self.note =
            semitones + 12 * (track.octave() + self.octave_position) + track.transpose();
        self.cv_target = self.note as f32 / 12.0;
        self.slide_active = step.slide();

        let length = biased(step.length(), track.length_bias());
        let length_ticks = ((length.clamp(0, 15) as u32 * divisor) / 16).max(1);
        schedule_gate(&mut self.gate_queue, info.tick, length_ticks, 0);
    }

    /// Pick the next pool note for the traversal mode and advance the
    /// traversal position.
    fn traverse(&mut self, mode: ArpMode, pool: &[i32]) -> i32 {
        let len = pool.len();
        let mut sorted = [0i32; HELD_NOTE_COUNT];
        sorted[..len].copy_from_slice(pool);
        sorted[..len].sort_unstable();
        let sorted = &sorted[..len];

        let position = self.traversal_index as usize;
        self.traversal_index += 1;

        match mode {
            ArpMode::Up => sorted[position % len],
            ArpMode::Down => sorted[len - 1 - position % len],
            ArpMode::UpDown => {
                let cycle = (2 * len).saturating_sub(2).max(1);
                let p = position % cycle;
                if p < len {
                    sorted[p]
                } else {
                    sorted[cycle - p]
                }
            }
            ArpMode::DownUp => {
                let cycle = (2 * len).saturating_sub(2).max(1);
                let p = position % cycle;
                if p < len {
                    sorted[len - 1 - p]
                } else {
                    sorted[p - len + 1]
                }
            }
            ArpMode::Converge => {
                let p = position % len;
                if p % 2 == 0 {
                    sorted[p / 2]
                } else {
                    sorted[len - 1 - p / 2]
                }
            }
            ArpMode::Diverge => {
                let p = position % len;
                if p % 2 == 0 {
                    sorted[(len - 1) / 2 - p / 2]
                } else {
                    sorted[(len + 1) / 2 + p / 2]
                }
            }
            ArpMode::Random => sorted[self.rng.next_range(len as u32) as usize],
            ArpMode::AsPlayed => pool[position % len],
        }
    }

    /// Walk octaves when a full traversal cycle completed.
    fn advance_octave(&mut self, octaves: i32, cycle: u32) {
        if octaves == 0 {
            self.octave_position = 0;
            return;
        }
        if self.traversal_index > 0 && self.traversal_index % cycle == 0 {
            let span = octaves.abs() + 1;
            let next = (self.octave_position.abs() + 1) % span;
            self.octave_position = if octaves > 0 { next } else { -next };
        }
    }
}

/// Steps per full traversal of a pool in the given mode.
fn cycle_length(mode: ArpMode, pool_len: usize) -> u32 {
    match mode {
        ArpMode::UpDown | ArpMode::DownUp => (2 * pool_len).saturating_sub(2).max(1) as u32,
        _ => pool_len.max(1) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::TrackKind;

    fn arp_project(mode: ArpMode) -> Project {
        let mut project = Project::new();
        project.track_mut(0).set_kind_tag(5);
        if let TrackKind::Arp(data) = project.track_mut(0).kind_mut() {
            data.arpeggiator.set_mode(mode);
            data.arpeggiator.set_divisor(12);
            let sequence = &mut data.sequences[0];
            sequence.set_first_step(0);
            sequence.set_last_step(7);
            // a minor triad as the note pool
            for (step, note) in [(0usize, 0), (1, 3), (2, 7)] {
                sequence.step_mut(step).set_gate(true);
                sequence.step_mut(step).set_note(note);
            }
        }
        project
    }

    fn info(tick: u32) -> TickInfo {
        TickInfo {
            tick,
            dt: 60.0 / (120.0 * 96.0),
            audible: true,
            fill: false,
            fill_amount: 100,
            pattern: 0,
        }
    }

    fn collect_notes(project: &Project, steps: usize) -> Vec<i32> {
        let mut engine = ArpTrackEngine::new(0);
        let track = project.track(0);
        let TrackKind::Arp(data) = track.kind() else {
            panic!("expected arp track");
        };
        let mut notes = Vec::new();
        for step in 0..steps {
            for sub in 0..12u32 {
                let tick = step as u32 * 12 + sub;
                let out = engine.tick(&info(tick), project, track, data);
                if sub == 0 {
                    notes.push(out.note);
                }
            }
        }
        notes
    }

    #[test]
    fn test_up_traversal() {
        let project = arp_project(ArpMode::Up);
        assert_eq!(collect_notes(&project, 6), vec![0, 3, 7, 0, 3, 7]);
    }

    #[test]
    fn test_down_traversal() {
        let project = arp_project(ArpMode::Down);
        assert_eq!(collect_notes(&project, 6), vec![7, 3, 0, 7, 3, 0]);
    }

    #[test]
    fn test_up_down_traversal() {
        let project = arp_project(ArpMode::UpDown);
        // endpoints are not repeated: 0 3 7 3 0 3 7 ...
        assert_eq!(collect_notes(&project, 8), vec![0, 3, 7, 3, 0, 3, 7, 3]);
    }

    #[test]
    fn test_converge_traversal() {
        let project = arp_project(ArpMode::Converge);
        // outside-in: low, high, middle
        assert_eq!(collect_notes(&project, 6), vec![0, 7, 3, 0, 7, 3]);
    }

    #[test]
    fn test_octave_walk() {
        let mut project = arp_project(ArpMode::Up);
        if let TrackKind::Arp(data) = project.track_mut(0).kind_mut() {
            data.arpeggiator.set_octaves(1);
        }
        // second traversal plays an octave up
        assert_eq!(
            collect_notes(&project, 9),
            vec![0, 3, 7, 12, 15, 19, 0, 3, 7]
        );
    }

    #[test]
    fn test_empty_pool_is_silent() {
        let mut project = arp_project(ArpMode::Up);
        if let TrackKind::Arp(data) = project.track_mut(0).kind_mut() {
            for step in 0..8 {
                data.sequences[0].step_mut(step).set_gate(false);
            }
        }
        let mut engine = ArpTrackEngine::new(0);
        let track = project.track(0);
        let TrackKind::Arp(data) = track.kind() else {
            panic!()
        };
        for tick in 0..48 {
            assert!(!engine.tick(&info(tick), &project, track, data).gate);
        }
    }

    #[test]
    fn test_keyboard_feed() {
        let mut project = arp_project(ArpMode::Up);
        if let TrackKind::Arp(data) = project.track_mut(0).kind_mut() {
            data.midi_keyboard = true;
        }
        let track = project.track(0);
        let TrackKind::Arp(data) = track.kind() else {
            panic!()
        };

        let mut engine = ArpTrackEngine::new(0);
        engine.receive_midi(data, MidiPort::Midi, &MidiMessage::note_on(0, 60, 100));
        engine.receive_midi(data, MidiPort::Midi, &MidiMessage::note_on(0, 64, 100));

        let mut notes = Vec::new();
        for step in 0..4 {
            for sub in 0..12u32 {
                let out = engine.tick(&info(step * 12 + sub), &project, track, data);
                if sub == 0 {
                    notes.push(out.note);
                }
            }
        }
        assert_eq!(notes, vec![0, 4, 0, 4]);
    }

    #[test]
    fn test_hold_keeps_released_notes() {
        let mut project = arp_project(ArpMode::Up);
        if let TrackKind::Arp(data) = project.track_mut(0).kind_mut() {
            data.midi_keyboard = true;
            data.arpeggiator.set_hold(true);
        }
        let track = project.track(0);
        let TrackKind::Arp(data) = track.kind() else {
            panic!()
        };

        let mut engine = ArpTrackEngine::new(0);
        engine.receive_midi(data, MidiPort::Midi, &MidiMessage::note_on(0, 60, 100));
        engine.receive_midi(data, MidiPort::Midi, &MidiMessage::note_off(0, 60));

        let out = engine.tick(&info(0), &project, track, data);
        assert!(out.gate);
    }
}
