// MIDI/CV track engine - a monophonic MIDI-to-CV converter with
// last-note priority and pitch bend.

use crate::config::HELD_NOTE_COUNT;
use crate::engine::track_engine::{slide_toward, TickInfo, TrackOutput};
use crate::midi::MidiMessage;
use crate::model::track::{MidiCvTrackData, Track};
use crate::model::types::MidiPort;

pub struct MidiCvTrackEngine {
    held: [u8; HELD_NOTE_COUNT],
    held_len: usize,
    pitch_bend: i32,
    retrigger_pending: bool,
    cv_current: f32,
    note: i32,
}

impl MidiCvTrackEngine {
    pub fn new() -> Self {
        Self {
            held: [0; HELD_NOTE_COUNT],
            held_len: 0,
            pitch_bend: 0,
            retrigger_pending: false,
            cv_current: 0.0,
            note: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed a parsed message from the given input port.
    pub fn receive_midi(&mut self, data: &MidiCvTrackData, port: MidiPort, message: &MidiMessage) {
        if !message.is_channel_message() || !data.accepts(port, message.channel()) {
            return;
        }
        let mut message = *message;
        message.fix_fake_note_off();

        if message.is_note_on() {
            let had_notes = self.held_len > 0;
            self.remove_note(message.note());
            if self.held_len == HELD_NOTE_COUNT {
                // voice stealing: the oldest held note goes
                self.held.copy_within(1.., 0);
                self.held_len -= 1;
            }
            self.held[self.held_len] = message.note();
            self.held_len += 1;
            if data.retrigger && had_notes {
                self.retrigger_pending = true;
            }
        } else if message.is_note_off() {
            self.remove_note(message.note());
        } else if message.is_pitch_bend() {
            self.pitch_bend = message.pitch_bend_value();
        }
    }

    fn remove_note(&mut self, note: u8) {
        if let Some(position) = self.held[..self.held_len].iter().position(|&n| n == note) {
            self.held.copy_within(position + 1.., position);
            self.held_len -= 1;
        }
    }

    pub fn tick(
        &mut self,
        info: &TickInfo,
        track: &Track,
        data: &MidiCvTrackData,
    ) -> TrackOutput {
        let gate = self.held_len > 0 && info.audible && !self.retrigger_pending;
        self.retrigger_pending = false;

        if self.held_len > 0 {
            // last-note priority, centered on middle C
            let held = self.held[self.held_len - 1] as i32 - 60;
            let bend = self.pitch_bend as f32 / 8192.0 * data.pitch_bend_range as f32;
            self.note = held + 12 * track.octave() + track.transpose();
            let target = (self.note as f32 + bend) / 12.0;
            self.cv_current = slide_toward(self.cv_current, target, track.slide_time(), info.dt);
        }

        TrackOutput {
            gate,
            cv: self.cv_current,
            note: self.note,
        }
    }
}

impl Default for MidiCvTrackEngine {
    fn default() -> Self {
        Self::new()
    }
}
