// Project - the ownership root of all sequencer state.
// One lives per editing session; children hold no back-pointers.

use crate::config::{NAME_LENGTH, TRACK_COUNT, USER_SCALE_COUNT};
use crate::model::clock_setup::ClockSetup;
use crate::model::midi_output::MidiOutputSetup;
use crate::model::play_state::PlayState;
use crate::model::routable::Routable;
use crate::model::routing::Routing;
use crate::model::scale::{Scale, UserScale};
use crate::model::song::Song;
use crate::model::track::Track;
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    name: String,
    tempo: Routable<f32>,
    swing: Routable<u8>,
    slot: Option<u8>,
    auto_loaded: bool,
    clock_setup: ClockSetup,
    routing: Routing,
    midi_output: MidiOutputSetup,
    user_scales: [UserScale; USER_SCALE_COUNT],
    song: Song,
    play_state: PlayState,
    tracks: [Track; TRACK_COUNT],
}

impl Project {
    pub const TEMPO_MIN: f32 = 1.0;
    pub const TEMPO_MAX: f32 = 1000.0;
    pub const SWING_MIN: i32 = 50;
    pub const SWING_MAX: i32 = 75;

    pub fn new() -> Self {
        Self {
            name: "INIT".to_string(),
            tempo: Routable::new(120.0),
            swing: Routable::new(Self::SWING_MIN as u8),
            slot: None,
            auto_loaded: false,
            clock_setup: ClockSetup::new(),
            routing: Routing::new(),
            midi_output: MidiOutputSetup::new(),
            user_scales: std::array::from_fn(|_| UserScale::new()),
            song: Song::new(),
            play_state: PlayState::new(),
            tracks: std::array::from_fn(Track::new),
        }
    }

    /// Reset everything to cold-boot defaults.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.chars().take(NAME_LENGTH).collect();
    }

    pub fn tempo(&self) -> f32 {
        self.tempo.get()
    }

    pub fn set_tempo(&mut self, tempo: f32) {
        self.tempo.set(tempo.clamp(Self::TEMPO_MIN, Self::TEMPO_MAX));
    }

    pub fn set_tempo_routed(&mut self, tempo: f32) {
        self.tempo
            .set_routed(tempo.clamp(Self::TEMPO_MIN, Self::TEMPO_MAX));
    }

    pub fn swing(&self) -> i32 {
        self.swing.get() as i32
    }

    pub fn set_swing(&mut self, swing: i32) {
        self.swing
            .set(swing.clamp(Self::SWING_MIN, Self::SWING_MAX) as u8);
    }

    pub fn set_swing_routed(&mut self, swing: i32) {
        self.swing
            .set_routed(swing.clamp(Self::SWING_MIN, Self::SWING_MAX) as u8);
    }

    pub fn slot(&self) -> Option<u8> {
        self.slot
    }

    pub fn slot_assigned(&self) -> bool {
        self.slot.is_some()
    }

    pub fn set_slot(&mut self, slot: u8) {
        self.slot = Some(slot);
    }

    pub fn clear_slot(&mut self) {
        self.slot = None;
    }

    pub fn auto_loaded(&self) -> bool {
        self.auto_loaded
    }

    pub fn set_auto_loaded(&mut self, auto_loaded: bool) {
        self.auto_loaded = auto_loaded;
    }

    pub fn clock_setup(&self) -> &ClockSetup {
        &self.clock_setup
    }

    pub fn clock_setup_mut(&mut self) -> &mut ClockSetup {
        &mut self.clock_setup
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    pub fn routing_mut(&mut self) -> &mut Routing {
        &mut self.routing
    }

    pub fn midi_output(&self) -> &MidiOutputSetup {
        &self.midi_output
    }

    pub fn midi_output_mut(&mut self) -> &mut MidiOutputSetup {
        &mut self.midi_output
    }

    pub fn user_scale(&self, index: usize) -> &UserScale {
        &self.user_scales[index.min(USER_SCALE_COUNT - 1)]
    }

    pub fn user_scale_mut(&mut self, index: usize) -> &mut UserScale {
        &mut self.user_scales[index.min(USER_SCALE_COUNT - 1)]
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn song_mut(&mut self) -> &mut Song {
        &mut self.song
    }

    pub fn play_state(&self) -> &PlayState {
        &self.play_state
    }

    pub fn play_state_mut(&mut self) -> &mut PlayState {
        &mut self.play_state
    }

    pub fn track(&self, index: usize) -> &Track {
        &self.tracks[index.min(TRACK_COUNT - 1)]
    }

    pub fn track_mut(&mut self, index: usize) -> &mut Track {
        &mut self.tracks[index.min(TRACK_COUNT - 1)]
    }

    pub fn tracks(&self) -> &[Track; TRACK_COUNT] {
        &self.tracks
    }

    /// Resolve a scale index (built-ins first, then user scales) and
    /// map a scale degree to semitones.
    pub fn scale_note_to_semitone(&self, scale_index: u8, note: i32) -> i32 {
        let builtin_count = Scale::builtin_count();
        let index = scale_index as usize;
        if index < builtin_count {
            Scale::builtin(index).note_to_semitone(note)
        } else {
            let user = (index - builtin_count).min(USER_SCALE_COUNT - 1);
            self.user_scales[user].note_to_semitone(note)
        }
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_name(&self.name)?;
        writer.write_f32(self.tempo.local())?;
        writer.write_u8(self.swing.local())?;
        writer.write_i8(self.slot.map_or(-1, |s| s as i8))?;
        writer.write_bool(self.auto_loaded)?;
        self.clock_setup.write(writer)?;
        self.routing.write(writer)?;
        self.midi_output.write(writer)?;
        for scale in &self.user_scales {
            scale.write(writer)?;
        }
        self.song.write(writer)?;
        self.play_state.write(writer)?;
        for track in &self.tracks {
            track.write(writer)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.name = reader.read_name()?;
        self.tempo
            .set(reader.read_f32()?.clamp(Self::TEMPO_MIN, Self::TEMPO_MAX));
        self.swing
            .set((reader.read_u8()? as i32).clamp(Self::SWING_MIN, Self::SWING_MAX) as u8);
        let slot = reader.read_i8()?;
        self.slot = (slot >= 0).then_some(slot as u8);
        self.auto_loaded = reader.read_bool()?;
        self.clock_setup.read(reader)?;
        self.routing.read(reader)?;
        self.midi_output.read(reader)?;
        for scale in self.user_scales.iter_mut() {
            scale.read(reader)?;
        }
        self.song.read(reader)?;
        self.play_state.read(reader)?;
        for track in self.tracks.iter_mut() {
            track.read(reader)?;
        }
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a project as one versioned stream.
pub fn save_project(project: &Project, writer: &mut dyn Write) -> Result<(), SerializeError> {
    let mut stream = VersionedWriter::new(writer)?;
    project.write(&mut stream)?;
    stream.finish()
}

/// Load a project from a versioned stream. On any error the existing
/// project state of the caller is untouched; a fresh project is only
/// returned after the checksum validates.
pub fn load_project(reader: &mut dyn Read) -> Result<Project, SerializeError> {
    let mut stream = VersionedReader::new(reader)?;
    let mut project = Project::new();
    project.read(&mut stream)?;
    stream.finish()?;
    Ok(project)
}
