// Track - shared envelope plus a tagged variant body
// The variant tag is stable and part of the stream format; switching a
// track's variant clears all of its sequences.

use crate::config::{NAME_LENGTH, SEQUENCE_COUNT, TRACK_COUNT};
use crate::model::arp_sequence::ArpSequence;
use crate::model::arpeggiator::Arpeggiator;
use crate::model::curve_sequence::CurveSequence;
use crate::model::logic_sequence::LogicSequence;
use crate::model::note_sequence::{NoteSequence, Step};
use crate::model::routable::Routable;
use crate::model::stochastic_sequence::StochasticSequence;
use crate::model::types::{CvUpdateMode, FillMode, MidiPort, PlayMode};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter, VERSION_ARP_KEYBOARD};

#[derive(Debug, Clone, PartialEq)]
pub struct NoteTrackData {
    pub sequences: [NoteSequence; SEQUENCE_COUNT],
}

impl NoteTrackData {
    pub fn new() -> Self {
        Self {
            sequences: std::array::from_fn(|_| NoteSequence::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveTrackData {
    pub sequences: [CurveSequence; SEQUENCE_COUNT],
    /// Track whose gate/note drives trigger shaping, -1 = free running.
    pub input_track: i8,
}

impl CurveTrackData {
    pub fn new() -> Self {
        Self {
            sequences: std::array::from_fn(|_| CurveSequence::new()),
            input_track: -1,
        }
    }

    pub fn input_track(&self) -> Option<usize> {
        (self.input_track >= 0).then_some(self.input_track as usize)
    }

    pub fn set_input_track(&mut self, track: i32) {
        self.input_track = track.clamp(-1, TRACK_COUNT as i32 - 1) as i8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiCvTrackData {
    pub port: MidiPort,
    /// Receive channel, 16 = omni.
    pub channel: u8,
    /// Pitch bend range in semitones.
    pub pitch_bend_range: u8,
    /// Retrigger the gate on every new note.
    pub retrigger: bool,
}

impl MidiCvTrackData {
    pub fn new() -> Self {
        Self {
            port: MidiPort::Midi,
            channel: 0,
            pitch_bend_range: 2,
            retrigger: false,
        }
    }

    pub fn accepts(&self, port: MidiPort, channel: u8) -> bool {
        self.port == port && (self.channel >= 16 || self.channel == channel)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticTrackData {
    pub sequences: [StochasticSequence; SEQUENCE_COUNT],
}

impl StochasticTrackData {
    pub fn new() -> Self {
        Self {
            sequences: std::array::from_fn(|_| StochasticSequence::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicTrackData {
    pub sequences: [LogicSequence; SEQUENCE_COUNT],
}

impl LogicTrackData {
    pub fn new() -> Self {
        Self {
            sequences: std::array::from_fn(|_| LogicSequence::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArpTrackData {
    pub sequences: [ArpSequence; SEQUENCE_COUNT],
    pub arpeggiator: Arpeggiator,
    /// Feed the arpeggiator from MIDI keyboard input instead of the
    /// sequence's gated steps.
    pub midi_keyboard: bool,
}

impl ArpTrackData {
    pub fn new() -> Self {
        Self {
            sequences: std::array::from_fn(|_| ArpSequence::new()),
            arpeggiator: Arpeggiator::new(),
            midi_keyboard: false,
        }
    }
}

/// Track variant body. The discriminant doubles as the stream tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackKind {
    Note(NoteTrackData),
    Curve(CurveTrackData),
    MidiCv(MidiCvTrackData),
    Stochastic(StochasticTrackData),
    Logic(LogicTrackData),
    Arp(ArpTrackData),
}

impl TrackKind {
    pub fn tag(&self) -> u8 {
        match self {
            Self::Note(_) => 0,
            Self::Curve(_) => 1,
            Self::MidiCv(_) => 2,
            Self::Stochastic(_) => 3,
            Self::Logic(_) => 4,
            Self::Arp(_) => 5,
        }
    }

    /// Fresh (cleared) variant body for a tag.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::Curve(CurveTrackData::new()),
            2 => Self::MidiCv(MidiCvTrackData::new()),
            3 => Self::Stochastic(StochasticTrackData::new()),
            4 => Self::Logic(LogicTrackData::new()),
            5 => Self::Arp(ArpTrackData::new()),
            _ => Self::Note(NoteTrackData::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    track_index: u8,
    name: String,
    play_mode: Routable<u8>,
    fill_mode: Routable<u8>,
    cv_update_mode: Routable<u8>,
    slide_time: Routable<u8>,
    octave: Routable<i8>,
    transpose: Routable<i8>,
    rotate: Routable<i8>,
    gate_probability_bias: i8,
    retrigger_probability_bias: i8,
    length_bias: i8,
    note_probability_bias: i8,
    kind: TrackKind,
}

impl Track {
    pub const SLIDE_TIME_MAX: i32 = 100;
    pub const OCTAVE_RANGE: i32 = 10;
    pub const TRANSPOSE_RANGE: i32 = 100;
    pub const ROTATE_RANGE: i32 = 64;
    pub const PROBABILITY_BIAS_MAX: i32 = Step::PROBABILITY_MAX;
    pub const LENGTH_BIAS_MAX: i32 = Step::LENGTH_MAX;

    pub fn new(track_index: usize) -> Self {
        Self {
            track_index: track_index as u8,
            name: format!("T{}", track_index + 1),
            play_mode: Routable::new(PlayMode::Aligned as u8),
            fill_mode: Routable::new(FillMode::None as u8),
            cv_update_mode: Routable::new(CvUpdateMode::Gate as u8),
            slide_time: Routable::new(0),
            octave: Routable::new(0),
            transpose: Routable::new(0),
            rotate: Routable::new(0),
            gate_probability_bias: -1,
            retrigger_probability_bias: -1,
            length_bias: -1,
            note_probability_bias: -1,
            kind: TrackKind::Note(NoteTrackData::new()),
        }
    }

    pub fn clear(&mut self) {
        let index = self.track_index as usize;
        let tag = self.kind.tag();
        *self = Self::new(index);
        self.kind = TrackKind::from_tag(tag);
    }

    pub fn track_index(&self) -> usize {
        self.track_index as usize
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.chars().take(NAME_LENGTH).collect();
    }

    pub fn kind(&self) -> &TrackKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut TrackKind {
        &mut self.kind
    }

    /// Switch the track variant. All sequences of the track are
    /// cleared; the variant is otherwise immutable within a project.
    pub fn set_kind_tag(&mut self, tag: u8) {
        if tag != self.kind.tag() {
            self.kind = TrackKind::from_tag(tag);
        }
    }

    pub fn play_mode(&self) -> PlayMode {
        PlayMode::from_u8(self.play_mode.get())
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode.set(mode as u8);
    }

    pub fn fill_mode(&self) -> FillMode {
        FillMode::from_u8(self.fill_mode.get())
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode.set(mode as u8);
    }

    pub fn cv_update_mode(&self) -> CvUpdateMode {
        CvUpdateMode::from_u8(self.cv_update_mode.get())
    }

    pub fn set_cv_update_mode(&mut self, mode: CvUpdateMode) {
        self.cv_update_mode.set(mode as u8);
    }

    /// Slide time in percent.
    pub fn slide_time(&self) -> i32 {
        self.slide_time.get() as i32
    }

    pub fn set_slide_time(&mut self, slide_time: i32) {
        self.slide_time
            .set(slide_time.clamp(0, Self::SLIDE_TIME_MAX) as u8);
    }

    pub fn set_slide_time_routed(&mut self, slide_time: i32) {
        self.slide_time
            .set_routed(slide_time.clamp(0, Self::SLIDE_TIME_MAX) as u8);
    }

    pub fn octave(&self) -> i32 {
        self.octave.get() as i32
    }

    pub fn set_octave(&mut self, octave: i32) {
        self.octave
            .set(octave.clamp(-Self::OCTAVE_RANGE, Self::OCTAVE_RANGE) as i8);
    }

    pub fn set_octave_routed(&mut self, octave: i32) {
        self.octave
            .set_routed(octave.clamp(-Self::OCTAVE_RANGE, Self::OCTAVE_RANGE) as i8);
    }

    /// Transpose in semitones.
    pub fn transpose(&self) -> i32 {
        self.transpose.get() as i32
    }

    pub fn set_transpose(&mut self, transpose: i32) {
        self.transpose
            .set(transpose.clamp(-Self::TRANSPOSE_RANGE, Self::TRANSPOSE_RANGE) as i8);
    }

    pub fn set_transpose_routed(&mut self, transpose: i32) {
        self.transpose
            .set_routed(transpose.clamp(-Self::TRANSPOSE_RANGE, Self::TRANSPOSE_RANGE) as i8);
    }

    /// Step cursor rotation.
    pub fn rotate(&self) -> i32 {
        self.rotate.get() as i32
    }

    pub fn set_rotate(&mut self, rotate: i32) {
        self.rotate
            .set(rotate.clamp(-Self::ROTATE_RANGE, Self::ROTATE_RANGE) as i8);
    }

    pub fn set_rotate_routed(&mut self, rotate: i32) {
        self.rotate
            .set_routed(rotate.clamp(-Self::ROTATE_RANGE, Self::ROTATE_RANGE) as i8);
    }

    /// Bias of -1 means "use the step value"; 0..=7 replaces it.
    pub fn gate_probability_bias(&self) -> i32 {
        self.gate_probability_bias as i32
    }

    pub fn set_gate_probability_bias(&mut self, bias: i32) {
        self.gate_probability_bias = bias.clamp(-1, Self::PROBABILITY_BIAS_MAX) as i8;
    }

    pub fn retrigger_probability_bias(&self) -> i32 {
        self.retrigger_probability_bias as i32
    }

    pub fn set_retrigger_probability_bias(&mut self, bias: i32) {
        self.retrigger_probability_bias = bias.clamp(-1, Self::PROBABILITY_BIAS_MAX) as i8;
    }

    /// Bias of -1 means "use the step value"; 0..=15 replaces it.
    pub fn length_bias(&self) -> i32 {
        self.length_bias as i32
    }

    pub fn set_length_bias(&mut self, bias: i32) {
        self.length_bias = bias.clamp(-1, Self::LENGTH_BIAS_MAX) as i8;
    }

    pub fn note_probability_bias(&self) -> i32 {
        self.note_probability_bias as i32
    }

    pub fn set_note_probability_bias(&mut self, bias: i32) {
        self.note_probability_bias = bias.clamp(-1, Self::PROBABILITY_BIAS_MAX) as i8;
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_name(&self.name)?;
        writer.write_u8(self.play_mode.local())?;
        writer.write_u8(self.fill_mode.local())?;
        writer.write_u8(self.cv_update_mode.local())?;
        writer.write_u8(self.slide_time.local())?;
        writer.write_i8(self.octave.local())?;
        writer.write_i8(self.transpose.local())?;
        writer.write_i8(self.rotate.local())?;
        writer.write_i8(self.gate_probability_bias)?;
        writer.write_i8(self.retrigger_probability_bias)?;
        writer.write_i8(self.length_bias)?;
        writer.write_i8(self.note_probability_bias)?;
        writer.write_u8(self.kind.tag())?;
        match &self.kind {
            TrackKind::Note(data) => {
                for sequence in &data.sequences {
                    sequence.write(writer)?;
                }
            }
            TrackKind::Curve(data) => {
                writer.write_i8(data.input_track)?;
                for sequence in &data.sequences {
                    sequence.write(writer)?;
                }
            }
            TrackKind::MidiCv(data) => {
                writer.write_u8(data.port as u8)?;
                writer.write_u8(data.channel)?;
                writer.write_u8(data.pitch_bend_range)?;
                writer.write_bool(data.retrigger)?;
            }
            TrackKind::Stochastic(data) => {
                for sequence in &data.sequences {
                    sequence.write(writer)?;
                }
            }
            TrackKind::Logic(data) => {
                for sequence in &data.sequences {
                    sequence.write(writer)?;
                }
            }
            TrackKind::Arp(data) => {
                data.arpeggiator.write(writer)?;
                if writer.version() >= VERSION_ARP_KEYBOARD {
                    writer.write_bool(data.midi_keyboard)?;
                }
                for sequence in &data.sequences {
                    sequence.write(writer)?;
                }
            }
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.name = reader.read_name()?;
        self.play_mode.set(reader.read_u8()?);
        self.fill_mode.set(reader.read_u8()?);
        self.cv_update_mode.set(reader.read_u8()?);
        self.slide_time
            .set(reader.read_u8()?.min(Self::SLIDE_TIME_MAX as u8));
        self.octave.set(reader.read_i8()?);
        self.transpose.set(reader.read_i8()?);
        self.rotate.set(reader.read_i8()?);
        self.gate_probability_bias = reader.read_i8()?;
        self.retrigger_probability_bias = reader.read_i8()?;
        self.length_bias = reader.read_i8()?;
        self.note_probability_bias = reader.read_i8()?;
        let tag = reader.read_u8()?;
        let mut kind = TrackKind::from_tag(tag);
        match &mut kind {
            TrackKind::Note(data) => {
                for sequence in data.sequences.iter_mut() {
                    sequence.read(reader)?;
                }
            }
            TrackKind::Curve(data) => {
                data.input_track = reader.read_i8()?.clamp(-1, TRACK_COUNT as i8 - 1);
                for sequence in data.sequences.iter_mut() {
                    sequence.read(reader)?;
                }
            }
            TrackKind::MidiCv(data) => {
                data.port = MidiPort::from_u8(reader.read_u8()?);
                data.channel = reader.read_u8()?.min(16);
                data.pitch_bend_range = reader.read_u8()?.clamp(1, 48);
                data.retrigger = reader.read_bool()?;
            }
            TrackKind::Stochastic(data) => {
                for sequence in data.sequences.iter_mut() {
                    sequence.read(reader)?;
                }
            }
            TrackKind::Logic(data) => {
                for sequence in data.sequences.iter_mut() {
                    sequence.read(reader)?;
                }
            }
            TrackKind::Arp(data) => {
                data.arpeggiator.read(reader)?;
                if reader.version() >= VERSION_ARP_KEYBOARD {
                    data.midi_keyboard = reader.read_bool()?;
                } else {
                    data.midi_keyboard = false;
                }
                for sequence in data.sequences.iter_mut() {
                    sequence.read(reader)?;
                }
            }
        }
        self.kind = kind;
        Ok(())
    }
}
