// MIDI output map - connects track outputs to MIDI ports/channels.

use crate::config::{MIDI_OUTPUT_COUNT, TRACK_COUNT};
use crate::model::types::MidiPort;
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// What an output entry emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MidiOutputTarget {
    #[default]
    None,
    /// NoteOn/NoteOff following the track's gate and note.
    Notes { track: u8 },
    /// A continuous controller following the track's CV.
    ControlChange { track: u8, controller: u8 },
}

impl MidiOutputTarget {
    fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Notes { .. } => 1,
            Self::ControlChange { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiOutput {
    pub port: MidiPort,
    pub channel: u8,
    pub target: MidiOutputTarget,
}

impl MidiOutput {
    pub fn new() -> Self {
        Self {
            port: MidiPort::Midi,
            channel: 0,
            target: MidiOutputTarget::None,
        }
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u8(self.port as u8)?;
        writer.write_u8(self.channel)?;
        writer.write_u8(self.target.tag())?;
        match self.target {
            MidiOutputTarget::None => {
                writer.write_u8(0)?;
                writer.write_u8(0)?;
            }
            MidiOutputTarget::Notes { track } => {
                writer.write_u8(track)?;
                writer.write_u8(0)?;
            }
            MidiOutputTarget::ControlChange { track, controller } => {
                writer.write_u8(track)?;
                writer.write_u8(controller)?;
            }
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.port = MidiPort::from_u8(reader.read_u8()?);
        self.channel = reader.read_u8()?.min(15);
        let tag = reader.read_u8()?;
        let a = reader.read_u8()?;
        let b = reader.read_u8()?;
        self.target = match tag {
            1 => MidiOutputTarget::Notes {
                track: a.min(TRACK_COUNT as u8 - 1),
            },
            2 => MidiOutputTarget::ControlChange {
                track: a.min(TRACK_COUNT as u8 - 1),
                controller: b & 0x7f,
            },
            _ => MidiOutputTarget::None,
        };
        Ok(())
    }
}

impl Default for MidiOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidiOutputSetup {
    outputs: [MidiOutput; MIDI_OUTPUT_COUNT],
}

impl MidiOutputSetup {
    /// Default map: one note output per track on its own channel.
    pub fn new() -> Self {
        let mut outputs = [MidiOutput::new(); MIDI_OUTPUT_COUNT];
        for (index, output) in outputs.iter_mut().enumerate().take(TRACK_COUNT) {
            output.channel = index as u8;
            output.target = MidiOutputTarget::Notes {
                track: index as u8,
            };
        }
        Self { outputs }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn output(&self, index: usize) -> &MidiOutput {
        &self.outputs[index.min(MIDI_OUTPUT_COUNT - 1)]
    }

    pub fn output_mut(&mut self, index: usize) -> &mut MidiOutput {
        &mut self.outputs[index.min(MIDI_OUTPUT_COUNT - 1)]
    }

    pub fn outputs(&self) -> &[MidiOutput; MIDI_OUTPUT_COUNT] {
        &self.outputs
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        for output in &self.outputs {
            output.write(writer)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        for output in self.outputs.iter_mut() {
            output.read(reader)?;
        }
        Ok(())
    }
}

impl Default for MidiOutputSetup {
    fn default() -> Self {
        Self::new()
    }
}
