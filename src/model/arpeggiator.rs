// Arpeggiator settings - traversal mode, rate, octave walk and hold.

use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// Order in which held notes are traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ArpMode {
    #[default]
    Up = 0,
    Down = 1,
    UpDown = 2,
    DownUp = 3,
    Converge = 4,
    Diverge = 5,
    Random = 6,
    AsPlayed = 7,
}

impl ArpMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Down,
            2 => Self::UpDown,
            3 => Self::DownUp,
            4 => Self::Converge,
            5 => Self::Diverge,
            6 => Self::Random,
            7 => Self::AsPlayed,
            _ => Self::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arpeggiator {
    mode: ArpMode,
    divisor: u16,
    octaves: i8,
    hold: bool,
}

impl Arpeggiator {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;
    pub const OCTAVES_MIN: i32 = -4;
    pub const OCTAVES_MAX: i32 = 4;

    pub fn new() -> Self {
        Self {
            mode: ArpMode::Up,
            divisor: Self::DEFAULT_DIVISOR as u16,
            octaves: 0,
            hold: false,
        }
    }

    pub fn mode(&self) -> ArpMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ArpMode) {
        self.mode = mode;
    }

    /// Ticks between arpeggiator steps.
    pub fn divisor(&self) -> u32 {
        self.divisor as u32
    }

    pub fn set_divisor(&mut self, divisor: i32) {
        self.divisor = divisor.clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16;
    }

    /// Octave walk after each full traversal: positive walks up that
    /// many octaves, negative walks down, 0 stays put.
    pub fn octaves(&self) -> i32 {
        self.octaves as i32
    }

    pub fn set_octaves(&mut self, octaves: i32) {
        self.octaves = octaves.clamp(Self::OCTAVES_MIN, Self::OCTAVES_MAX) as i8;
    }

    /// Keep notes in the pool after they are released.
    pub fn hold(&self) -> bool {
        self.hold
    }

    pub fn set_hold(&mut self, hold: bool) {
        self.hold = hold;
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u8(self.mode as u8)?;
        writer.write_u16(self.divisor)?;
        writer.write_i8(self.octaves)?;
        writer.write_bool(self.hold)
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.mode = ArpMode::from_u8(reader.read_u8()?);
        self.divisor =
            (reader.read_u16()? as i32).clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16;
        self.octaves = (reader.read_i8()? as i32).clamp(Self::OCTAVES_MIN, Self::OCTAVES_MAX) as i8;
        self.hold = reader.read_bool()?;
        Ok(())
    }
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self::new()
    }
}
