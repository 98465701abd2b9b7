// Clock setup - mode selection, output shaping and slave sources.

use crate::config::{DEFAULT_OUTPUT_DIVISOR, DEFAULT_OUTPUT_PULSE_US, SLAVE_COUNT};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// Clock role selection. In Auto the first Start (local or MIDI) fixes
/// the active role until the next reset or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClockMode {
    #[default]
    Auto = 0,
    Master = 1,
    Slave = 2,
}

impl ClockMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Master,
            2 => Self::Slave,
            _ => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveSetup {
    pub divisor: u16,
    pub enabled: bool,
}

impl SlaveSetup {
    fn new() -> Self {
        Self {
            divisor: DEFAULT_OUTPUT_DIVISOR as u16,
            enabled: true,
        }
    }
}

impl Default for SlaveSetup {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockSetup {
    mode: ClockMode,
    output_divisor: u16,
    output_pulse_us: u32,
    output_swing: u8,
    send_midi_clock: bool,
    slaves: [SlaveSetup; SLAVE_COUNT],
}

impl ClockSetup {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const PULSE_US_MIN: i32 = 1;
    pub const PULSE_US_MAX: i32 = 20_000;
    pub const SWING_MIN: i32 = 50;
    pub const SWING_MAX: i32 = 75;

    pub fn new() -> Self {
        Self {
            mode: ClockMode::Auto,
            output_divisor: DEFAULT_OUTPUT_DIVISOR as u16,
            output_pulse_us: DEFAULT_OUTPUT_PULSE_US,
            output_swing: Self::SWING_MIN as u8,
            send_midi_clock: true,
            slaves: [SlaveSetup::new(); SLAVE_COUNT],
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ClockMode) {
        self.mode = mode;
    }

    pub fn output_divisor(&self) -> u32 {
        self.output_divisor as u32
    }

    pub fn set_output_divisor(&mut self, divisor: i32) {
        self.output_divisor = divisor.clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16;
    }

    pub fn output_pulse_us(&self) -> u32 {
        self.output_pulse_us
    }

    pub fn set_output_pulse_us(&mut self, pulse_us: i32) {
        self.output_pulse_us = pulse_us.clamp(Self::PULSE_US_MIN, Self::PULSE_US_MAX) as u32;
    }

    pub fn output_swing(&self) -> u8 {
        self.output_swing
    }

    pub fn set_output_swing(&mut self, swing: i32) {
        self.output_swing = swing.clamp(Self::SWING_MIN, Self::SWING_MAX) as u8;
    }

    pub fn send_midi_clock(&self) -> bool {
        self.send_midi_clock
    }

    pub fn set_send_midi_clock(&mut self, send: bool) {
        self.send_midi_clock = send;
    }

    pub fn slave(&self, index: usize) -> &SlaveSetup {
        &self.slaves[index.min(SLAVE_COUNT - 1)]
    }

    pub fn set_slave(&mut self, index: usize, divisor: i32, enabled: bool) {
        if index < SLAVE_COUNT {
            self.slaves[index] = SlaveSetup {
                divisor: divisor.clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16,
                enabled,
            };
        }
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u8(self.mode as u8)?;
        writer.write_u16(self.output_divisor)?;
        writer.write_u32(self.output_pulse_us)?;
        writer.write_u8(self.output_swing)?;
        writer.write_bool(self.send_midi_clock)?;
        for slave in &self.slaves {
            writer.write_u16(slave.divisor)?;
            writer.write_bool(slave.enabled)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.mode = ClockMode::from_u8(reader.read_u8()?);
        self.output_divisor =
            (reader.read_u16()? as i32).clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16;
        self.output_pulse_us =
            (reader.read_u32()? as i32).clamp(Self::PULSE_US_MIN, Self::PULSE_US_MAX) as u32;
        self.output_swing =
            (reader.read_u8()? as i32).clamp(Self::SWING_MIN, Self::SWING_MAX) as u8;
        self.send_midi_clock = reader.read_bool()?;
        for slave in self.slaves.iter_mut() {
            slave.divisor =
                (reader.read_u16()? as i32).clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16;
            slave.enabled = reader.read_bool()?;
        }
        Ok(())
    }
}

impl Default for ClockSetup {
    fn default() -> Self {
        Self::new()
    }
}
