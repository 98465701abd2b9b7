// Curve sequence - per-step shapes interpolated over the step window,
// scaled into a routable [min, max] voltage range with an offset.

use crate::config::STEP_COUNT;
use crate::model::bitfield::{get_bits, set_bits};
use crate::model::routable::Routable;
use crate::model::types::RunMode;
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter, VERSION_ARP_KEYBOARD};

/// Curve interpolation shape, evaluated over phase in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CurveShape {
    #[default]
    Low = 0,
    High = 1,
    RampUp = 2,
    RampDown = 3,
    ExpUp = 4,
    ExpDown = 5,
    LogUp = 6,
    LogDown = 7,
    SmoothUp = 8,
    SmoothDown = 9,
    Triangle = 10,
    Bell = 11,
    Sine = 12,
}

impl CurveShape {
    pub const COUNT: u8 = 13;

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::High,
            2 => Self::RampUp,
            3 => Self::RampDown,
            4 => Self::ExpUp,
            5 => Self::ExpDown,
            6 => Self::LogUp,
            7 => Self::LogDown,
            8 => Self::SmoothUp,
            9 => Self::SmoothDown,
            10 => Self::Triangle,
            11 => Self::Bell,
            12 => Self::Sine,
            _ => Self::Low,
        }
    }

    /// Shape value for a phase in [0, 1]; output is in [0, 1].
    pub fn value(self, phase: f32) -> f32 {
        let p = phase.clamp(0.0, 1.0);
        match self {
            Self::Low => 0.0,
            Self::High => 1.0,
            Self::RampUp => p,
            Self::RampDown => 1.0 - p,
            Self::ExpUp => p * p,
            Self::ExpDown => (1.0 - p) * (1.0 - p),
            Self::LogUp => p.sqrt(),
            Self::LogDown => (1.0 - p).sqrt(),
            Self::SmoothUp => p * p * (3.0 - 2.0 * p),
            Self::SmoothDown => 1.0 - p * p * (3.0 - 2.0 * p),
            Self::Triangle => 1.0 - (2.0 * p - 1.0).abs(),
            Self::Bell => (1.0 - (std::f32::consts::TAU * p).cos()) * 0.5,
            Self::Sine => ((std::f32::consts::TAU * p).sin() + 1.0) * 0.5,
        }
    }
}

/// How the curve responds to its input track's gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TriggerShape {
    /// Restart on the rising edge.
    #[default]
    Rise = 0,
    /// Restart on the falling edge.
    Fall = 1,
    /// Restart on both edges.
    Both = 2,
    /// Run only while the gate is high.
    Gate = 3,
}

impl TriggerShape {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Fall,
            2 => Self::Both,
            3 => Self::Gate,
            _ => Self::Rise,
        }
    }
}

/// One curve step: a shape and a gate bit for trigger shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurveStep {
    data0: u32,
}

impl CurveStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data0 = 0;
    }

    pub fn shape(&self) -> CurveShape {
        CurveShape::from_u8(get_bits(self.data0, 0, 4) as u8)
    }

    pub fn set_shape(&mut self, shape: CurveShape) {
        self.data0 = set_bits(self.data0, 0, 4, shape as u32);
    }

    pub fn gate(&self) -> bool {
        get_bits(self.data0, 4, 1) != 0
    }

    pub fn set_gate(&mut self, gate: bool) {
        self.data0 = set_bits(self.data0, 4, 1, gate as u32);
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u32(self.data0)
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.data0 = reader.read_u32()?;
        Ok(())
    }
}

/// Curve pattern with its voltage range and trigger behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSequence {
    divisor: Routable<u16>,
    run_mode: Routable<u8>,
    first_step: u8,
    last_step: u8,
    reset_measure: u8,
    min: Routable<f32>,
    max: Routable<f32>,
    offset: Routable<f32>,
    trigger_shape: TriggerShape,
    note_filter_min: i8,
    note_filter_max: i8,
    steps: [CurveStep; STEP_COUNT],
}

impl CurveSequence {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;
    pub const VOLTS_MIN: f32 = -5.0;
    pub const VOLTS_MAX: f32 = 5.0;
    pub const NOTE_FILTER_MIN: i32 = -64;
    pub const NOTE_FILTER_MAX: i32 = 63;

    pub fn new() -> Self {
        Self {
            divisor: Routable::new(Self::DEFAULT_DIVISOR as u16),
            run_mode: Routable::new(RunMode::Forward as u8),
            first_step: 0,
            last_step: (STEP_COUNT - 1) as u8,
            reset_measure: 0,
            min: Routable::new(0.0),
            max: Routable::new(Self::VOLTS_MAX),
            offset: Routable::new(0.0),
            trigger_shape: TriggerShape::Rise,
            note_filter_min: Self::NOTE_FILTER_MIN as i8,
            note_filter_max: Self::NOTE_FILTER_MAX as i8,
            steps: [CurveStep::new(); STEP_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.steps = [CurveStep::new(); STEP_COUNT];
    }

    pub fn steps(&self) -> &[CurveStep; STEP_COUNT] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> &CurveStep {
        &self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn step_mut(&mut self, index: usize) -> &mut CurveStep {
        &mut self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn divisor(&self) -> u32 {
        self.divisor.get() as u32
    }

    pub fn set_divisor(&mut self, divisor: i32) {
        self.divisor
            .set(divisor.clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16);
    }

    pub fn set_divisor_routed(&mut self, divisor: i32) {
        self.divisor
            .set_routed(divisor.clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16);
    }

    pub fn run_mode(&self) -> RunMode {
        RunMode::from_u8(self.run_mode.get())
    }

    pub fn set_run_mode(&mut self, mode: RunMode) {
        self.run_mode.set(mode as u8);
    }

    pub fn first_step(&self) -> usize {
        self.first_step as usize
    }

    pub fn set_first_step(&mut self, step: i32) {
        self.first_step = step.clamp(0, self.last_step as i32) as u8;
    }

    pub fn last_step(&self) -> usize {
        self.last_step as usize
    }

    pub fn set_last_step(&mut self, step: i32) {
        self.last_step = step.clamp(self.first_step as i32, STEP_COUNT as i32 - 1) as u8;
    }

    pub fn reset_measure(&self) -> u32 {
        self.reset_measure as u32
    }

    pub fn set_reset_measure(&mut self, measure: i32) {
        self.reset_measure = measure.clamp(0, 128) as u8;
    }

    pub fn min(&self) -> f32 {
        self.min.get()
    }

    /// Assigning min past max drags max along.
    pub fn set_min(&mut self, min: f32) {
        self.min.set(min.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
        if self.min.local() > self.max.local() {
            self.max.set(self.min.local());
        }
    }

    pub fn set_min_routed(&mut self, min: f32) {
        self.min
            .set_routed(min.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
    }

    pub fn max(&self) -> f32 {
        self.max.get()
    }

    /// Assigning max past min drags min along.
    pub fn set_max(&mut self, max: f32) {
        self.max.set(max.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
        if self.max.local() < self.min.local() {
            self.min.set(self.max.local());
        }
    }

    pub fn set_max_routed(&mut self, max: f32) {
        self.max
            .set_routed(max.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
    }

    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset
            .set(offset.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
    }

    pub fn set_offset_routed(&mut self, offset: f32) {
        self.offset
            .set_routed(offset.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
    }

    pub fn trigger_shape(&self) -> TriggerShape {
        self.trigger_shape
    }

    pub fn set_trigger_shape(&mut self, shape: TriggerShape) {
        self.trigger_shape = shape;
    }

    pub fn note_filter_min(&self) -> i32 {
        self.note_filter_min as i32
    }

    pub fn set_note_filter_min(&mut self, min: i32) {
        self.note_filter_min = min.clamp(Self::NOTE_FILTER_MIN, Self::NOTE_FILTER_MAX) as i8;
        if self.note_filter_min > self.note_filter_max {
            self.note_filter_max = self.note_filter_min;
        }
    }

    pub fn note_filter_max(&self) -> i32 {
        self.note_filter_max as i32
    }

    pub fn set_note_filter_max(&mut self, max: i32) {
        self.note_filter_max = max.clamp(Self::NOTE_FILTER_MIN, Self::NOTE_FILTER_MAX) as i8;
        if self.note_filter_max < self.note_filter_min {
            self.note_filter_min = self.note_filter_max;
        }
    }

    pub fn note_passes_filter(&self, note: i32) -> bool {
        note >= self.note_filter_min as i32 && note <= self.note_filter_max as i32
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u16(self.divisor.local())?;
        writer.write_u8(self.run_mode.local())?;
        writer.write_u8(self.first_step)?;
        writer.write_u8(self.last_step)?;
        writer.write_u8(self.reset_measure)?;
        writer.write_f32(self.min.local())?;
        writer.write_f32(self.max.local())?;
        writer.write_f32(self.offset.local())?;
        writer.write_u8(self.trigger_shape as u8)?;
        if writer.version() >= VERSION_ARP_KEYBOARD {
            writer.write_i8(self.note_filter_min)?;
            writer.write_i8(self.note_filter_max)?;
        }
        for step in &self.steps {
            step.write(writer)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.divisor.set(
            (reader.read_u16()? as i32).clamp(Self::DIVISOR_MIN, Self::DIVISOR_MAX) as u16,
        );
        self.run_mode.set(reader.read_u8()?);
        self.last_step = (STEP_COUNT - 1) as u8;
        self.first_step = reader.read_u8()?.min((STEP_COUNT - 1) as u8);
        self.last_step = reader
            .read_u8()?
            .clamp(self.first_step, (STEP_COUNT - 1) as u8);
        self.reset_measure = reader.read_u8()?;
        self.min
            .set(reader.read_f32()?.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
        self.max
            .set(reader.read_f32()?.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
        self.offset
            .set(reader.read_f32()?.clamp(Self::VOLTS_MIN, Self::VOLTS_MAX));
        self.trigger_shape = TriggerShape::from_u8(reader.read_u8()?);
        if reader.version() >= VERSION_ARP_KEYBOARD {
            self.note_filter_min = reader.read_i8()?;
            self.note_filter_max = reader.read_i8()?;
        } else {
            self.note_filter_min = Self::NOTE_FILTER_MIN as i8;
            self.note_filter_max = Self::NOTE_FILTER_MAX as i8;
        }
        for step in self.steps.iter_mut() {
            step.read(reader)?;
        }
        Ok(())
    }
}

impl Default for CurveSequence {
    fn default() -> Self {
        Self::new()
    }
}
