// Logic sequence - steps carry gate and note logic operators applied
// to the outputs of two input tracks.

use crate::config::{STEP_COUNT, TRACK_COUNT};
use crate::model::bitfield::{get_bits, get_signed, set_bits, set_signed};
use crate::model::routable::Routable;
use crate::model::types::{Condition, RunMode};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// Per-step gate combinator over inputs A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GateLogic {
    #[default]
    Pass = 0,
    Invert = 1,
    And = 2,
    Or = 3,
    Xor = 4,
    Nand = 5,
    Nor = 6,
}

impl GateLogic {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Invert,
            2 => Self::And,
            3 => Self::Or,
            4 => Self::Xor,
            5 => Self::Nand,
            6 => Self::Nor,
            _ => Self::Pass,
        }
    }
}

/// Per-step note transformer over inputs A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NoteLogic {
    #[default]
    Pass = 0,
    TransposeA = 1,
    TransposeB = 2,
    Combine = 3,
    FilterHigh = 4,
    FilterLow = 5,
    FilterRange = 6,
    Mask = 7,
}

impl NoteLogic {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::TransposeA,
            2 => Self::TransposeB,
            3 => Self::Combine,
            4 => Self::FilterHigh,
            5 => Self::FilterLow,
            6 => Self::FilterRange,
            7 => Self::Mask,
            _ => Self::Pass,
        }
    }
}

/// One logic step, packed into two 32-bit words.
///
/// data0: gate:1 gateProbability:7 gateOffset:4s gateLogic:3 slide:1
///        retrigger:4 retriggerProbability:7 length:4
/// data1: note:7s noteLogic:3 noteVariationRange:5s
///        noteVariationProbability:7 condition:4 bypassScale:1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicStep {
    data0: u32,
    data1: u32,
}

impl LogicStep {
    pub const PROBABILITY_MAX: i32 = 7;
    pub const GATE_OFFSET_MIN: i32 = -8;
    pub const GATE_OFFSET_MAX: i32 = 7;
    pub const RETRIGGER_MAX: i32 = 15;
    pub const LENGTH_MAX: i32 = 15;
    pub const NOTE_MIN: i32 = -64;
    pub const NOTE_MAX: i32 = 63;
    pub const NOTE_VARIATION_RANGE_MIN: i32 = -16;
    pub const NOTE_VARIATION_RANGE_MAX: i32 = 15;

    pub fn new() -> Self {
        let mut step = Self { data0: 0, data1: 0 };
        step.set_gate_probability(Self::PROBABILITY_MAX);
        step.set_retrigger_probability(Self::PROBABILITY_MAX);
        step.set_length(Self::LENGTH_MAX / 2);
        step.set_note_variation_probability(Self::PROBABILITY_MAX);
        step
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn gate(&self) -> bool {
        get_bits(self.data0, 0, 1) != 0
    }

    pub fn set_gate(&mut self, gate: bool) {
        self.data0 = set_bits(self.data0, 0, 1, gate as u32);
    }

    pub fn gate_probability(&self) -> i32 {
        get_bits(self.data0, 1, 7) as i32
    }

    pub fn set_gate_probability(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 1, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn gate_offset(&self) -> i32 {
        get_signed(self.data0, 8, 4)
    }

    pub fn set_gate_offset(&mut self, value: i32) {
        self.data0 = set_signed(
            self.data0,
            8,
            4,
            value.clamp(Self::GATE_OFFSET_MIN, Self::GATE_OFFSET_MAX),
        );
    }

    pub fn gate_logic(&self) -> GateLogic {
        GateLogic::from_u8(get_bits(self.data0, 12, 3) as u8)
    }

    pub fn set_gate_logic(&mut self, logic: GateLogic) {
        self.data0 = set_bits(self.data0, 12, 3, logic as u32);
    }

    pub fn slide(&self) -> bool {
        get_bits(self.data0, 15, 1) != 0
    }

    pub fn set_slide(&mut self, slide: bool) {
        self.data0 = set_bits(self.data0, 15, 1, slide as u32);
    }

    pub fn retrigger(&self) -> i32 {
        get_bits(self.data0, 16, 4) as i32
    }

    pub fn set_retrigger(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 16, 4, value.clamp(0, Self::RETRIGGER_MAX) as u32);
    }

    pub fn retrigger_probability(&self) -> i32 {
        get_bits(self.data0, 20, 7) as i32
    }

    pub fn set_retrigger_probability(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 20, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn length(&self) -> i32 {
        get_bits(self.data0, 27, 4) as i32
    }

    pub fn set_length(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 27, 4, value.clamp(0, Self::LENGTH_MAX) as u32);
    }

    pub fn note(&self) -> i32 {
        get_signed(self.data1, 0, 7)
    }

    pub fn set_note(&mut self, value: i32) {
        self.data1 = set_signed(self.data1, 0, 7, value.clamp(Self::NOTE_MIN, Self::NOTE_MAX));
    }

    pub fn note_logic(&self) -> NoteLogic {
        NoteLogic::from_u8(get_bits(self.data1, 7, 3) as u8)
    }

    pub fn set_note_logic(&mut self, logic: NoteLogic) {
        self.data1 = set_bits(self.data1, 7, 3, logic as u32);
    }

    pub fn note_variation_range(&self) -> i32 {
        get_signed(self.data1, 10, 5)
    }

    pub fn set_note_variation_range(&mut self, value: i32) {
        self.data1 = set_signed(
            self.data1,
            10,
            5,
            value.clamp(
                Self::NOTE_VARIATION_RANGE_MIN,
                Self::NOTE_VARIATION_RANGE_MAX,
            ),
        );
    }

    pub fn note_variation_probability(&self) -> i32 {
        get_bits(self.data1, 15, 7) as i32
    }

    pub fn set_note_variation_probability(&mut self, value: i32) {
        self.data1 = set_bits(self.data1, 15, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn condition(&self) -> Condition {
        Condition::from_u8(get_bits(self.data1, 22, 4) as u8)
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.data1 = set_bits(self.data1, 22, 4, condition as u32);
    }

    pub fn bypass_scale(&self) -> bool {
        get_bits(self.data1, 26, 1) != 0
    }

    pub fn set_bypass_scale(&mut self, bypass: bool) {
        self.data1 = set_bits(self.data1, 26, 1, bypass as u32);
    }

    /// Combine the input gates with this step's gate operator. With no
    /// input B configured the operators degrade to passing input A.
    pub fn evaluate_gate_logic(&self, input_a: bool, input_b: Option<bool>) -> bool {
        match (self.gate_logic(), input_b) {
            (GateLogic::Pass, _) => input_a,
            (GateLogic::Invert, _) => !input_a,
            (_, None) => input_a,
            (GateLogic::And, Some(b)) => input_a && b,
            (GateLogic::Or, Some(b)) => input_a || b,
            (GateLogic::Xor, Some(b)) => input_a != b,
            (GateLogic::Nand, Some(b)) => !(input_a && b),
            (GateLogic::Nor, Some(b)) => !(input_a || b),
        }
    }

    /// Transform the input notes with this step's note operator.
    /// Returns None when the operator filters the step into a rest.
    /// `transpose` is the logic track's own transpose amount.
    pub fn evaluate_note_logic(
        &self,
        note_a: i32,
        input_b: Option<(bool, i32)>,
        transpose: i32,
    ) -> Option<i32> {
        let logic = self.note_logic();
        let Some((gate_b, note_b)) = input_b else {
            return match logic {
                NoteLogic::TransposeA => Some(note_a + transpose),
                _ => Some(note_a),
            };
        };
        match logic {
            NoteLogic::Pass => Some(note_a),
            NoteLogic::TransposeA => Some(note_a + transpose),
            NoteLogic::TransposeB => Some(note_b + transpose),
            NoteLogic::Combine => Some((note_a + note_b) / 2),
            NoteLogic::FilterHigh => (note_a > note_b).then_some(note_a),
            NoteLogic::FilterLow => (note_a < note_b).then_some(note_a),
            NoteLogic::FilterRange => {
                let low = note_a.min(note_b);
                let high = note_a.max(note_b);
                let own = self.note();
                (own >= low && own <= high).then_some(own)
            }
            NoteLogic::Mask => (!gate_b).then_some(note_a),
        }
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u32(self.data0)?;
        writer.write_u32(self.data1)
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.data0 = reader.read_u32()?;
        self.data1 = reader.read_u32()?;
        Ok(())
    }
}

impl Default for LogicStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Logic pattern: step operators plus the two input track references.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicSequence {
    divisor: Routable<u16>,
    run_mode: Routable<u8>,
    first_step: u8,
    last_step: u8,
    reset_measure: u8,
    input_track_a: i8,
    input_track_b: i8,
    note_filter_min: i8,
    note_filter_max: i8,
    steps: [LogicStep; STEP_COUNT],
}

impl LogicSequence {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;

    pub fn new() -> Self {
        Self {
            divisor: Routable::new(Self::DEFAULT_DIVISOR as u16),
            run_mode: Routable::new(RunMode::Forward as u8),
            first_step: 0,
            last_step: (STEP_COUNT - 1) as u8,
            reset_measure: 0,
            input_track_a: -1,
            input_track_b: -1,
            note_filter_min: LogicStep::NOTE_MIN as i8,
            note_filter_max: LogicStep::NOTE_MAX as i8,
            steps: [LogicStep::new(); STEP_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.steps = [LogicStep::new(); STEP_COUNT];
    }

    pub fn steps(&self) -> &[LogicStep; STEP_COUNT] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> &LogicStep {
        &self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn step_mut(&mut self, index: usize) -> &mut LogicStep {
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

    /// Input track A index, None when unassigned.
    pub fn input_track_a(&self) -> Option<usize> {
        (self.input_track_a >= 0).then_some(self.input_track_a as usize)
    }

    pub fn set_input_track_a(&mut self, track: i32) {
        self.input_track_a = track.clamp(-1, TRACK_COUNT as i32 - 1) as i8;
    }

    /// Input track B index, None when unassigned.
    pub fn input_track_b(&self) -> Option<usize> {
        (self.input_track_b >= 0).then_some(self.input_track_b as usize)
    }

    pub fn set_input_track_b(&mut self, track: i32) {
        self.input_track_b = track.clamp(-1, TRACK_COUNT as i32 - 1) as i8;
    }

    pub fn note_filter_min(&self) -> i32 {
        self.note_filter_min as i32
    }

    pub fn set_note_filter_min(&mut self, min: i32) {
        self.note_filter_min = min.clamp(LogicStep::NOTE_MIN, LogicStep::NOTE_MAX) as i8;
        if self.note_filter_min > self.note_filter_max {
            self.note_filter_max = self.note_filter_min;
        }
    }

    pub fn note_filter_max(&self) -> i32 {
        self.note_filter_max as i32
    }

    pub fn set_note_filter_max(&mut self, max: i32) {
        self.note_filter_max = max.clamp(LogicStep::NOTE_MIN, LogicStep::NOTE_MAX) as i8;
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
        writer.write_i8(self.input_track_a)?;
        writer.write_i8(self.input_track_b)?;
        writer.write_i8(self.note_filter_min)?;
        writer.write_i8(self.note_filter_max)?;
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
        self.input_track_a = reader.read_i8()?.clamp(-1, TRACK_COUNT as i8 - 1);
        self.input_track_b = reader.read_i8()?.clamp(-1, TRACK_COUNT as i8 - 1);
        self.note_filter_min = reader.read_i8()?;
        self.note_filter_max = reader.read_i8()?;
        for step in self.steps.iter_mut() {
            step.read(reader)?;
        }
        Ok(())
    }
}

impl Default for LogicSequence {
    fn default() -> Self {
        Self::new()
    }
}
