// Note sequence - the standard step sequence with a packed 64-bit
// step record. The bit layout is part of the project stream format;
// steps are written verbatim as two little-endian 32-bit words.

use crate::config::STEP_COUNT;
use crate::model::bitfield::{get_bits, get_signed, set_bits, set_signed};
use crate::model::routable::Routable;
use crate::model::types::{Condition, RunMode};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// Editable step attribute, used by generators and the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLayer {
    Gate,
    GateProbability,
    GateOffset,
    Slide,
    Retrigger,
    RetriggerProbability,
    Length,
    LengthVariationRange,
    LengthVariationProbability,
    Note,
    NoteVariationRange,
    NoteVariationProbability,
    Condition,
    BypassScale,
}

/// One step, packed into two 32-bit words.
///
/// data0: gate:1 gateProbability:7 gateOffset:4s slide:1 retrigger:4
///        retriggerProbability:7 length:4 lengthVariationRange:4s
/// data1: lengthVariationProbability:7 note:7s noteVariationRange:5s
///        noteVariationProbability:7 condition:4 bypassScale:1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    data0: u32,
    data1: u32,
}

impl Step {
    /// Probability fields hold 0..=7, read as (value + 1) / 8.
    pub const PROBABILITY_MAX: i32 = 7;
    pub const GATE_OFFSET_MIN: i32 = -8;
    pub const GATE_OFFSET_MAX: i32 = 7;
    pub const RETRIGGER_MAX: i32 = 15;
    pub const LENGTH_MAX: i32 = 15;
    pub const LENGTH_VARIATION_RANGE_MIN: i32 = -8;
    pub const LENGTH_VARIATION_RANGE_MAX: i32 = 7;
    pub const NOTE_MIN: i32 = -64;
    pub const NOTE_MAX: i32 = 63;
    pub const NOTE_VARIATION_RANGE_MIN: i32 = -16;
    pub const NOTE_VARIATION_RANGE_MAX: i32 = 15;

    pub fn new() -> Self {
        let mut step = Self { data0: 0, data1: 0 };
        step.set_gate_probability(Self::PROBABILITY_MAX);
        step.set_retrigger_probability(Self::PROBABILITY_MAX);
        step.set_length(Self::LENGTH_MAX / 2);
        step.set_length_variation_probability(Self::PROBABILITY_MAX);
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

    pub fn toggle_gate(&mut self) {
        self.set_gate(!self.gate());
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

    pub fn slide(&self) -> bool {
        get_bits(self.data0, 12, 1) != 0
    }

    pub fn set_slide(&mut self, slide: bool) {
        self.data0 = set_bits(self.data0, 12, 1, slide as u32);
    }

    pub fn toggle_slide(&mut self) {
        self.set_slide(!self.slide());
    }

    pub fn retrigger(&self) -> i32 {
        get_bits(self.data0, 13, 4) as i32
    }

    pub fn set_retrigger(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 13, 4, value.clamp(0, Self::RETRIGGER_MAX) as u32);
    }

    pub fn retrigger_probability(&self) -> i32 {
        get_bits(self.data0, 17, 7) as i32
    }

    pub fn set_retrigger_probability(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 17, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn length(&self) -> i32 {
        get_bits(self.data0, 24, 4) as i32
    }

    pub fn set_length(&mut self, value: i32) {
        self.data0 = set_bits(self.data0, 24, 4, value.clamp(0, Self::LENGTH_MAX) as u32);
    }

    pub fn length_variation_range(&self) -> i32 {
        get_signed(self.data0, 28, 4)
    }

    pub fn set_length_variation_range(&mut self, value: i32) {
        self.data0 = set_signed(
            self.data0,
            28,
            4,
            value.clamp(
                Self::LENGTH_VARIATION_RANGE_MIN,
                Self::LENGTH_VARIATION_RANGE_MAX,
            ),
        );
    }

    pub fn length_variation_probability(&self) -> i32 {
        get_bits(self.data1, 0, 7) as i32
    }

    pub fn set_length_variation_probability(&mut self, value: i32) {
        self.data1 = set_bits(self.data1, 0, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn note(&self) -> i32 {
        get_signed(self.data1, 7, 7)
    }

    pub fn set_note(&mut self, value: i32) {
        self.data1 = set_signed(self.data1, 7, 7, value.clamp(Self::NOTE_MIN, Self::NOTE_MAX));
    }

    pub fn note_variation_range(&self) -> i32 {
        get_signed(self.data1, 14, 5)
    }

    pub fn set_note_variation_range(&mut self, value: i32) {
        self.data1 = set_signed(
            self.data1,
            14,
            5,
            value.clamp(
                Self::NOTE_VARIATION_RANGE_MIN,
                Self::NOTE_VARIATION_RANGE_MAX,
            ),
        );
    }

    pub fn note_variation_probability(&self) -> i32 {
        get_bits(self.data1, 19, 7) as i32
    }

    pub fn set_note_variation_probability(&mut self, value: i32) {
        self.data1 = set_bits(self.data1, 19, 7, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn condition(&self) -> Condition {
        Condition::from_u8(get_bits(self.data1, 26, 4) as u8)
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.data1 = set_bits(self.data1, 26, 4, condition as u32);
    }

    pub fn bypass_scale(&self) -> bool {
        get_bits(self.data1, 30, 1) != 0
    }

    pub fn set_bypass_scale(&mut self, bypass: bool) {
        self.data1 = set_bits(self.data1, 30, 1, bypass as u32);
    }

    pub fn layer_value(&self, layer: NoteLayer) -> i32 {
        match layer {
            NoteLayer::Gate => self.gate() as i32,
            NoteLayer::GateProbability => self.gate_probability(),
            NoteLayer::GateOffset => self.gate_offset(),
            NoteLayer::Slide => self.slide() as i32,
            NoteLayer::Retrigger => self.retrigger(),
            NoteLayer::RetriggerProbability => self.retrigger_probability(),
            NoteLayer::Length => self.length(),
            NoteLayer::LengthVariationRange => self.length_variation_range(),
            NoteLayer::LengthVariationProbability => self.length_variation_probability(),
            NoteLayer::Note => self.note(),
            NoteLayer::NoteVariationRange => self.note_variation_range(),
            NoteLayer::NoteVariationProbability => self.note_variation_probability(),
            NoteLayer::Condition => self.condition() as i32,
            NoteLayer::BypassScale => self.bypass_scale() as i32,
        }
    }

    pub fn set_layer_value(&mut self, layer: NoteLayer, value: i32) {
        match layer {
            NoteLayer::Gate => self.set_gate(value != 0),
            NoteLayer::GateProbability => self.set_gate_probability(value),
            NoteLayer::GateOffset => self.set_gate_offset(value),
            NoteLayer::Slide => self.set_slide(value != 0),
            NoteLayer::Retrigger => self.set_retrigger(value),
            NoteLayer::RetriggerProbability => self.set_retrigger_probability(value),
            NoteLayer::Length => self.set_length(value),
            NoteLayer::LengthVariationRange => self.set_length_variation_range(value),
            NoteLayer::LengthVariationProbability => self.set_length_variation_probability(value),
            NoteLayer::Note => self.set_note(value),
            NoteLayer::NoteVariationRange => self.set_note_variation_range(value),
            NoteLayer::NoteVariationProbability => self.set_note_variation_probability(value),
            NoteLayer::Condition => self.set_condition(Condition::from_u8(value.clamp(0, 15) as u8)),
            NoteLayer::BypassScale => self.set_bypass_scale(value != 0),
        }
    }

    // packed words are emitted verbatim
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

impl Default for Step {
    fn default() -> Self {
        Self::new()
    }
}

/// A pattern's worth of steps with its playback parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSequence {
    scale: Routable<u8>,
    root_note: Routable<u8>,
    divisor: Routable<u16>,
    run_mode: Routable<u8>,
    first_step: u8,
    last_step: u8,
    reset_measure: u8,
    steps: [Step; STEP_COUNT],
}

impl NoteSequence {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;
    pub const RESET_MEASURE_MAX: i32 = 128;

    pub fn new() -> Self {
        Self {
            scale: Routable::new(0),
            root_note: Routable::new(0),
            divisor: Routable::new(Self::DEFAULT_DIVISOR as u16),
            run_mode: Routable::new(RunMode::Forward as u8),
            first_step: 0,
            last_step: (STEP_COUNT - 1) as u8,
            reset_measure: 0,
            steps: [Step::new(); STEP_COUNT],
        }
    }

    /// Reset all steps. Sequence parameters are left alone.
    pub fn clear(&mut self) {
        self.steps = [Step::new(); STEP_COUNT];
    }

    pub fn steps(&self) -> &[Step; STEP_COUNT] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [Step; STEP_COUNT] {
        &mut self.steps
    }

    pub fn step(&self, index: usize) -> &Step {
        &self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn step_mut(&mut self, index: usize) -> &mut Step {
        &mut self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn scale(&self) -> u8 {
        self.scale.get()
    }

    pub fn set_scale(&mut self, scale: i32) {
        self.scale.set(scale.clamp(0, u8::MAX as i32) as u8);
    }

    pub fn set_scale_routed(&mut self, scale: i32) {
        self.scale.set_routed(scale.clamp(0, u8::MAX as i32) as u8);
    }

    pub fn root_note(&self) -> i32 {
        self.root_note.get() as i32
    }

    pub fn set_root_note(&mut self, root: i32) {
        self.root_note.set(root.clamp(0, 11) as u8);
    }

    pub fn set_root_note_routed(&mut self, root: i32) {
        self.root_note.set_routed(root.clamp(0, 11) as u8);
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

    pub fn set_run_mode_routed(&mut self, mode: RunMode) {
        self.run_mode.set_routed(mode as u8);
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
        self.reset_measure = measure.clamp(0, Self::RESET_MEASURE_MAX) as u8;
    }

    /// Value range of a layer, used to scale generator output.
    pub fn layer_range(layer: NoteLayer) -> (i32, i32) {
        match layer {
            NoteLayer::Gate | NoteLayer::Slide | NoteLayer::BypassScale => (0, 1),
            NoteLayer::GateProbability
            | NoteLayer::RetriggerProbability
            | NoteLayer::LengthVariationProbability
            | NoteLayer::NoteVariationProbability => (0, Step::PROBABILITY_MAX),
            NoteLayer::GateOffset => (Step::GATE_OFFSET_MIN, Step::GATE_OFFSET_MAX),
            NoteLayer::Retrigger => (0, Step::RETRIGGER_MAX),
            NoteLayer::Length => (0, Step::LENGTH_MAX),
            NoteLayer::LengthVariationRange => (
                Step::LENGTH_VARIATION_RANGE_MIN,
                Step::LENGTH_VARIATION_RANGE_MAX,
            ),
            NoteLayer::Note => (Step::NOTE_MIN, Step::NOTE_MAX),
            NoteLayer::NoteVariationRange => (
                Step::NOTE_VARIATION_RANGE_MIN,
                Step::NOTE_VARIATION_RANGE_MAX,
            ),
            NoteLayer::Condition => (0, 15),
        }
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_u8(self.scale.local())?;
        writer.write_u8(self.root_note.local())?;
        writer.write_u16(self.divisor.local())?;
        writer.write_u8(self.run_mode.local())?;
        writer.write_u8(self.first_step)?;
        writer.write_u8(self.last_step)?;
        writer.write_u8(self.reset_measure)?;
        for step in &self.steps {
            step.write(writer)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.scale.set(reader.read_u8()?);
        self.root_note.set(reader.read_u8()?.min(11));
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
        for step in self.steps.iter_mut() {
            step.read(reader)?;
        }
        Ok(())
    }
}

impl Default for NoteSequence {
    fn default() -> Self {
        Self::new()
    }
}
