// Stochastic sequence - note-style steps extended with a per-step
// octave, plus sequence-level rest probabilities, loop bounds with a
// reseedable generator and an octave range constraint.

use crate::config::STEP_COUNT;
use crate::model::bitfield::{get_bits, get_signed, set_bits, set_signed};
use crate::model::routable::Routable;
use crate::model::types::{Condition, RunMode};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// One stochastic step, packed into two 32-bit words.
///
/// data0 matches the note step layout. data1 narrows the length
/// variation probability to 3 bits (the full 0..=7 value range still
/// fits) to make room for the per-step octave:
/// data1: lengthVariationProbability:3 note:7s noteVariationRange:5s
///        noteVariationProbability:7 octave:4s condition:4 bypassScale:1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticStep {
    data0: u32,
    data1: u32,
}

impl StochasticStep {
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
    pub const OCTAVE_MIN: i32 = -5;
    pub const OCTAVE_MAX: i32 = 5;

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
        get_bits(self.data1, 0, 3) as i32
    }

    pub fn set_length_variation_probability(&mut self, value: i32) {
        self.data1 = set_bits(self.data1, 0, 3, value.clamp(0, Self::PROBABILITY_MAX) as u32);
    }

    pub fn note(&self) -> i32 {
        get_signed(self.data1, 3, 7)
    }

    pub fn set_note(&mut self, value: i32) {
        self.data1 = set_signed(self.data1, 3, 7, value.clamp(Self::NOTE_MIN, Self::NOTE_MAX));
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

    pub fn octave(&self) -> i32 {
        get_signed(self.data1, 22, 4)
    }

    pub fn set_octave(&mut self, value: i32) {
        self.data1 = set_signed(
            self.data1,
            22,
            4,
            value.clamp(Self::OCTAVE_MIN, Self::OCTAVE_MAX),
        );
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

impl Default for StochasticStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Stochastic pattern with rest probabilities and a reseedable loop.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSequence {
    scale: Routable<u8>,
    root_note: Routable<u8>,
    divisor: Routable<u16>,
    run_mode: Routable<u8>,
    first_step: u8,
    last_step: u8,
    reset_measure: u8,
    rest_probability_2: u8,
    rest_probability_4: u8,
    rest_probability_8: u8,
    rest_probability_15: u8,
    use_loop: bool,
    loop_first_step: u8,
    loop_last_step: u8,
    seed: u16,
    octave_range_low: i8,
    octave_range_high: i8,
    steps: [StochasticStep; STEP_COUNT],
}

impl StochasticSequence {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;
    pub const REST_PROBABILITY_MAX: i32 = 100;
    pub const SEED_MAX: i32 = 1000;
    pub const OCTAVE_RANGE_MIN: i32 = -5;
    pub const OCTAVE_RANGE_MAX: i32 = 5;

    pub fn new() -> Self {
        Self {
            scale: Routable::new(0),
            root_note: Routable::new(0),
            divisor: Routable::new(Self::DEFAULT_DIVISOR as u16),
            run_mode: Routable::new(RunMode::Forward as u8),
            first_step: 0,
            last_step: (STEP_COUNT - 1) as u8,
            reset_measure: 0,
            rest_probability_2: 0,
            rest_probability_4: 0,
            rest_probability_8: 0,
            rest_probability_15: 0,
            use_loop: false,
            loop_first_step: 0,
            loop_last_step: (STEP_COUNT - 1) as u8,
            seed: 0,
            octave_range_low: Self::OCTAVE_RANGE_MIN as i8,
            octave_range_high: Self::OCTAVE_RANGE_MAX as i8,
            steps: [StochasticStep::new(); STEP_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.steps = [StochasticStep::new(); STEP_COUNT];
    }

    pub fn steps(&self) -> &[StochasticStep; STEP_COUNT] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> &StochasticStep {
        &self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn step_mut(&mut self, index: usize) -> &mut StochasticStep {
        &mut self.steps[index.min(STEP_COUNT - 1)]
    }

    pub fn scale(&self) -> u8 {
        self.scale.get()
    }

    pub fn set_scale(&mut self, scale: i32) {
        self.scale.set(scale.clamp(0, u8::MAX as i32) as u8);
    }

    pub fn root_note(&self) -> i32 {
        self.root_note.get() as i32
    }

    pub fn set_root_note(&mut self, root: i32) {
        self.root_note.set(root.clamp(0, 11) as u8);
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

    pub fn rest_probability_2(&self) -> i32 {
        self.rest_probability_2 as i32
    }

    pub fn set_rest_probability_2(&mut self, value: i32) {
        self.rest_probability_2 = value.clamp(0, Self::REST_PROBABILITY_MAX) as u8;
    }

    pub fn rest_probability_4(&self) -> i32 {
        self.rest_probability_4 as i32
    }

    pub fn set_rest_probability_4(&mut self, value: i32) {
        self.rest_probability_4 = value.clamp(0, Self::REST_PROBABILITY_MAX) as u8;
    }

    pub fn rest_probability_8(&self) -> i32 {
        self.rest_probability_8 as i32
    }

    pub fn set_rest_probability_8(&mut self, value: i32) {
        self.rest_probability_8 = value.clamp(0, Self::REST_PROBABILITY_MAX) as u8;
    }

    pub fn rest_probability_15(&self) -> i32 {
        self.rest_probability_15 as i32
    }

    pub fn set_rest_probability_15(&mut self, value: i32) {
        self.rest_probability_15 = value.clamp(0, Self::REST_PROBABILITY_MAX) as u8;
    }

    pub fn use_loop(&self) -> bool {
        self.use_loop
    }

    pub fn set_use_loop(&mut self, value: bool) {
        self.use_loop = value;
    }

    pub fn loop_first_step(&self) -> usize {
        self.loop_first_step as usize
    }

    pub fn set_loop_first_step(&mut self, step: i32) {
        self.loop_first_step = step.clamp(0, self.loop_last_step as i32) as u8;
    }

    pub fn loop_last_step(&self) -> usize {
        self.loop_last_step as usize
    }

    pub fn set_loop_last_step(&mut self, step: i32) {
        self.loop_last_step =
            step.clamp(self.loop_first_step as i32, STEP_COUNT as i32 - 1) as u8;
    }

    /// Seed the engine restores on reseed.
    pub fn seed(&self) -> u32 {
        self.seed as u32
    }

    pub fn set_seed(&mut self, seed: i32) {
        self.seed = seed.clamp(0, Self::SEED_MAX) as u16;
    }

    pub fn octave_range_low(&self) -> i32 {
        self.octave_range_low as i32
    }

    pub fn set_octave_range_low(&mut self, octave: i32) {
        self.octave_range_low =
            octave.clamp(Self::OCTAVE_RANGE_MIN, Self::OCTAVE_RANGE_MAX) as i8;
        if self.octave_range_low > self.octave_range_high {
            self.octave_range_high = self.octave_range_low;
        }
    }

    pub fn octave_range_high(&self) -> i32 {
        self.octave_range_high as i32
    }

    pub fn set_octave_range_high(&mut self, octave: i32) {
        self.octave_range_high =
            octave.clamp(Self::OCTAVE_RANGE_MIN, Self::OCTAVE_RANGE_MAX) as i8;
        if self.octave_range_high < self.octave_range_low {
            self.octave_range_low = self.octave_range_high;
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
        writer.write_u8(self.rest_probability_2)?;
        writer.write_u8(self.rest_probability_4)?;
        writer.write_u8(self.rest_probability_8)?;
        writer.write_u8(self.rest_probability_15)?;
        writer.write_bool(self.use_loop)?;
        writer.write_u8(self.loop_first_step)?;
        writer.write_u8(self.loop_last_step)?;
        writer.write_u16(self.seed)?;
        writer.write_i8(self.octave_range_low)?;
        writer.write_i8(self.octave_range_high)?;
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
        self.rest_probability_2 = reader.read_u8()?.min(100);
        self.rest_probability_4 = reader.read_u8()?.min(100);
        self.rest_probability_8 = reader.read_u8()?.min(100);
        self.rest_probability_15 = reader.read_u8()?.min(100);
        self.use_loop = reader.read_bool()?;
        self.loop_last_step = (STEP_COUNT - 1) as u8;
        self.loop_first_step = reader.read_u8()?.min((STEP_COUNT - 1) as u8);
        self.loop_last_step = reader
            .read_u8()?
            .clamp(self.loop_first_step, (STEP_COUNT - 1) as u8);
        self.seed = reader.read_u16()?.min(Self::SEED_MAX as u16);
        self.octave_range_low = reader.read_i8()?;
        self.octave_range_high = reader.read_i8()?;
        for step in self.steps.iter_mut() {
            step.read(reader)?;
        }
        Ok(())
    }
}

impl Default for StochasticSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults() {
        let step = StochasticStep::new();
        assert!(!step.gate());
        assert_eq!(step.gate_probability(), StochasticStep::PROBABILITY_MAX);
        assert_eq!(step.length(), StochasticStep::LENGTH_MAX / 2);
        assert_eq!(step.octave(), 0);
        assert_eq!(step.condition(), Condition::Off);
    }

    #[test]
    fn test_octave_clamping() {
        let mut step = StochasticStep::new();
        step.set_octave(3);
        assert_eq!(step.octave(), 3);
        step.set_octave(-3);
        assert_eq!(step.octave(), -3);
        step.set_octave(7);
        assert_eq!(step.octave(), StochasticStep::OCTAVE_MAX);
        step.set_octave(-7);
        assert_eq!(step.octave(), StochasticStep::OCTAVE_MIN);
    }

    #[test]
    fn test_length_variation_probability_narrow_field() {
        let mut step = StochasticStep::new();
        // narrowed to 3 bits, the full 0..=7 range must survive
        for value in 0..=7 {
            step.set_length_variation_probability(value);
            assert_eq!(step.length_variation_probability(), value);
        }
        step.set_length_variation_probability(8);
        assert_eq!(step.length_variation_probability(), 7);
    }

    #[test]
    fn test_note_independent_of_octave() {
        let mut step = StochasticStep::new();
        step.set_note(-30);
        step.set_octave(4);
        assert_eq!(step.note(), -30);
        assert_eq!(step.octave(), 4);
    }

    #[test]
    fn test_rest_probability_clamping() {
        let mut sequence = StochasticSequence::new();
        sequence.set_rest_probability_2(150);
        assert_eq!(sequence.rest_probability_2(), 100);
        sequence.set_rest_probability_4(-5);
        assert_eq!(sequence.rest_probability_4(), 0);
        sequence.set_rest_probability_8(42);
        assert_eq!(sequence.rest_probability_8(), 42);
        sequence.set_rest_probability_15(100);
        assert_eq!(sequence.rest_probability_15(), 100);
    }

    #[test]
    fn test_loop_bounds_invariant() {
        let mut sequence = StochasticSequence::new();
        sequence.set_loop_first_step(8);
        sequence.set_loop_last_step(24);
        assert_eq!(sequence.loop_first_step(), 8);
        assert_eq!(sequence.loop_last_step(), 24);

        sequence.set_loop_first_step(30);
        assert_eq!(sequence.loop_first_step(), 24);
        sequence.set_loop_last_step(4);
        assert_eq!(sequence.loop_last_step(), 24);
    }

    #[test]
    fn test_octave_range_drag_along() {
        let mut sequence = StochasticSequence::new();
        sequence.set_octave_range_high(3);
        sequence.set_octave_range_low(-2);
        assert_eq!(sequence.octave_range_low(), -2);
        assert_eq!(sequence.octave_range_high(), 3);

        // raising low past high drags high along
        sequence.set_octave_range_low(4);
        assert_eq!(sequence.octave_range_low(), 4);
        assert_eq!(sequence.octave_range_high(), 4);

        // dropping high past low drags low along
        sequence.set_octave_range_high(-1);
        assert_eq!(sequence.octave_range_low(), -1);
        assert_eq!(sequence.octave_range_high(), -1);
    }

    #[test]
    fn test_seed_clamping() {
        let mut sequence = StochasticSequence::new();
        sequence.set_seed(500);
        assert_eq!(sequence.seed(), 500);
        sequence.set_seed(2000);
        assert_eq!(sequence.seed(), 1000);
        sequence.set_seed(-1);
        assert_eq!(sequence.seed(), 0);
    }

    #[test]
    fn test_round_trip() {
        use std::io::Cursor;

        let mut original = StochasticSequence::new();
        original.set_rest_probability_2(50);
        original.set_rest_probability_15(75);
        original.set_use_loop(true);
        original.set_loop_first_step(4);
        original.set_loop_last_step(11);
        original.set_seed(123);
        original.set_octave_range_high(2);
        original.step_mut(3).set_gate(true);
        original.step_mut(3).set_octave(2);

        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            original.write(&mut writer).unwrap();
            writer.finish().unwrap();
        }

        let mut read_back = StochasticSequence::new();
        let mut cursor = Cursor::new(buffer);
        {
            let mut reader = VersionedReader::new(&mut cursor).unwrap();
            read_back.read(&mut reader).unwrap();
            reader.finish().unwrap();
        }

        assert_eq!(read_back, original);
    }
}
