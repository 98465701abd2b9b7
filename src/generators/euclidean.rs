// Euclidean generator - fills a sequence gate layer with a Bjorklund
// distribution, optionally rotated by an offset.

use crate::config::STEP_COUNT;
use crate::generators::rhythm::{self, Pattern};
use crate::generators::sequence_builder::SequenceBuilder;

pub struct EuclideanGenerator {
    steps: usize,
    beats: usize,
    offset: usize,
    pattern: Pattern,
}

impl EuclideanGenerator {
    pub const DEFAULT_STEPS: usize = 16;
    pub const DEFAULT_BEATS: usize = 4;
    pub const DEFAULT_OFFSET: usize = 0;

    pub fn new() -> Self {
        Self {
            steps: Self::DEFAULT_STEPS,
            beats: Self::DEFAULT_BEATS,
            offset: Self::DEFAULT_OFFSET,
            pattern: Pattern::new(),
        }
    }

    /// Restore default parameters.
    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn set_steps(&mut self, steps: i32) {
        self.steps = steps.clamp(1, STEP_COUNT as i32) as usize;
    }

    pub fn beats(&self) -> usize {
        self.beats
    }

    pub fn set_beats(&mut self, beats: i32) {
        self.beats = beats.clamp(1, STEP_COUNT as i32) as usize;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset.clamp(0, STEP_COUNT as i32 - 1) as usize;
    }

    /// The last generated pattern (offset applied).
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Regenerate and write the gate pattern into the builder.
    pub fn update(&mut self, builder: &mut dyn SequenceBuilder) {
        self.pattern = rhythm::euclidean(self.beats, self.steps).shifted(self.offset);
        builder.set_length(self.steps);
        for i in 0..self.steps {
            builder.set_value(i, if self.pattern.get(i) { 1.0 } else { 0.0 });
        }
    }
}

impl Default for EuclideanGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBuilder {
        values: [f32; STEP_COUNT],
        length: usize,
    }

    impl MockBuilder {
        fn new() -> Self {
            Self {
                values: [0.0; STEP_COUNT],
                length: 0,
            }
        }
    }

    impl SequenceBuilder for MockBuilder {
        fn set_value(&mut self, index: usize, value: f32) {
            if index < STEP_COUNT {
                self.values[index] = value;
            }
        }

        fn set_length(&mut self, length: usize) {
            self.length = length;
        }

        fn revert(&mut self) {}
    }

    #[test]
    fn test_default_parameters() {
        let gen = EuclideanGenerator::new();
        assert_eq!(gen.steps(), 16);
        assert_eq!(gen.beats(), 4);
        assert_eq!(gen.offset(), 0);
    }

    #[test]
    fn test_setter_clamping() {
        let mut gen = EuclideanGenerator::new();

        gen.set_steps(0);
        assert_eq!(gen.steps(), 1);
        gen.set_steps(STEP_COUNT as i32 + 1);
        assert_eq!(gen.steps(), STEP_COUNT);

        gen.set_beats(0);
        assert_eq!(gen.beats(), 1);
        gen.set_beats(STEP_COUNT as i32 + 1);
        assert_eq!(gen.beats(), STEP_COUNT);

        gen.set_offset(-1);
        assert_eq!(gen.offset(), 0);
        gen.set_offset(STEP_COUNT as i32);
        assert_eq!(gen.offset(), STEP_COUNT - 1);
    }

    #[test]
    fn test_four_on_the_floor() {
        let mut gen = EuclideanGenerator::new();
        let mut builder = MockBuilder::new();
        gen.update(&mut builder);

        // E(4, 16): x---x---x---x---
        for i in 0..16 {
            let expected = if i % 4 == 0 { 1.0 } else { 0.0 };
            assert_eq!(builder.values[i], expected, "step {}", i);
        }
        assert_eq!(builder.length, 16);
    }

    #[test]
    fn test_offset_rotates_pattern() {
        let mut gen = EuclideanGenerator::new();
        gen.set_steps(8);
        gen.set_beats(4);

        let mut builder = MockBuilder::new();
        gen.update(&mut builder);
        let original = builder.values;

        gen.set_offset(2);
        gen.update(&mut builder);

        for i in 0..8 {
            assert_eq!(builder.values[i], original[(i + 8 - 2) % 8]);
        }
    }

    #[test]
    fn test_full_rotation_is_identity() {
        let mut gen = EuclideanGenerator::new();
        gen.set_steps(8);
        gen.set_beats(5);

        let mut builder = MockBuilder::new();
        gen.update(&mut builder);
        let original = builder.values;

        gen.set_offset(8 - 1);
        gen.set_offset(0);
        gen.update(&mut builder);
        assert_eq!(builder.values, original);
    }

    #[test]
    fn test_beats_equal_steps_all_on() {
        let mut gen = EuclideanGenerator::new();
        gen.set_steps(8);
        gen.set_beats(8);

        let mut builder = MockBuilder::new();
        gen.update(&mut builder);
        for i in 0..8 {
            assert_eq!(builder.values[i], 1.0);
        }
    }

    #[test]
    fn test_pattern_accessor() {
        let mut gen = EuclideanGenerator::new();
        gen.set_steps(8);
        gen.set_beats(3);

        let mut builder = MockBuilder::new();
        gen.update(&mut builder);
        assert_eq!(gen.pattern().ones(), 3);
    }

    #[test]
    fn test_init_restores_defaults() {
        let mut gen = EuclideanGenerator::new();
        gen.set_steps(8);
        gen.set_beats(3);
        gen.set_offset(4);

        gen.init();
        assert_eq!(gen.steps(), 16);
        assert_eq!(gen.beats(), 4);
        assert_eq!(gen.offset(), 0);
    }
}
