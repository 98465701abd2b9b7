// Random generator - deterministic noise with smoothing, scale and
// bias shaping. Identical parameters always produce identical output.

use crate::config::STEP_COUNT;
use crate::engine::rng::Rng;
use crate::generators::sequence_builder::SequenceBuilder;

pub struct RandomGenerator {
    seed: u16,
    smooth: u8,
    bias: i8,
    scale: u8,
    values: [f32; STEP_COUNT],
}

impl RandomGenerator {
    pub const SEED_MAX: u16 = 1000;
    pub const SMOOTH_MAX: u8 = 10;
    pub const BIAS_RANGE: i8 = 10;
    pub const SCALE_MAX: u8 = 100;
    pub const DEFAULT_SCALE: u8 = 10;

    pub fn new() -> Self {
        Self {
            seed: 0,
            smooth: 0,
            bias: 0,
            scale: Self::DEFAULT_SCALE,
            values: [0.0; STEP_COUNT],
        }
    }

    /// Restore default parameters.
    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn seed(&self) -> u16 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: i32) {
        self.seed = seed.clamp(0, Self::SEED_MAX as i32) as u16;
    }

    pub fn smooth(&self) -> u8 {
        self.smooth
    }

    pub fn set_smooth(&mut self, smooth: i32) {
        self.smooth = smooth.clamp(0, Self::SMOOTH_MAX as i32) as u8;
    }

    pub fn bias(&self) -> i8 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: i32) {
        self.bias = bias.clamp(-(Self::BIAS_RANGE as i32), Self::BIAS_RANGE as i32) as i8;
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: i32) {
        self.scale = scale.clamp(0, Self::SCALE_MAX as i32) as u8;
    }

    /// The last generated values.
    pub fn values(&self) -> &[f32; STEP_COUNT] {
        &self.values
    }

    /// Regenerate and write values into the builder.
    pub fn update(&mut self, builder: &mut dyn SequenceBuilder) {
        let mut rng = Rng::with_seed(self.seed as u32);
        for value in self.values.iter_mut() {
            *value = rng.next_f32();
        }

        // each smoothing pass is a three-point moving average with the
        // edges clamped
        for _ in 0..self.smooth {
            let prev = self.values;
            for i in 0..STEP_COUNT {
                let a = prev[i.saturating_sub(1)];
                let b = prev[i];
                let c = prev[(i + 1).min(STEP_COUNT - 1)];
                self.values[i] = (a + b + c) / 3.0;
            }
        }

        let scale = self.scale as f32 / Self::SCALE_MAX as f32;
        let bias = self.bias as f32 / Self::BIAS_RANGE as f32 * 0.5;
        for (i, value) in self.values.iter_mut().enumerate() {
            *value = (0.5 + (*value - 0.5) * scale + bias).clamp(0.0, 1.0);
            builder.set_value(i, *value);
        }
        builder.set_length(STEP_COUNT);
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}
