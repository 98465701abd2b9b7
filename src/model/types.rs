// Shared model types - conditions, run modes, ports and the small
// enums the track variants have in common.

/// Conditional playback rule for a step. Fits a 4-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Condition {
    #[default]
    Off = 0,
    Fill = 1,
    NotFill = 2,
    Pre = 3,
    NotPre = 4,
    First = 5,
    NotFirst = 6,
    Loop1of2 = 7,
    Loop2of2 = 8,
    Loop1of3 = 9,
    Loop2of3 = 10,
    Loop3of3 = 11,
    Loop1of4 = 12,
    Loop2of4 = 13,
    Loop3of4 = 14,
    Loop4of4 = 15,
}

/// State a condition is evaluated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionState {
    /// Fill active (global latch or per-track).
    pub fill: bool,
    /// Whether the previously evaluated step of this track played.
    pub pre: bool,
    /// Loop iteration counter of this track (0 on the first pass).
    pub iteration: u32,
}

impl Condition {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Fill,
            2 => Self::NotFill,
            3 => Self::Pre,
            4 => Self::NotPre,
            5 => Self::First,
            6 => Self::NotFirst,
            7 => Self::Loop1of2,
            8 => Self::Loop2of2,
            9 => Self::Loop1of3,
            10 => Self::Loop2of3,
            11 => Self::Loop3of3,
            12 => Self::Loop1of4,
            13 => Self::Loop2of4,
            14 => Self::Loop3of4,
            15 => Self::Loop4of4,
            _ => Self::Off,
        }
    }

    /// Whether a step with this condition plays in the given state.
    pub fn evaluate(self, state: &ConditionState) -> bool {
        match self {
            Self::Off => true,
            Self::Fill => state.fill,
            Self::NotFill => !state.fill,
            Self::Pre => state.pre,
            Self::NotPre => !state.pre,
            Self::First => state.iteration == 0,
            Self::NotFirst => state.iteration != 0,
            Self::Loop1of2 => state.iteration % 2 == 0,
            Self::Loop2of2 => state.iteration % 2 == 1,
            Self::Loop1of3 => state.iteration % 3 == 0,
            Self::Loop2of3 => state.iteration % 3 == 1,
            Self::Loop3of3 => state.iteration % 3 == 2,
            Self::Loop1of4 => state.iteration % 4 == 0,
            Self::Loop2of4 => state.iteration % 4 == 1,
            Self::Loop3of4 => state.iteration % 4 == 2,
            Self::Loop4of4 => state.iteration % 4 == 3,
        }
    }
}

/// Step traversal order within [first_step, last_step].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RunMode {
    #[default]
    Forward = 0,
    Backward = 1,
    PingPong = 2,
    Random = 3,
    RandomWalk = 4,
}

impl RunMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Backward,
            2 => Self::PingPong,
            3 => Self::Random,
            4 => Self::RandomWalk,
            _ => Self::Forward,
        }
    }
}

/// Pattern change alignment for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PlayMode {
    /// Pattern changes latch to the next bar boundary.
    #[default]
    Aligned = 0,
    /// Pattern changes apply immediately.
    Free = 1,
}

impl PlayMode {
    pub fn from_u8(value: u8) -> Self {
        if value == 1 {
            Self::Free
        } else {
            Self::Aligned
        }
    }
}

/// How the fill state affects a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FillMode {
    #[default]
    None = 0,
    /// All gates play while fill is active.
    Gates = 1,
    /// The next pattern plays while fill is active.
    NextPattern = 2,
    /// Fill only affects step conditions.
    Condition = 3,
}

impl FillMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Gates,
            2 => Self::NextPattern,
            3 => Self::Condition,
            _ => Self::None,
        }
    }
}

/// When a track refreshes its CV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CvUpdateMode {
    /// Update CV only when a gate fires.
    #[default]
    Gate = 0,
    /// Update CV on every step.
    Always = 1,
}

impl CvUpdateMode {
    pub fn from_u8(value: u8) -> Self {
        if value == 1 {
            Self::Always
        } else {
            Self::Gate
        }
    }
}

/// Physical MIDI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MidiPort {
    #[default]
    Midi = 0,
    Usb = 1,
}

impl MidiPort {
    pub fn from_u8(value: u8) -> Self {
        if value == 1 {
            Self::Usb
        } else {
            Self::Midi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_off_always_plays() {
        let state = ConditionState::default();
        assert!(Condition::Off.evaluate(&state));
    }

    #[test]
    fn test_condition_fill() {
        let mut state = ConditionState::default();
        assert!(!Condition::Fill.evaluate(&state));
        assert!(Condition::NotFill.evaluate(&state));

        state.fill = true;
        assert!(Condition::Fill.evaluate(&state));
        assert!(!Condition::NotFill.evaluate(&state));
    }

    #[test]
    fn test_condition_pre() {
        let mut state = ConditionState::default();
        assert!(!Condition::Pre.evaluate(&state));
        state.pre = true;
        assert!(Condition::Pre.evaluate(&state));
        assert!(!Condition::NotPre.evaluate(&state));
    }

    #[test]
    fn test_condition_first() {
        let mut state = ConditionState::default();
        assert!(Condition::First.evaluate(&state));
        state.iteration = 1;
        assert!(!Condition::First.evaluate(&state));
        assert!(Condition::NotFirst.evaluate(&state));
    }

    #[test]
    fn test_condition_loop_counters() {
        let mut state = ConditionState::default();

        // 2:4 plays on the second pass of every four
        for iteration in 0..8 {
            state.iteration = iteration;
            assert_eq!(
                Condition::Loop2of4.evaluate(&state),
                iteration % 4 == 1,
                "iteration {}",
                iteration
            );
        }
    }

    #[test]
    fn test_condition_round_trip() {
        for value in 0..16u8 {
            assert_eq!(Condition::from_u8(value) as u8, value);
        }
    }

    #[test]
    fn test_run_mode_round_trip() {
        for value in 0..5u8 {
            assert_eq!(RunMode::from_u8(value) as u8, value);
        }
        // out of range falls back to Forward
        assert_eq!(RunMode::from_u8(200), RunMode::Forward);
    }
}
