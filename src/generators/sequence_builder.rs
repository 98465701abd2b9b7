// Sequence builder - the write interface generators use to fill
// sequence layers without knowing the track variant behind them.

use crate::config::STEP_COUNT;
use crate::model::note_sequence::{NoteLayer, NoteSequence, Step};

/// Callback surface a generator writes through.
///
/// `set_value` takes normalized values in [0, 1]; the builder scales
/// them into the target layer's range. `revert` restores the sequence
/// content captured when the builder was created.
pub trait SequenceBuilder {
    fn set_value(&mut self, index: usize, value: f32);
    fn set_length(&mut self, length: usize);
    fn revert(&mut self);
}

/// Builder writing one layer of a note-family sequence.
pub struct NoteSequenceBuilder<'a> {
    sequence: &'a mut NoteSequence,
    layer: NoteLayer,
    snapshot: [Step; STEP_COUNT],
}

impl<'a> NoteSequenceBuilder<'a> {
    pub fn new(sequence: &'a mut NoteSequence, layer: NoteLayer) -> Self {
        let snapshot = *sequence.steps();
        Self {
            sequence,
            layer,
            snapshot,
        }
    }
}

impl SequenceBuilder for NoteSequenceBuilder<'_> {
    fn set_value(&mut self, index: usize, value: f32) {
        if index >= STEP_COUNT {
            return;
        }
        let (min, max) = NoteSequence::layer_range(self.layer);
        let value = value.clamp(0.0, 1.0);
        let scaled = min + (value * (max - min) as f32).round() as i32;
        self.sequence
            .step_mut(index)
            .set_layer_value(self.layer, scaled);
    }

    fn set_length(&mut self, length: usize) {
        let length = length.clamp(1, STEP_COUNT);
        self.sequence.set_first_step(0);
        self.sequence.set_last_step(length as i32 - 1);
    }

    fn revert(&mut self) {
        *self.sequence.steps_mut() = self.snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_layer_written_from_normalized_values() {
        let mut sequence = NoteSequence::new();
        let mut builder = NoteSequenceBuilder::new(&mut sequence, NoteLayer::Gate);

        builder.set_value(0, 1.0);
        builder.set_value(1, 0.0);
        builder.set_value(2, 1.0);
        builder.set_length(8);

        assert!(sequence.step(0).gate());
        assert!(!sequence.step(1).gate());
        assert!(sequence.step(2).gate());
        assert_eq!(sequence.first_step(), 0);
        assert_eq!(sequence.last_step(), 7);
    }

    #[test]
    fn test_revert_restores_snapshot() {
        let mut sequence = NoteSequence::new();
        sequence.step_mut(3).set_gate(true);
        sequence.step_mut(3).set_note(12);

        let mut builder = NoteSequenceBuilder::new(&mut sequence, NoteLayer::Gate);
        builder.set_value(3, 0.0);
        builder.set_value(5, 1.0);
        builder.revert();

        assert!(sequence.step(3).gate());
        assert_eq!(sequence.step(3).note(), 12);
        assert!(!sequence.step(5).gate());
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let mut sequence = NoteSequence::new();
        let mut builder = NoteSequenceBuilder::new(&mut sequence, NoteLayer::Gate);
        builder.set_value(STEP_COUNT, 1.0);
        assert!(sequence.steps().iter().all(|s| !s.gate()));
    }
}
