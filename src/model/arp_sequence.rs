// Arp sequence - the note pool and per-step articulation for an arp
// track. Steps reuse the note step record: gated steps define the
// pool, probability and length still articulate each emitted note.

use crate::config::STEP_COUNT;
use crate::model::note_sequence::Step;
use crate::model::routable::Routable;
use crate::model::types::RunMode;
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

#[derive(Debug, Clone, PartialEq)]
pub struct ArpSequence {
    scale: Routable<u8>,
    root_note: Routable<u8>,
    divisor: Routable<u16>,
    run_mode: Routable<u8>,
    first_step: u8,
    last_step: u8,
    reset_measure: u8,
    steps: [Step; STEP_COUNT],
}

impl ArpSequence {
    pub const DIVISOR_MIN: i32 = 1;
    pub const DIVISOR_MAX: i32 = 192;
    pub const DEFAULT_DIVISOR: i32 = 12;

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

    pub fn clear(&mut self) {
        self.steps = [Step::new(); STEP_COUNT];
    }

    pub fn steps(&self) -> &[Step; STEP_COUNT] {
        &self.steps
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

impl Default for ArpSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sequence = ArpSequence::new();
        assert_eq!(sequence.divisor(), 12);
        assert_eq!(sequence.first_step(), 0);
        assert_eq!(sequence.last_step(), STEP_COUNT - 1);
    }

    #[test]
    fn test_note_pool_definition() {
        let mut sequence = ArpSequence::new();
        sequence.step_mut(0).set_gate(true);
        sequence.step_mut(0).set_note(0);
        sequence.step_mut(1).set_gate(true);
        sequence.step_mut(1).set_note(4);
        sequence.step_mut(2).set_gate(true);
        sequence.step_mut(2).set_note(7);

        let pool: Vec<i32> = sequence
            .steps()
            .iter()
            .filter(|s| s.gate())
            .map(|s| s.note())
            .collect();
        assert_eq!(pool, vec![0, 4, 7]);
    }

    #[test]
    fn test_round_trip() {
        use std::io::Cursor;

        let mut original = ArpSequence::new();
        original.set_divisor(6);
        original.step_mut(0).set_gate(true);
        original.step_mut(0).set_note(12);

        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            original.write(&mut writer).unwrap();
            writer.finish().unwrap();
        }

        let mut read_back = ArpSequence::new();
        let mut cursor = Cursor::new(buffer);
        {
            let mut reader = VersionedReader::new(&mut cursor).unwrap();
            read_back.read(&mut reader).unwrap();
            reader.finish().unwrap();
        }

        assert_eq!(read_back, original);
    }
}
