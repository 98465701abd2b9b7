// Song - a linear chain of slots, each naming a pattern per track and
// a repeat count. Slot transitions align to bar boundaries.

use crate::config::{NAME_LENGTH, SEQUENCE_COUNT, SONG_SLOT_COUNT, TRACK_COUNT};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongSlot {
    patterns: [u8; TRACK_COUNT],
    repeats: u8,
}

impl SongSlot {
    pub const REPEATS_MAX: i32 = 99;

    fn new() -> Self {
        Self {
            patterns: [0; TRACK_COUNT],
            repeats: 1,
        }
    }

    pub fn pattern(&self, track: usize) -> usize {
        self.patterns[track.min(TRACK_COUNT - 1)] as usize
    }

    pub fn set_pattern(&mut self, track: usize, pattern: i32) {
        if track < TRACK_COUNT {
            self.patterns[track] = pattern.clamp(0, SEQUENCE_COUNT as i32 - 1) as u8;
        }
    }

    pub fn repeats(&self) -> u32 {
        self.repeats as u32
    }

    pub fn set_repeats(&mut self, repeats: i32) {
        self.repeats = repeats.clamp(1, Self::REPEATS_MAX) as u8;
    }
}

impl Default for SongSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    name: String,
    slots: [SongSlot; SONG_SLOT_COUNT],
    length: u8,
}

impl Song {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            slots: [SongSlot::new(); SONG_SLOT_COUNT],
            length: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.chars().take(NAME_LENGTH).collect();
    }

    /// Total slot capacity.
    pub fn slot_count(&self) -> usize {
        SONG_SLOT_COUNT
    }

    /// Number of slots in the active chain.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    pub fn set_length(&mut self, length: i32) {
        self.length = length.clamp(0, SONG_SLOT_COUNT as i32) as u8;
    }

    pub fn slot(&self, index: usize) -> &SongSlot {
        &self.slots[index.min(SONG_SLOT_COUNT - 1)]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut SongSlot {
        &mut self.slots[index.min(SONG_SLOT_COUNT - 1)]
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_name(&self.name)?;
        writer.write_u8(self.length)?;
        for slot in &self.slots {
            for track in 0..TRACK_COUNT {
                writer.write_u8(slot.patterns[track])?;
            }
            writer.write_u8(slot.repeats)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.name = reader.read_name()?;
        self.length = reader.read_u8()?.min(SONG_SLOT_COUNT as u8);
        for slot in self.slots.iter_mut() {
            for track in 0..TRACK_COUNT {
                slot.patterns[track] = reader.read_u8()?.min(SEQUENCE_COUNT as u8 - 1);
            }
            slot.repeats = reader.read_u8()?.clamp(1, SongSlot::REPEATS_MAX as u8);
        }
        Ok(())
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}
