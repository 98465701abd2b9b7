// Compile-time configuration
// Every collection in the core is sized by these constants; there is no
// dynamic growth in the engine path.

/// Sequencer resolution in pulses per quarter note.
pub const PPQN: u32 = 96;

/// Steps per sequence.
pub const STEP_COUNT: usize = 64;

/// Tracks per project.
pub const TRACK_COUNT: usize = 8;

/// Sequences (patterns) per track.
pub const SEQUENCE_COUNT: usize = 16;

/// User-definable scales per project.
pub const USER_SCALE_COUNT: usize = 4;

/// External clock sources.
pub const SLAVE_COUNT: usize = 2;

/// Routes in the routing table.
pub const ROUTE_COUNT: usize = 8;

/// Entries in the MIDI output map.
pub const MIDI_OUTPUT_COUNT: usize = 8;

/// Slots in the song chain.
pub const SONG_SLOT_COUNT: usize = 16;

/// Maximum name length for project, tracks, song and user scales.
pub const NAME_LENGTH: usize = 16;

/// CV input channels available as routing sources.
pub const CV_INPUT_COUNT: usize = 4;

/// Held-note capacity for MIDI/CV voices and the arpeggiator.
pub const HELD_NOTE_COUNT: usize = 16;

/// Capacity of the scheduled play-state action queue.
pub const SCHEDULED_ACTION_COUNT: usize = 16;

/// Default clock output divisor (24 ticks = 1/16 note at 96 PPQN).
pub const DEFAULT_OUTPUT_DIVISOR: u32 = 24;

/// Default clock output pulse width in microseconds.
pub const DEFAULT_OUTPUT_PULSE_US: u32 = 1000;

/// Ticks per measure (4 quarter notes).
pub const MEASURE_TICKS: u32 = PPQN * 4;
