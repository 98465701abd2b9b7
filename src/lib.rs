// gridseq - performance step sequencer core
// Library exports for the firmware shell, tests and the demo binary

pub mod config;
pub mod engine;
pub mod generators;
pub mod messaging;
pub mod midi;
pub mod model;
pub mod serialize;

// Re-export commonly used types for convenience
pub use engine::{Clock, ClockEvents, Engine, NullTimer, TrackOutput};
pub use generators::{EuclideanGenerator, RandomGenerator};
pub use messaging::create_midi_byte_channel;
pub use midi::{MidiMessage, MidiParser};
pub use model::{load_project, save_project, Project};
pub use serialize::SerializeError;
