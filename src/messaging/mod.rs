// Communication channels between interrupt context and the engine

pub mod channels;

pub use channels::{create_midi_byte_channel, MidiByteConsumer, MidiByteProducer};
