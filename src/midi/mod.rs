// MIDI codec - message records and streaming byte parser

pub mod message;
pub mod parser;

pub use message::MidiMessage;
pub use parser::MidiParser;
