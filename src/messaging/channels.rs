// Lock-free channels between interrupt context and the engine loop
// MIDI byte ISRs push into a per-port SPSC ring; the foreground loop
// drains it into the parser.

use ringbuf::{traits::Split, HeapRb};

pub type MidiByteProducer = ringbuf::HeapProd<u8>;
pub type MidiByteConsumer = ringbuf::HeapCons<u8>;

/// One ring per MIDI input port, single producer (the ISR), single
/// consumer (the engine loop).
pub fn create_midi_byte_channel(capacity: usize) -> (MidiByteProducer, MidiByteConsumer) {
    let rb = HeapRb::<u8>::new(capacity);
    rb.split()
}
