// MIDI parser robustness - deterministic byte fuzzing. Arbitrary
// garbage must never panic, and the parser must resync at the next
// status byte.

use gridseq::engine::Rng;
use gridseq::midi::{MidiMessage, MidiParser};

#[test]
fn test_random_bytes_never_panic() {
    let mut parser = MidiParser::new();
    let mut rng = Rng::with_seed(0xfadeu32);

    for _ in 0..100_000 {
        let byte = (rng.next_u32() & 0xff) as u8;
        if parser.feed(byte) {
            let message = parser.message();
            // whatever came out is a structurally sound message
            assert!(message.status() >= 0x80);
            assert!(message.data0() < 0x80 || message.is_real_time_message());
            assert!(message.data1() < 0x80 || message.is_real_time_message());
        }
    }
}

#[test]
fn test_resync_after_garbage() {
    let mut parser = MidiParser::new();
    let mut rng = Rng::with_seed(1234);

    for _ in 0..1000 {
        // a burst of data-byte garbage with no status
        for _ in 0..rng.next_range(8) {
            parser.feed((rng.next_u32() & 0x7f) as u8);
        }
        // a clean message must still parse
        parser.feed(0x90);
        parser.feed(0x3c);
        assert!(parser.feed(0x64));
        assert!(parser.message().is_note_on());
        assert_eq!(parser.message().note(), 60);
    }
}

#[test]
fn test_truncated_messages_are_dropped() {
    let mut parser = MidiParser::new();

    // status + one data byte, then a fresh status: the partial message
    // disappears, the new one completes
    parser.feed(0xe0);
    parser.feed(0x12);
    parser.feed(0xb0);
    parser.feed(0x07);
    assert!(parser.feed(0x7f));
    assert!(parser.message().is_control_change());
    assert_eq!(parser.message().control_value(), 0x7f);
}

#[test]
fn test_real_time_flood_does_not_corrupt_stream() {
    let mut parser = MidiParser::new();
    let mut rng = Rng::with_seed(99);

    for _ in 0..1000 {
        parser.feed(0x90);
        // real-time bytes sprayed between every data byte
        for _ in 0..rng.next_range(4) {
            assert!(parser.feed(0xf8));
        }
        parser.feed(0x40);
        for _ in 0..rng.next_range(4) {
            assert!(parser.feed(0xfe));
        }
        assert!(parser.feed(0x50));
        assert!(parser.message().is_note_on());
        assert_eq!(parser.message().note(), 0x40);
        assert_eq!(parser.message().velocity(), 0x50);
    }
}

#[test]
fn test_interleaved_clock_stream() {
    // a realistic wire capture: running-status notes with clock ticks
    let stream: &[u8] = &[
        0xfa, // start
        0x90, 0x3c, 0x64, // note on
        0xf8, 0xf8, // clock
        0x3c, 0x00, // running status note off (velocity 0)
        0xf8, // clock
        0x40, 0x64, // running status note on
        0xfc, // stop
    ];

    let mut parser = MidiParser::new();
    let mut messages = Vec::new();
    for &byte in stream {
        if parser.feed(byte) {
            let mut message = *parser.message();
            message.fix_fake_note_off();
            messages.push(message);
        }
    }

    assert_eq!(messages.len(), 8);
    assert!(messages[0].is_start());
    assert!(messages[1].is_note_on());
    assert!(messages[2].is_tick());
    assert!(messages[3].is_tick());
    assert!(messages[4].is_note_off());
    assert_eq!(messages[4].note(), 0x3c);
    assert!(messages[5].is_tick());
    assert!(messages[6].is_note_on());
    assert_eq!(messages[6].note(), 0x40);
    assert_eq!(messages[7], MidiMessage::stop());
}
