// Streaming MIDI parser
// Accepts one byte at a time; returns true when a complete message is
// available. Handles running status, real-time interleaving and SysEx.

use crate::midi::message::MidiMessage;

/// Byte-stream parser with running status.
///
/// Malformed input never fails; stray data bytes are dropped and the
/// parser resyncs at the next status byte.
#[derive(Debug, Default)]
pub struct MidiParser {
    // latched status byte, 0 when no running status is active
    status: u8,
    expected: usize,
    count: usize,
    data: [u8; 2],
    in_sysex: bool,
    message: MidiMessage,
}

impl MidiParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last complete message. Only valid after `feed` returned true.
    pub fn message(&self) -> &MidiMessage {
        &self.message
    }

    /// Reset all parser state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one byte; returns true when a message completed.
    pub fn feed(&mut self, byte: u8) -> bool {
        if byte >= 0xf8 {
            // Real-time messages are emitted immediately and do not
            // disturb running status or a message in progress.
            self.message = MidiMessage::from_status(byte);
            return true;
        }

        if byte >= 0x80 {
            return self.feed_status(byte);
        }

        self.feed_data(byte)
    }

    fn feed_status(&mut self, byte: u8) -> bool {
        match byte {
            MidiMessage::SYSTEM_EXCLUSIVE => {
                // SysEx is consumed but not assembled here
                self.in_sysex = true;
                self.status = 0;
                false
            }
            MidiMessage::END_OF_EXCLUSIVE => {
                self.in_sysex = false;
                self.status = 0;
                false
            }
            _ => {
                self.in_sysex = false;
                self.status = byte;
                self.expected = MidiMessage::payload_length(byte);
                self.count = 0;
                if self.expected == 0 {
                    // data-less system common (tune request)
                    self.message = MidiMessage::from_status(byte);
                    self.status = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn feed_data(&mut self, byte: u8) -> bool {
        if self.in_sysex {
            return false;
        }
        if self.status == 0 {
            // data byte with no active status is ignored
            return false;
        }

        self.data[self.count] = byte;
        self.count += 1;
        if self.count < self.expected {
            return false;
        }

        self.message = match self.expected {
            1 => MidiMessage::with_data1(self.status, self.data[0]),
            _ => MidiMessage::with_data2(self.status, self.data[0], self.data[1]),
        };
        self.count = 0;
        if self.message.is_system_message() {
            // system common messages cancel running status
            self.status = 0;
        }
        true
    }
}
