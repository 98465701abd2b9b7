// MIDI message record
// Fixed-size message (status + up to two data bytes) with constructors
// for all channel voice, system common and real-time messages.

/// A complete MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiMessage {
    status: u8,
    data: [u8; 2],
}

impl MidiMessage {
    // Channel voice message types (upper nibble of the status byte)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const KEY_PRESSURE: u8 = 0xa0;
    pub const CONTROL_CHANGE: u8 = 0xb0;
    pub const PROGRAM_CHANGE: u8 = 0xc0;
    pub const CHANNEL_PRESSURE: u8 = 0xd0;
    pub const PITCH_BEND: u8 = 0xe0;

    // System common messages
    pub const SYSTEM_EXCLUSIVE: u8 = 0xf0;
    pub const TIME_CODE: u8 = 0xf1;
    pub const SONG_POSITION: u8 = 0xf2;
    pub const SONG_SELECT: u8 = 0xf3;
    pub const TUNE_REQUEST: u8 = 0xf6;
    pub const END_OF_EXCLUSIVE: u8 = 0xf7;

    // System real-time messages
    pub const TICK: u8 = 0xf8;
    pub const START: u8 = 0xfa;
    pub const CONTINUE: u8 = 0xfb;
    pub const STOP: u8 = 0xfc;
    pub const ACTIVE_SENSING: u8 = 0xfe;
    pub const SYSTEM_RESET: u8 = 0xff;

    /// Build a message from a raw status byte (no data).
    pub fn from_status(status: u8) -> Self {
        Self {
            status,
            data: [0; 2],
        }
    }

    /// Build a message from a status byte and one data byte.
    pub fn with_data1(status: u8, data0: u8) -> Self {
        Self {
            status,
            data: [data0, 0],
        }
    }

    /// Build a message from a status byte and two data bytes.
    pub fn with_data2(status: u8, data0: u8, data1: u8) -> Self {
        Self {
            status,
            data: [data0, data1],
        }
    }

    /// Number of data bytes following the given status byte.
    pub fn payload_length(status: u8) -> usize {
        match status & 0xf0 {
            Self::NOTE_OFF | Self::NOTE_ON | Self::KEY_PRESSURE | Self::CONTROL_CHANGE
            | Self::PITCH_BEND => 2,
            Self::PROGRAM_CHANGE | Self::CHANNEL_PRESSURE => 1,
            0xf0 => match status {
                Self::SONG_POSITION => 2,
                Self::TIME_CODE | Self::SONG_SELECT => 1,
                _ => 0,
            },
            _ => 0,
        }
    }

    // --- Constructors ---

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::with_data2(Self::NOTE_ON | (channel & 0x0f), note & 0x7f, velocity & 0x7f)
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        Self::with_data2(Self::NOTE_OFF | (channel & 0x0f), note & 0x7f, 0)
    }

    pub fn key_pressure(channel: u8, note: u8, pressure: u8) -> Self {
        Self::with_data2(Self::KEY_PRESSURE | (channel & 0x0f), note & 0x7f, pressure & 0x7f)
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::with_data2(
            Self::CONTROL_CHANGE | (channel & 0x0f),
            controller & 0x7f,
            value & 0x7f,
        )
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::with_data1(Self::PROGRAM_CHANGE | (channel & 0x0f), program & 0x7f)
    }

    pub fn channel_pressure(channel: u8, pressure: u8) -> Self {
        Self::with_data1(Self::CHANNEL_PRESSURE | (channel & 0x0f), pressure & 0x7f)
    }

    /// Pitch bend with a signed value centered at 0 (-8192..=8191).
    pub fn pitch_bend(channel: u8, value: i16) -> Self {
        let raw = (value.clamp(-8192, 8191) as i32 + 8192) as u16;
        Self::with_data2(
            Self::PITCH_BEND | (channel & 0x0f),
            (raw & 0x7f) as u8,
            (raw >> 7) as u8,
        )
    }

    /// Song position in MIDI beats (14-bit).
    pub fn song_position(position: u16) -> Self {
        let position = position & 0x3fff;
        Self::with_data2(Self::SONG_POSITION, (position & 0x7f) as u8, (position >> 7) as u8)
    }

    pub fn song_select(song: u8) -> Self {
        Self::with_data1(Self::SONG_SELECT, song & 0x7f)
    }

    pub fn time_code(data: u8) -> Self {
        Self::with_data1(Self::TIME_CODE, data & 0x7f)
    }

    pub fn tune_request() -> Self {
        Self::from_status(Self::TUNE_REQUEST)
    }

    pub fn tick() -> Self {
        Self::from_status(Self::TICK)
    }

    pub fn start() -> Self {
        Self::from_status(Self::START)
    }

    pub fn continue_() -> Self {
        Self::from_status(Self::CONTINUE)
    }

    pub fn stop() -> Self {
        Self::from_status(Self::STOP)
    }

    // --- Accessors ---

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn data0(&self) -> u8 {
        self.data[0]
    }

    pub fn data1(&self) -> u8 {
        self.data[1]
    }

    pub fn channel(&self) -> u8 {
        self.status & 0x0f
    }

    fn kind(&self) -> u8 {
        self.status & 0xf0
    }

    pub fn is_channel_message(&self) -> bool {
        self.status >= 0x80 && self.status < 0xf0
    }

    pub fn is_system_message(&self) -> bool {
        self.status >= 0xf0
    }

    pub fn is_real_time_message(&self) -> bool {
        self.status >= 0xf8
    }

    pub fn is_note_on(&self) -> bool {
        self.kind() == Self::NOTE_ON
    }

    pub fn is_note_off(&self) -> bool {
        self.kind() == Self::NOTE_OFF
    }

    pub fn is_key_pressure(&self) -> bool {
        self.kind() == Self::KEY_PRESSURE
    }

    pub fn is_control_change(&self) -> bool {
        self.kind() == Self::CONTROL_CHANGE
    }

    pub fn is_program_change(&self) -> bool {
        self.kind() == Self::PROGRAM_CHANGE
    }

    pub fn is_channel_pressure(&self) -> bool {
        self.kind() == Self::CHANNEL_PRESSURE
    }

    pub fn is_pitch_bend(&self) -> bool {
        self.kind() == Self::PITCH_BEND
    }

    pub fn is_time_code(&self) -> bool {
        self.status == Self::TIME_CODE
    }

    pub fn is_song_position(&self) -> bool {
        self.status == Self::SONG_POSITION
    }

    pub fn is_song_select(&self) -> bool {
        self.status == Self::SONG_SELECT
    }

    pub fn is_tune_request(&self) -> bool {
        self.status == Self::TUNE_REQUEST
    }

    pub fn is_tick(&self) -> bool {
        self.status == Self::TICK
    }

    pub fn is_start(&self) -> bool {
        self.status == Self::START
    }

    pub fn is_continue(&self) -> bool {
        self.status == Self::CONTINUE
    }

    pub fn is_stop(&self) -> bool {
        self.status == Self::STOP
    }

    pub fn note(&self) -> u8 {
        self.data[0]
    }

    pub fn velocity(&self) -> u8 {
        self.data[1]
    }

    pub fn key_pressure_value(&self) -> u8 {
        self.data[1]
    }

    pub fn control_number(&self) -> u8 {
        self.data[0]
    }

    pub fn control_value(&self) -> u8 {
        self.data[1]
    }

    pub fn program_number(&self) -> u8 {
        self.data[0]
    }

    pub fn channel_pressure_value(&self) -> u8 {
        self.data[0]
    }

    /// Pitch bend value centered at 0.
    pub fn pitch_bend_value(&self) -> i32 {
        (((self.data[1] as i32) << 7) | self.data[0] as i32) - 8192
    }

    /// Song position value (14-bit).
    pub fn song_position_value(&self) -> u16 {
        ((self.data[1] as u16) << 7) | self.data[0] as u16
    }

    pub fn song_number(&self) -> u8 {
        self.data[0]
    }

    /// A NoteOn with velocity 0 is a NoteOff in disguise; rewrite it so
    /// downstream consumers only have to handle one form.
    pub fn fix_fake_note_off(&mut self) {
        if self.is_note_on() && self.velocity() == 0 {
            self.status = Self::NOTE_OFF | self.channel();
            self.data[1] = 0;
        }
    }
}
