// Play state - transport, per-track mute/solo/fill/pattern, and the
// scheduled-action queue drained at bar boundaries.

use crate::config::{SCHEDULED_ACTION_COUNT, SEQUENCE_COUNT, TRACK_COUNT};
use crate::serialize::{SerializeError, VersionedReader, VersionedWriter};

/// A deferred play-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOp {
    Pattern(u8),
    Mute(bool),
    Solo(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAction {
    pub measure: u32,
    pub track: u8,
    pub op: TrackOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPlayState {
    muted: bool,
    soloed: bool,
    fill: bool,
    pattern: u8,
}

impl TrackPlayState {
    fn new() -> Self {
        Self {
            muted: false,
            soloed: false,
            fill: false,
            pattern: 0,
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn soloed(&self) -> bool {
        self.soloed
    }

    pub fn set_soloed(&mut self, soloed: bool) {
        self.soloed = soloed;
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.fill = fill;
    }

    pub fn pattern(&self) -> usize {
        self.pattern as usize
    }

    pub fn set_pattern(&mut self, pattern: i32) {
        self.pattern = pattern.clamp(0, SEQUENCE_COUNT as i32 - 1) as u8;
    }
}

impl Default for TrackPlayState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayState {
    running: bool,
    fill: bool,
    fill_amount: u8,
    song_mode: bool,
    follow_pattern: bool,
    follow_page: bool,
    follow_track: bool,
    tracks: [TrackPlayState; TRACK_COUNT],
    scheduled: [ScheduledAction; SCHEDULED_ACTION_COUNT],
    scheduled_len: usize,
    overflow: bool,
}

impl PlayState {
    pub fn new() -> Self {
        Self {
            running: false,
            fill: false,
            fill_amount: 100,
            song_mode: false,
            follow_pattern: false,
            follow_page: false,
            follow_track: false,
            tracks: [TrackPlayState::new(); TRACK_COUNT],
            scheduled: [ScheduledAction {
                measure: 0,
                track: 0,
                op: TrackOp::Pattern(0),
            }; SCHEDULED_ACTION_COUNT],
            scheduled_len: 0,
            overflow: false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.fill = fill;
    }

    pub fn fill_amount(&self) -> i32 {
        self.fill_amount as i32
    }

    pub fn set_fill_amount(&mut self, amount: i32) {
        self.fill_amount = amount.clamp(0, 100) as u8;
    }

    pub fn song_mode(&self) -> bool {
        self.song_mode
    }

    pub fn set_song_mode(&mut self, song_mode: bool) {
        self.song_mode = song_mode;
    }

    pub fn follow_pattern(&self) -> bool {
        self.follow_pattern
    }

    pub fn set_follow_pattern(&mut self, value: bool) {
        self.follow_pattern = value;
    }

    pub fn follow_page(&self) -> bool {
        self.follow_page
    }

    pub fn set_follow_page(&mut self, value: bool) {
        self.follow_page = value;
    }

    pub fn follow_track(&self) -> bool {
        self.follow_track
    }

    pub fn set_follow_track(&mut self, value: bool) {
        self.follow_track = value;
    }

    pub fn track(&self, index: usize) -> &TrackPlayState {
        &self.tracks[index.min(TRACK_COUNT - 1)]
    }

    pub fn track_mut(&mut self, index: usize) -> &mut TrackPlayState {
        &mut self.tracks[index.min(TRACK_COUNT - 1)]
    }

    /// Whether any track is soloed; muting then applies to the rest.
    pub fn any_soloed(&self) -> bool {
        self.tracks.iter().any(|t| t.soloed())
    }

    /// Schedule an op for the given bar. When the queue is full the
    /// oldest action is dropped and the overflow flag set.
    pub fn schedule(&mut self, measure: u32, track: usize, op: TrackOp) {
        if self.scheduled_len == SCHEDULED_ACTION_COUNT {
            self.scheduled.copy_within(1.., 0);
            self.scheduled_len -= 1;
            self.overflow = true;
            log::warn!("scheduled action queue full, dropped oldest action");
        }
        self.scheduled[self.scheduled_len] = ScheduledAction {
            measure,
            track: track.min(TRACK_COUNT - 1) as u8,
            op,
        };
        self.scheduled_len += 1;
    }

    pub fn pending_count(&self) -> usize {
        self.scheduled_len
    }

    pub fn cancel_pending(&mut self) {
        self.scheduled_len = 0;
    }

    /// Sticky overflow indicator for the UI; reading clears it.
    pub fn take_overflow(&mut self) -> bool {
        std::mem::replace(&mut self.overflow, false)
    }

    /// Apply every action scheduled at or before `measure`.
    pub fn apply_scheduled(&mut self, measure: u32) {
        let mut kept = 0;
        for i in 0..self.scheduled_len {
            let action = self.scheduled[i];
            if action.measure <= measure {
                let track = &mut self.tracks[action.track as usize];
                match action.op {
                    TrackOp::Pattern(pattern) => track.set_pattern(pattern as i32),
                    TrackOp::Mute(muted) => track.set_muted(muted),
                    TrackOp::Solo(soloed) => track.set_soloed(soloed),
                }
            } else {
                self.scheduled[kept] = action;
                kept += 1;
            }
        }
        self.scheduled_len = kept;
    }

    pub fn write(&self, writer: &mut VersionedWriter) -> Result<(), SerializeError> {
        writer.write_bool(self.song_mode)?;
        writer.write_u8(self.fill_amount)?;
        writer.write_bool(self.follow_pattern)?;
        writer.write_bool(self.follow_page)?;
        writer.write_bool(self.follow_track)?;
        for track in &self.tracks {
            writer.write_bool(track.muted)?;
            writer.write_bool(track.soloed)?;
            writer.write_u8(track.pattern)?;
        }
        Ok(())
    }

    pub fn read(&mut self, reader: &mut VersionedReader) -> Result<(), SerializeError> {
        self.song_mode = reader.read_bool()?;
        self.fill_amount = reader.read_u8()?.min(100);
        self.follow_pattern = reader.read_bool()?;
        self.follow_page = reader.read_bool()?;
        self.follow_track = reader.read_bool()?;
        for track in self.tracks.iter_mut() {
            track.muted = reader.read_bool()?;
            track.soloed = reader.read_bool()?;
            track.pattern = reader.read_u8()?.min(SEQUENCE_COUNT as u8 - 1);
        }
        // transient state never persists
        self.running = false;
        self.fill = false;
        self.scheduled_len = 0;
        self.overflow = false;
        Ok(())
    }
}

impl Default for PlayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = PlayState::new();
        assert!(!state.running());
        assert!(!state.fill());
        assert_eq!(state.fill_amount(), 100);
        assert!(!state.song_mode());
        assert!(!state.track(0).muted());
        assert_eq!(state.track(0).pattern(), 0);
    }

    #[test]
    fn test_pattern_clamped() {
        let mut state = PlayState::new();
        state.track_mut(0).set_pattern(100);
        assert_eq!(state.track(0).pattern(), SEQUENCE_COUNT - 1);
        state.track_mut(0).set_pattern(-4);
        assert_eq!(state.track(0).pattern(), 0);
    }

    #[test]
    fn test_any_soloed() {
        let mut state = PlayState::new();
        assert!(!state.any_soloed());
        state.track_mut(3).set_soloed(true);
        assert!(state.any_soloed());
    }

    #[test]
    fn test_scheduled_actions_apply_at_bar() {
        let mut state = PlayState::new();
        state.schedule(2, 0, TrackOp::Pattern(5));
        state.schedule(3, 1, TrackOp::Mute(true));
        assert_eq!(state.pending_count(), 2);

        // not yet due
        state.apply_scheduled(1);
        assert_eq!(state.track(0).pattern(), 0);
        assert_eq!(state.pending_count(), 2);

        state.apply_scheduled(2);
        assert_eq!(state.track(0).pattern(), 5);
        assert!(!state.track(1).muted());
        assert_eq!(state.pending_count(), 1);

        state.apply_scheduled(3);
        assert!(state.track(1).muted());
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn test_cancel_pending() {
        let mut state = PlayState::new();
        state.schedule(1, 0, TrackOp::Pattern(5));
        state.schedule(1, 1, TrackOp::Solo(true));
        state.cancel_pending();
        assert_eq!(state.pending_count(), 0);

        state.apply_scheduled(10);
        assert_eq!(state.track(0).pattern(), 0);
        assert!(!state.track(1).soloed());
    }

    #[test]
    fn test_queue_overflow_drops_oldest() {
        let mut state = PlayState::new();
        for i in 0..SCHEDULED_ACTION_COUNT {
            state.schedule(1, 0, TrackOp::Pattern(i as u8));
        }
        assert!(!state.take_overflow());

        // one more: the oldest (pattern 0) is dropped
        state.schedule(1, 0, TrackOp::Pattern(15));
        assert!(state.take_overflow());
        assert!(!state.take_overflow()); // cleared on read
        assert_eq!(state.pending_count(), SCHEDULED_ACTION_COUNT);

        // last one applied wins
        state.apply_scheduled(1);
        assert_eq!(state.track(0).pattern(), 15);
    }

    #[test]
    fn test_round_trip() {
        use std::io::Cursor;

        let mut original = PlayState::new();
        original.set_song_mode(true);
        original.set_fill_amount(42);
        original.set_follow_pattern(true);
        original.track_mut(2).set_muted(true);
        original.track_mut(4).set_pattern(7);
        // transient state is not persisted
        original.set_running(true);
        original.set_fill(true);

        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            original.write(&mut writer).unwrap();
            writer.finish().unwrap();
        }

        let mut read_back = PlayState::new();
        let mut cursor = Cursor::new(buffer);
        {
            let mut reader = VersionedReader::new(&mut cursor).unwrap();
            read_back.read(&mut reader).unwrap();
            reader.finish().unwrap();
        }

        assert!(read_back.song_mode());
        assert_eq!(read_back.fill_amount(), 42);
        assert!(read_back.follow_pattern());
        assert!(read_back.track(2).muted());
        assert_eq!(read_back.track(4).pattern(), 7);
        assert!(!read_back.running());
        assert!(!read_back.fill());
    }
}
