// Clock - master tick generation, slave tracking and output shaping
// The timer ISR side only bumps counters and latches event flags; the
// engine drains ticks and events from the foreground loop.

use crate::config::{DEFAULT_OUTPUT_DIVISOR, DEFAULT_OUTPUT_PULSE_US, PPQN, SLAVE_COUNT};
use crate::midi::MidiMessage;
use crate::model::clock_setup::ClockMode;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Hardware timer seam. The owner arms the timer with the tick period
/// and calls `Clock::on_timer_tick` from the timer interrupt.
pub trait ClockTimer {
    fn set_period_us(&mut self, period_us: u32);
    fn start(&mut self);
    fn stop(&mut self);
}

/// Timer stub for offline rendering and tests, where the owner drives
/// `on_timer_tick` directly.
#[derive(Debug, Default)]
pub struct NullTimer;

impl ClockTimer for NullTimer {
    fn set_period_us(&mut self, _period_us: u32) {}
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Divided clock output state delivered to the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockOutputState {
    pub run: bool,
    pub reset: bool,
    pub pulse: bool,
}

/// Clock consumer callbacks: the divided/swung output signal and raw
/// MIDI real-time bytes for the MIDI outputs.
pub trait ClockListener {
    fn on_clock_output(&mut self, state: ClockOutputState);
    fn on_clock_midi(&mut self, message: u8);
}

/// Latched transport events, consumed by `check_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockEvents(u8);

impl ClockEvents {
    pub const START: ClockEvents = ClockEvents(1 << 0);
    pub const STOP: ClockEvents = ClockEvents(1 << 1);
    pub const CONTINUE: ClockEvents = ClockEvents(1 << 2);
    pub const RESET: ClockEvents = ClockEvents(1 << 3);

    pub fn contains(self, events: ClockEvents) -> bool {
        self.0 & events.0 == events.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ClockEvents {
    type Output = ClockEvents;

    fn bitor(self, rhs: ClockEvents) -> ClockEvents {
        ClockEvents(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    MasterRunning,
    SlaveRunning(usize),
}

#[derive(Debug, Clone, Copy)]
struct SlaveState {
    divisor: u32,
    enabled: bool,
    sub_ticks: u32,
    last_pulse_us: Option<u64>,
    filtered_interval_us: f32,
    drift_count: u32,
}

impl SlaveState {
    fn new() -> Self {
        Self {
            divisor: DEFAULT_OUTPUT_DIVISOR,
            enabled: true,
            sub_ticks: 0,
            last_pulse_us: None,
            filtered_interval_us: 0.0,
            drift_count: 0,
        }
    }

    fn reset_tracking(&mut self) {
        self.sub_ticks = 0;
        self.last_pulse_us = None;
        self.filtered_interval_us = 0.0;
    }
}

struct OutputConfig {
    divisor: u32,
    pulse_us: u32,
    swing: u8,
}

pub struct Clock {
    mode: ClockMode,
    run_state: RunState,
    master_bpm: f32,
    tick: AtomicU32,
    tick_processed: u32,
    events: AtomicU8,
    now_us: u64,
    slaves: [SlaveState; SLAVE_COUNT],
    output: OutputConfig,
    output_state: ClockOutputState,
    pulse_until_us: u64,
    send_midi_clock: bool,
    timer: Box<dyn ClockTimer + Send>,
    listener: Option<Box<dyn ClockListener + Send>>,
}

impl Clock {
    pub const BPM_MIN: f32 = 1.0;
    pub const BPM_MAX: f32 = 1000.0;
    /// MIDI clock runs at 24 pulses per quarter note.
    const MIDI_CLOCK_PPQN: u32 = 24;

    pub fn new(timer: Box<dyn ClockTimer + Send>) -> Self {
        Self {
            mode: ClockMode::Auto,
            run_state: RunState::Idle,
            master_bpm: 120.0,
            tick: AtomicU32::new(0),
            tick_processed: 0,
            events: AtomicU8::new(0),
            now_us: 0,
            slaves: [SlaveState::new(); SLAVE_COUNT],
            output: OutputConfig {
                divisor: DEFAULT_OUTPUT_DIVISOR,
                pulse_us: DEFAULT_OUTPUT_PULSE_US,
                swing: 50,
            },
            output_state: ClockOutputState::default(),
            pulse_until_us: 0,
            send_midi_clock: true,
            timer,
            listener: None,
        }
    }

    /// Reset to cold state; configuration is kept.
    pub fn init(&mut self) {
        self.run_state = RunState::Idle;
        self.tick.store(0, Ordering::Relaxed);
        self.tick_processed = 0;
        self.events.store(0, Ordering::Relaxed);
        self.now_us = 0;
        for slave in self.slaves.iter_mut() {
            slave.reset_tracking();
        }
        self.output_state = ClockOutputState::default();
    }

    pub fn set_listener(&mut self, listener: Box<dyn ClockListener + Send>) {
        self.listener = Some(listener);
    }

    // --- state queries ---

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Switching the mode stops a running clock first.
    pub fn set_mode(&mut self, mode: ClockMode) {
        if mode != self.mode {
            if self.is_running() {
                self.stop_running();
            }
            self.mode = mode;
        }
    }

    /// The configured mode while idle, the latched role while running.
    pub fn active_mode(&self) -> ClockMode {
        match self.run_state {
            RunState::MasterRunning => ClockMode::Master,
            RunState::SlaveRunning(_) => ClockMode::Slave,
            RunState::Idle => self.mode,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.run_state == RunState::Idle
    }

    pub fn is_running(&self) -> bool {
        self.run_state != RunState::Idle
    }

    pub fn ppqn(&self) -> u32 {
        PPQN
    }

    pub fn tick(&self) -> u32 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn master_bpm(&self) -> f32 {
        self.master_bpm
    }

    /// Valid in any state; a running master timer is rescaled in place
    /// without resetting the tick counter.
    pub fn set_master_bpm(&mut self, bpm: f32) {
        self.master_bpm = bpm.clamp(Self::BPM_MIN, Self::BPM_MAX);
        if self.run_state == RunState::MasterRunning {
            let period = self.tick_period_us();
            self.timer.set_period_us(period);
        }
    }

    /// Tick duration in seconds.
    pub fn tick_duration(&self) -> f32 {
        60.0 / (self.master_bpm * PPQN as f32)
    }

    fn tick_period_us(&self) -> u32 {
        (self.tick_duration() * 1_000_000.0) as u32
    }

    /// Effective BPM for display: the filtered estimate while slaved,
    /// the master BPM otherwise.
    pub fn bpm(&self) -> f32 {
        if let RunState::SlaveRunning(source) = self.run_state {
            let estimate = self.estimated_slave_bpm(source);
            if estimate > 0.0 {
                return estimate;
            }
        }
        self.master_bpm
    }

    pub fn estimated_slave_bpm(&self, source: usize) -> f32 {
        let slave = &self.slaves[source.min(SLAVE_COUNT - 1)];
        if slave.filtered_interval_us > 0.0 {
            60_000_000.0 / (slave.filtered_interval_us * Self::MIDI_CLOCK_PPQN as f32)
        } else {
            0.0
        }
    }

    pub fn slave_drift_count(&self, source: usize) -> u32 {
        self.slaves[source.min(SLAVE_COUNT - 1)].drift_count
    }

    // --- event / tick consumption ---

    /// Pending events; reading clears them.
    pub fn check_event(&mut self) -> ClockEvents {
        ClockEvents(self.events.swap(0, Ordering::Relaxed))
    }

    /// The next unconsumed tick index, if any.
    pub fn check_tick(&mut self) -> Option<u32> {
        let generated = self.tick.load(Ordering::Relaxed);
        if self.tick_processed < generated {
            let tick = self.tick_processed;
            self.tick_processed += 1;
            Some(tick)
        } else {
            None
        }
    }

    fn post_events(&mut self, events: ClockEvents) {
        self.events.fetch_or(events.0, Ordering::Relaxed);
    }

    // --- master control ---

    pub fn master_start(&mut self) {
        if self.mode == ClockMode::Slave || matches!(self.run_state, RunState::SlaveRunning(_)) {
            return;
        }
        self.run_state = RunState::MasterRunning;
        self.tick.store(0, Ordering::Relaxed);
        self.tick_processed = 0;
        self.post_events(ClockEvents::START | ClockEvents::RESET);
        self.output_state.run = true;
        self.output_state.reset = true;
        self.emit_output();
        self.emit_midi(MidiMessage::START);
        let period = self.tick_period_us();
        self.timer.set_period_us(period);
        self.timer.start();
    }

    pub fn master_stop(&mut self) {
        if matches!(self.run_state, RunState::SlaveRunning(_)) {
            return;
        }
        self.run_state = RunState::Idle;
        self.post_events(ClockEvents::STOP);
        self.timer.stop();
        self.output_state.run = false;
        self.emit_output();
        self.emit_midi(MidiMessage::STOP);
    }

    pub fn master_continue(&mut self) {
        if self.mode == ClockMode::Slave || matches!(self.run_state, RunState::SlaveRunning(_)) {
            return;
        }
        self.run_state = RunState::MasterRunning;
        self.post_events(ClockEvents::CONTINUE);
        self.output_state.run = true;
        self.emit_output();
        self.emit_midi(MidiMessage::CONTINUE);
        let period = self.tick_period_us();
        self.timer.set_period_us(period);
        self.timer.start();
    }

    pub fn master_reset(&mut self) {
        if matches!(self.run_state, RunState::SlaveRunning(_)) {
            return;
        }
        self.run_state = RunState::Idle;
        self.tick.store(0, Ordering::Relaxed);
        self.tick_processed = 0;
        self.post_events(ClockEvents::RESET);
        self.timer.stop();
        self.output_state.run = false;
        self.output_state.reset = true;
        self.emit_output();
    }

    /// Timer interrupt: advance time and, as master, generate a tick.
    pub fn on_timer_tick(&mut self) {
        let period = self.tick_period_us() as u64;
        self.advance_time(period);
        if self.run_state == RunState::MasterRunning {
            self.generate_tick();
        }
    }

    /// Advance the monotonic clock; used by slave BPM estimation and
    /// pulse-width timing.
    pub fn advance(&mut self, delta_us: u64) {
        self.advance_time(delta_us);
    }

    fn advance_time(&mut self, delta_us: u64) {
        self.now_us += delta_us;
        if self.output_state.pulse && self.now_us >= self.pulse_until_us {
            self.output_state.pulse = false;
            self.emit_output();
        }
    }

    // --- output configuration ---

    pub fn output_configure(&mut self, divisor: u32, pulse_us: u32) {
        self.output.divisor = divisor.clamp(1, 192);
        self.output.pulse_us = pulse_us.max(1);
    }

    pub fn output_configure_swing(&mut self, swing: u8) {
        self.output.swing = swing.clamp(50, 75);
    }

    pub fn set_send_midi_clock(&mut self, send: bool) {
        self.send_midi_clock = send;
    }

    pub fn output_state(&self) -> ClockOutputState {
        self.output_state
    }

    // --- slave control ---

    pub fn slave_configure(&mut self, source: usize, divisor: u32, enabled: bool) {
        if source < SLAVE_COUNT {
            self.slaves[source].divisor = divisor.clamp(1, 192);
            self.slaves[source].enabled = enabled;
        }
    }

    pub fn slave_start(&mut self, source: usize) {
        if source >= SLAVE_COUNT
            || self.mode == ClockMode::Master
            || self.run_state != RunState::Idle
            || !self.slaves[source].enabled
        {
            return;
        }
        self.run_state = RunState::SlaveRunning(source);
        self.tick.store(0, Ordering::Relaxed);
        self.tick_processed = 0;
        self.slaves[source].reset_tracking();
        self.post_events(ClockEvents::START | ClockEvents::RESET);
        self.output_state.run = true;
        self.output_state.reset = true;
        self.emit_output();
        self.emit_midi(MidiMessage::START);
    }

    pub fn slave_stop(&mut self, source: usize) {
        if self.run_state != RunState::SlaveRunning(source) {
            return;
        }
        self.run_state = RunState::Idle;
        self.post_events(ClockEvents::STOP);
        self.output_state.run = false;
        self.emit_output();
        self.emit_midi(MidiMessage::STOP);
    }

    pub fn slave_continue(&mut self, source: usize) {
        if source >= SLAVE_COUNT
            || self.mode == ClockMode::Master
            || self.run_state != RunState::Idle
            || !self.slaves[source].enabled
        {
            return;
        }
        self.run_state = RunState::SlaveRunning(source);
        self.post_events(ClockEvents::CONTINUE);
        self.output_state.run = true;
        self.emit_output();
        self.emit_midi(MidiMessage::CONTINUE);
    }

    pub fn slave_reset(&mut self, source: usize) {
        if self.run_state != RunState::SlaveRunning(source) && self.run_state != RunState::Idle {
            return;
        }
        self.run_state = RunState::Idle;
        self.tick.store(0, Ordering::Relaxed);
        self.tick_processed = 0;
        self.post_events(ClockEvents::RESET);
        self.output_state.run = false;
        self.output_state.reset = true;
        self.emit_output();
    }

    /// Handle a real-time byte from an external clock source.
    pub fn slave_handle_midi(&mut self, source: usize, message: u8) {
        match message {
            MidiMessage::START => self.slave_start(source),
            MidiMessage::CONTINUE => self.slave_continue(source),
            MidiMessage::STOP => self.slave_stop(source),
            MidiMessage::TICK => self.slave_tick(source),
            _ => {}
        }
    }

    fn slave_tick(&mut self, source: usize) {
        if self.run_state != RunState::SlaveRunning(source) {
            return;
        }

        // estimate BPM from the pulse interval, low-pass filtered
        let now = self.now_us;
        let slave = &mut self.slaves[source];
        if let Some(last) = slave.last_pulse_us {
            let interval = (now - last) as f32;
            if slave.filtered_interval_us <= 0.0 {
                slave.filtered_interval_us = interval;
            } else {
                if (interval - slave.filtered_interval_us).abs()
                    > slave.filtered_interval_us * 0.5
                {
                    slave.drift_count += 1;
                    if slave.drift_count % 64 == 1 {
                        log::warn!(
                            "clock source {} jitter: interval {:.0}us vs {:.0}us filtered",
                            source,
                            interval,
                            slave.filtered_interval_us
                        );
                    }
                }
                slave.filtered_interval_us += 0.1 * (interval - slave.filtered_interval_us);
            }
        }
        slave.last_pulse_us = Some(now);

        // one sequencer tick per `divisor` incoming pulses
        slave.sub_ticks += 1;
        if slave.sub_ticks >= slave.divisor {
            slave.sub_ticks = 0;
            self.generate_tick();
        }
    }

    // --- tick generation ---

    fn generate_tick(&mut self) {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);

        let divisor = self.output.divisor;
        let swing_delay = (self.output.swing as u32 - 50) * divisor / 100;
        let window = tick % (2 * divisor);
        if window == 0 || window == divisor + swing_delay {
            self.output_state.pulse = true;
            self.pulse_until_us = self.now_us + self.output.pulse_us as u64;
            self.emit_output();
            self.output_state.reset = false;
        }

        if self.send_midi_clock && tick % (PPQN / Self::MIDI_CLOCK_PPQN) == 0 {
            self.emit_midi(MidiMessage::TICK);
        }
    }

    fn stop_running(&mut self) {
        match self.run_state {
            RunState::MasterRunning => self.master_stop(),
            RunState::SlaveRunning(source) => self.slave_stop(source),
            RunState::Idle => {}
        }
    }

    fn emit_output(&mut self) {
        let state = self.output_state;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_clock_output(state);
        }
    }

    fn emit_midi(&mut self, message: u8) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_clock_midi(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        outputs: Vec<ClockOutputState>,
        midi: Vec<u8>,
    }

    struct RecordingListener(Arc<Mutex<Recorded>>);

    impl ClockListener for RecordingListener {
        fn on_clock_output(&mut self, state: ClockOutputState) {
            self.0.lock().unwrap().outputs.push(state);
        }

        fn on_clock_midi(&mut self, message: u8) {
            self.0.lock().unwrap().midi.push(message);
        }
    }

    fn clock() -> Clock {
        Clock::new(Box::new(NullTimer))
    }

    fn clock_with_listener() -> (Clock, Arc<Mutex<Recorded>>) {
        let mut clock = clock();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        clock.set_listener(Box::new(RecordingListener(recorded.clone())));
        (clock, recorded)
    }

    #[test]
    fn test_default_state() {
        let clock = clock();
        assert!(clock.is_idle());
        assert!(!clock.is_running());
        assert_eq!(clock.mode(), ClockMode::Auto);
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.master_bpm(), 120.0);
        assert_eq!(clock.ppqn(), PPQN);
    }

    #[test]
    fn test_set_mode() {
        let mut clock = clock();
        clock.set_mode(ClockMode::Master);
        assert_eq!(clock.mode(), ClockMode::Master);
        clock.set_mode(ClockMode::Slave);
        assert_eq!(clock.mode(), ClockMode::Slave);
        clock.set_mode(ClockMode::Auto);
        assert_eq!(clock.mode(), ClockMode::Auto);
    }

    #[test]
    fn test_set_master_bpm() {
        let mut clock = clock();
        clock.set_master_bpm(140.0);
        assert_eq!(clock.master_bpm(), 140.0);
        clock.set_master_bpm(180.5);
        assert_eq!(clock.master_bpm(), 180.5);
    }

    #[test]
    fn test_bpm_clamping() {
        let mut clock = clock();
        clock.set_master_bpm(0.1);
        assert_eq!(clock.master_bpm(), 1.0);
        clock.set_master_bpm(5000.0);
        assert_eq!(clock.master_bpm(), 1000.0);
    }

    #[test]
    fn test_tick_duration() {
        let mut clock = clock();
        for bpm in [60.0f32, 120.0, 180.0] {
            clock.set_master_bpm(bpm);
            let expected = 60.0 / (bpm * PPQN as f32);
            assert_eq!(clock.tick_duration(), expected, "{} BPM", bpm);
        }
    }

    #[test]
    fn test_master_start_stop() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);

        clock.master_start();
        assert!(clock.is_running());
        assert!(!clock.is_idle());
        assert_eq!(clock.active_mode(), ClockMode::Master);

        clock.master_stop();
        assert!(clock.is_idle());
    }

    #[test]
    fn test_master_start_resets_tick() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        for _ in 0..10 {
            clock.on_timer_tick();
        }
        assert_eq!(clock.tick(), 10);

        clock.master_stop();
        clock.master_start();
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn test_master_continue_keeps_tick() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        for _ in 0..10 {
            clock.on_timer_tick();
        }
        clock.master_stop();
        clock.master_continue();
        assert!(clock.is_running());
        assert_eq!(clock.active_mode(), ClockMode::Master);
        assert_eq!(clock.tick(), 10);
    }

    #[test]
    fn test_master_reset() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        clock.master_reset();
        assert!(clock.is_idle());
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn test_start_events() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();

        let events = clock.check_event();
        assert!(events.contains(ClockEvents::START));
        assert!(events.contains(ClockEvents::RESET));

        // consumed
        assert!(clock.check_event().is_empty());
    }

    #[test]
    fn test_stop_and_continue_events() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        clock.check_event();

        clock.master_stop();
        assert!(clock.check_event().contains(ClockEvents::STOP));

        clock.master_continue();
        assert!(clock.check_event().contains(ClockEvents::CONTINUE));
    }

    #[test]
    fn test_reset_event() {
        let mut clock = clock();
        clock.init();
        clock.master_reset();
        assert!(clock.check_event().contains(ClockEvents::RESET));
    }

    #[test]
    fn test_tick_consumption() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        clock.check_event();

        // no ticks until the timer fires
        assert_eq!(clock.check_tick(), None);

        clock.on_timer_tick();
        clock.on_timer_tick();
        assert_eq!(clock.check_tick(), Some(0));
        assert_eq!(clock.check_tick(), Some(1));
        assert_eq!(clock.check_tick(), None);
    }

    #[test]
    fn test_listener_output_on_start() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();

        let recorded = recorded.lock().unwrap();
        let last = recorded.outputs.last().unwrap();
        assert!(last.run);
        assert!(last.reset);
    }

    #[test]
    fn test_listener_midi_start_stop() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.set_mode(ClockMode::Master);

        clock.master_start();
        assert!(recorded.lock().unwrap().midi.contains(&MidiMessage::START));

        recorded.lock().unwrap().midi.clear();
        clock.master_stop();
        assert!(recorded.lock().unwrap().midi.contains(&MidiMessage::STOP));
    }

    #[test]
    fn test_midi_clock_rate() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        recorded.lock().unwrap().midi.clear();

        // 96 internal ticks = one quarter note = 24 MIDI clocks
        for _ in 0..PPQN {
            clock.on_timer_tick();
        }
        let ticks = recorded
            .lock()
            .unwrap()
            .midi
            .iter()
            .filter(|&&m| m == MidiMessage::TICK)
            .count();
        assert_eq!(ticks, 24);
    }

    #[test]
    fn test_output_pulses_at_divisor() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.output_configure(24, 1000);
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        recorded.lock().unwrap().outputs.clear();

        for _ in 0..96 {
            clock.on_timer_tick();
        }
        // 96 ticks / divisor 24 = 4 rising pulse edges
        let pulses = recorded
            .lock()
            .unwrap()
            .outputs
            .iter()
            .filter(|s| s.pulse)
            .count();
        assert_eq!(pulses, 4);
    }

    #[test]
    fn test_output_swing_delays_odd_pulses() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.output_configure(24, 1);
        clock.output_configure_swing(75);
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        recorded.lock().unwrap().outputs.clear();

        let mut pulse_ticks = Vec::new();
        for tick in 0..96u32 {
            let before = recorded.lock().unwrap().outputs.len();
            clock.on_timer_tick();
            let outputs = recorded.lock().unwrap();
            if outputs.outputs[before..].iter().any(|s| s.pulse) {
                pulse_ticks.push(tick);
            }
        }
        // swing 75%: odd pulses delayed by (75-50)*24/100 = 6 ticks
        assert_eq!(pulse_ticks, vec![0, 30, 48, 78]);
    }

    #[test]
    fn test_pulse_width() {
        let (mut clock, recorded) = clock_with_listener();
        clock.init();
        clock.output_configure(24, 1000);
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        clock.on_timer_tick();
        assert!(clock.output_state().pulse);

        // a 120 BPM tick is ~5.2ms, far beyond the 1ms pulse width
        clock.on_timer_tick();
        assert!(!clock.output_state().pulse);
        let cleared = recorded
            .lock()
            .unwrap()
            .outputs
            .iter()
            .any(|s| !s.pulse && s.run);
        assert!(cleared);
    }

    #[test]
    fn test_slave_start() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_start(0);
        assert!(clock.is_running());
        assert_eq!(clock.active_mode(), ClockMode::Slave);
    }

    #[test]
    fn test_slave_stop() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_start(0);
        clock.slave_stop(0);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_disabled_slave_ignored() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, false);
        clock.slave_start(0);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_slave_via_midi_messages() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);

        clock.slave_handle_midi(0, MidiMessage::START);
        assert!(clock.is_running());

        clock.slave_handle_midi(0, MidiMessage::STOP);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_slave_continue_and_reset() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_start(0);
        clock.slave_stop(0);
        clock.slave_continue(0);
        assert!(clock.is_running());

        clock.slave_reset(0);
        assert!(clock.is_idle());
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn test_slave_divisor_yields_ticks() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_handle_midi(0, MidiMessage::START);
        clock.check_event();

        // 24 pulses per sequencer tick
        for _ in 0..23 {
            clock.slave_handle_midi(0, MidiMessage::TICK);
        }
        assert_eq!(clock.check_tick(), None);
        clock.slave_handle_midi(0, MidiMessage::TICK);
        assert_eq!(clock.check_tick(), Some(0));

        for _ in 0..24 {
            clock.slave_handle_midi(0, MidiMessage::TICK);
        }
        assert_eq!(clock.check_tick(), Some(1));
    }

    #[test]
    fn test_slave_bpm_estimation() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_handle_midi(0, MidiMessage::START);

        // 20ms pulse interval at 24 MIDI clocks per quarter = 125 BPM
        for _ in 0..48 {
            clock.advance(20_000);
            clock.slave_handle_midi(0, MidiMessage::TICK);
        }
        let bpm = clock.bpm();
        assert!((bpm - 125.0).abs() < 0.5, "estimated {} BPM", bpm);
    }

    #[test]
    fn test_slave_jitter_counts_drift() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_handle_midi(0, MidiMessage::START);

        for _ in 0..8 {
            clock.advance(20_000);
            clock.slave_handle_midi(0, MidiMessage::TICK);
        }
        assert_eq!(clock.slave_drift_count(0), 0);

        // a wildly late pulse trips the drift counter, playback goes on
        clock.advance(200_000);
        clock.slave_handle_midi(0, MidiMessage::TICK);
        assert_eq!(clock.slave_drift_count(0), 1);
        assert!(clock.is_running());
    }

    #[test]
    fn test_master_blocks_slave() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();

        clock.slave_configure(0, 24, true);
        clock.slave_start(0);
        assert_eq!(clock.active_mode(), ClockMode::Master);
    }

    #[test]
    fn test_slave_blocks_master() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Slave);
        clock.slave_configure(0, 24, true);
        clock.slave_start(0);

        clock.master_start();
        assert_eq!(clock.active_mode(), ClockMode::Slave);
    }

    #[test]
    fn test_slave_mode_blocks_master_start() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Slave);
        clock.master_start();
        assert!(clock.is_idle());
    }

    #[test]
    fn test_set_mode_stops_running_clock() {
        let mut clock = clock();
        clock.init();
        clock.set_mode(ClockMode::Master);
        clock.master_start();
        assert!(clock.is_running());

        clock.set_mode(ClockMode::Slave);
        assert!(clock.is_idle());
    }

    #[test]
    fn test_auto_latches_first_start() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);

        // slave got there first, master start is ignored
        clock.slave_handle_midi(0, MidiMessage::START);
        clock.master_start();
        assert_eq!(clock.active_mode(), ClockMode::Slave);

        // after reset the role is up for grabs again
        clock.slave_reset(0);
        clock.master_start();
        assert_eq!(clock.active_mode(), ClockMode::Master);
    }

    #[test]
    fn test_second_slave_ignored_while_first_active() {
        let mut clock = clock();
        clock.init();
        clock.slave_configure(0, 24, true);
        clock.slave_configure(1, 24, true);
        clock.slave_start(0);
        clock.check_event();
        assert_eq!(clock.check_tick(), None);

        // ticks from the other source are discarded
        for _ in 0..48 {
            clock.slave_handle_midi(1, MidiMessage::TICK);
        }
        assert_eq!(clock.check_tick(), None);
    }
}
