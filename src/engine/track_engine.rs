// Shared track engine plumbing - step cursor traversal, the gate edge
// queue and the probability helpers every variant draws from.

use crate::engine::rng::Rng;
use crate::model::types::RunMode;

/// Per-track output of one tick, also what peer tracks observe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackOutput {
    pub gate: bool,
    /// CV in volts (1 V/octave).
    pub cv: f32,
    /// Last played note in semitones relative to 0 V.
    pub note: i32,
}

/// Per-tick evaluation context handed to every track engine.
#[derive(Debug, Clone, Copy)]
pub struct TickInfo {
    pub tick: u32,
    /// Tick duration in seconds, for slide filtering.
    pub dt: f32,
    /// False while the track is muted (or sidelined by a solo).
    pub audible: bool,
    /// Effective fill state for this track.
    pub fill: bool,
    /// Fill amount in percent.
    pub fill_amount: i32,
    /// Active sequence index resolved from play state.
    pub pattern: usize,
}

/// Probability value 0..=7 read as (value + 1) / 8.
pub fn probability(value: i32) -> f32 {
    (value.clamp(0, 7) + 1) as f32 / 8.0
}

/// A track bias of -1 keeps the step value, anything else replaces it.
pub fn biased(step_value: i32, bias: i32) -> i32 {
    if bias >= 0 {
        bias
    } else {
        step_value
    }
}

/// Uniform draw over the signed variation range [0, range] or
/// [range, 0].
pub fn variation(rng: &mut Rng, range: i32) -> i32 {
    if range == 0 {
        0
    } else {
        rng.next_i32(range.min(0), range.max(0))
    }
}

/// Exponential approach used for slide. `slide_time` is 0..=100; zero
/// jumps immediately.
pub fn slide_toward(current: f32, target: f32, slide_time: i32, dt: f32) -> f32 {
    if slide_time <= 0 {
        return target;
    }
    // 100% slide is a ~0.5s time constant
    let tau = slide_time as f32 / 100.0 * 0.5;
    let coefficient = dt / (tau + dt);
    current + (target - current) * coefficient
}

/// Step cursor over [first, last] honoring the sequence run mode.
#[derive(Debug, Clone, Copy)]
pub struct StepCursor {
    index: i32,
    direction: i32,
    steps_taken: u32,
    iteration: u32,
}

impl StepCursor {
    pub fn new() -> Self {
        Self {
            index: -1,
            direction: 1,
            steps_taken: 0,
            iteration: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Completed passes over the step window.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Advance one step and return the new step index.
    pub fn advance(&mut self, mode: RunMode, first: usize, last: usize, rng: &mut Rng) -> usize {
        let first = first as i32;
        let last = last.max(first as usize) as i32;
        let span = last - first + 1;

        let next = match mode {
            RunMode::Forward => {
                if self.index < first || self.index >= last {
                    if self.index >= last {
                        self.iteration += 1;
                    }
                    first
                } else {
                    self.index + 1
                }
            }
            RunMode::Backward => {
                if self.index <= first || self.index > last {
                    if self.index == first && self.steps_taken > 0 {
                        self.iteration += 1;
                    }
                    last
                } else {
                    self.index - 1
                }
            }
            RunMode::PingPong => {
                if self.index < first {
                    self.direction = 1;
                    first
                } else {
                    let mut next = self.index + self.direction;
                    if next > last {
                        self.direction = -1;
                        next = (last - 1).max(first);
                        self.iteration += 1;
                    } else if next < first {
                        self.direction = 1;
                        next = (first + 1).min(last);
                    }
                    next
                }
            }
            RunMode::Random => first + rng.next_range(span as u32) as i32,
            RunMode::RandomWalk => {
                if self.index < first || self.index > last {
                    first + rng.next_range(span as u32) as i32
                } else {
                    // +-1 with reflection at the window bounds
                    let delta = if rng.coin(0.5) { 1 } else { -1 };
                    let mut next = self.index + delta;
                    if next > last {
                        next = last - 1;
                    }
                    if next < first {
                        next = first + 1;
                    }
                    next.clamp(first, last)
                }
            }
        };

        self.steps_taken += 1;
        if matches!(mode, RunMode::Random | RunMode::RandomWalk)
            && self.steps_taken % span as u32 == 0
        {
            self.iteration += 1;
        }
        self.index = next;
        next as usize
    }
}

impl Default for StepCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a track's rotate parameter to a cursor position.
pub fn rotated(index: usize, rotate: i32, first: usize, last: usize) -> usize {
    let span = (last - first + 1) as i32;
    let offset = (index as i32 - first as i32 + rotate).rem_euclid(span);
    first + offset as usize
}

const GATE_QUEUE_CAPACITY: usize = 16;

/// Fixed-capacity queue of scheduled gate edges, ordered by tick.
#[derive(Debug, Clone, Copy)]
pub struct GateQueue {
    events: [(u32, bool); GATE_QUEUE_CAPACITY],
    len: usize,
}

impl GateQueue {
    pub fn new() -> Self {
        Self {
            events: [(0, false); GATE_QUEUE_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Insert an edge, keeping the queue sorted. When full the oldest
    /// pending edge is dropped.
    pub fn push(&mut self, tick: u32, gate: bool) {
        if self.len == GATE_QUEUE_CAPACITY {
            self.events.copy_within(1.., 0);
            self.len -= 1;
        }
        let mut position = self.len;
        while position > 0 && self.events[position - 1].0 > tick {
            self.events[position] = self.events[position - 1];
            position -= 1;
        }
        self.events[position] = (tick, gate);
        self.len += 1;
    }

    /// Pop the next edge due at or before `tick`.
    pub fn pop_due(&mut self, tick: u32) -> Option<bool> {
        if self.len == 0 || self.events[0].0 > tick {
            return None;
        }
        let gate = self.events[0].1;
        self.events.copy_within(1.., 0);
        self.len -= 1;
        Some(gate)
    }
}

impl Default for GateQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Schedule the on/off edges for one fired step, splitting the window
/// into sub-pulses when retrigger is set.
pub fn schedule_gate(
    queue: &mut GateQueue,
    on_tick: u32,
    length_ticks: u32,
    retrigger: i32,
) {
    let length_ticks = length_ticks.max(1);
    if retrigger > 0 {
        let pulses = retrigger as u32 + 1;
        let sub = (length_ticks / pulses).max(1);
        for pulse in 0..pulses {
            let start = on_tick + pulse * sub;
            queue.push(start, true);
            queue.push(start + (sub / 2).max(1), false);
        }
    } else {
        queue.push(on_tick, true);
        queue.push(on_tick + length_ticks, false);
    }
}
