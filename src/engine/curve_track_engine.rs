// Curve track engine - interpolates per-step shapes into a CV signal,
// optionally triggered and gated by an input track.

use crate::config::TRACK_COUNT;
use crate::engine::note_track_engine::{effective_pattern, relative_tick};
use crate::engine::rng::Rng;
use crate::engine::track_engine::{rotated, slide_toward, StepCursor, TickInfo, TrackOutput};
use crate::model::curve_sequence::{CurveSequence, TriggerShape};
use crate::model::track::{CurveTrackData, Track};
use crate::model::Project;

pub struct CurveTrackEngine {
    rng: Rng,
    cursor: StepCursor,
    step_index: usize,
    phase_ticks: u32,
    active: bool,
    last_input_gate: bool,
    cv_current: f32,
}

impl CurveTrackEngine {
    pub fn new(track_index: usize) -> Self {
        Self {
            rng: Rng::with_seed(track_index as u32 + 1),
            cursor: StepCursor::new(),
            step_index: 0,
            phase_ticks: 0,
            active: false,
            last_input_gate: false,
            cv_current: 0.0,
        }
    }

    pub fn reset(&mut self, track_index: usize) {
        *self = Self::new(track_index);
    }

    pub fn tick(
        &mut self,
        info: &TickInfo,
        _project: &Project,
        track: &Track,
        data: &CurveTrackData,
        peers: &[TrackOutput; TRACK_COUNT],
    ) -> TrackOutput {
        let pattern = effective_pattern(info, track);
        let sequence = &data.sequences[pattern];
        let divisor = sequence.divisor().max(1);

        let running = match data.input_track() {
            None => {
                // free running: phase follows the transport
                self.phase_ticks = relative_tick(info.tick, sequence.reset_measure());
                true
            }
            Some(input) => self.update_trigger(sequence, peers[input]),
        };

        let target = if running && info.audible {
            if self.phase_ticks % divisor == 0 {
                let first = sequence.first_step();
                let last = sequence.last_step();
                if self.phase_ticks == 0 {
                    self.cursor.reset();
                }
                let raw = self
                    .cursor
                    .advance(sequence.run_mode(), first, last, &mut self.rng);
                self.step_index = rotated(raw, track.rotate(), first, last);
            }
            let phase = (self.phase_ticks % divisor) as f32 / divisor as f32;
            let value = sequence.step(self.step_index).shape().value(phase);
            sequence.min() + value * (sequence.max() - sequence.min()) + sequence.offset()
        } else {
            sequence.min() + sequence.offset()
        };

        if running && data.input_track().is_some() {
            self.phase_ticks += 1;
        }

        self.cv_current = slide_toward(self.cv_current, target, track.slide_time(), info.dt);

        TrackOutput {
            gate: false,
            cv: self.cv_current,
            note: (self.cv_current * 12.0).round() as i32,
        }
    }

    fn update_trigger(&mut self, sequence: &CurveSequence, input: TrackOutput) -> bool {
        let gate = input.gate;
        let rising = gate && !self.last_input_gate;
        let falling = !gate && self.last_input_gate;
        self.last_input_gate = gate;

        let note_ok = sequence.note_passes_filter(input.note);
        match sequence.trigger_shape() {
            TriggerShape::Rise => {
                if rising && note_ok {
                    self.restart();
                }
            }
            TriggerShape::Fall => {
                if falling && note_ok {
                    self.restart();
                }
            }
            TriggerShape::Both => {
                if (rising || falling) && note_ok {
                    self.restart();
                }
            }
            TriggerShape::Gate => {
                if rising && note_ok {
                    self.restart();
                }
                // follow the gate: run only while it is high
                self.active = gate && (self.active || note_ok);
            }
        }
        self.active
    }

    fn restart(&mut self) {
        self.active = true;
        self.phase_ticks = 0;
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::curve_sequence::CurveShape;
    use crate::model::track::TrackKind;

    fn curve_project(input_track: i32) -> Project {
        let mut project = Project::new();
        project.track_mut(1).set_kind_tag(1);
        if let TrackKind::Curve(data) = project.track_mut(1).kind_mut() {
            data.set_input_track(input_track);
            let sequence = &mut data.sequences[0];
            sequence.set_divisor(24);
            sequence.set_first_step(0);
            sequence.set_last_step(0);
            sequence.set_min(0.0);
            sequence.set_max(5.0);
            sequence.step_mut(0).set_shape(CurveShape::RampUp);
        }
        project
    }

    fn info(tick: u32) -> TickInfo {
        TickInfo {
            tick,
            dt: 60.0 / (120.0 * 96.0),
            audible: true,
            fill: false,
            fill_amount: 100,
            pattern: 0,
        }
    }

    #[test]
    fn test_free_running_ramp() {
        let project = curve_project(-1);
        let mut engine = CurveTrackEngine::new(1);
        let track = project.track(1);
        let TrackKind::Curve(data) = track.kind() else {
            panic!("expected curve track");
        };
        let peers = [TrackOutput::default(); TRACK_COUNT];

        let mut last_cv = -1.0;
        for tick in 0..24 {
            let out = engine.tick(&info(tick), &project, track, data, &peers);
            // ramp up within the step: monotonically rising
            assert!(out.cv >= last_cv, "tick {}: {} < {}", tick, out.cv, last_cv);
            last_cv = out.cv;
        }
        // near the top of the 0..5V range at the end of the step
        assert!(last_cv > 4.0);
    }

    #[test]
    fn test_offset_shifts_output() {
        let mut project = curve_project(-1);
        if let TrackKind::Curve(data) = project.track_mut(1).kind_mut() {
            let sequence = &mut data.sequences[0];
            sequence.step_mut(0).set_shape(CurveShape::Low);
            sequence.set_offset(1.0);
        }
        let mut engine = CurveTrackEngine::new(1);
        let track = project.track(1);
        let TrackKind::Curve(data) = track.kind() else {
            panic!()
        };
        let peers = [TrackOutput::default(); TRACK_COUNT];
        let out = engine.tick(&info(0), &project, track, data, &peers);
        assert!((out.cv - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rise_trigger_restarts_curve() {
        let project = curve_project(0);
        let mut engine = CurveTrackEngine::new(1);
        let track = project.track(1);
        let TrackKind::Curve(data) = track.kind() else {
            panic!()
        };
        let mut peers = [TrackOutput::default(); TRACK_COUNT];

        // no trigger yet: output rests at min + offset
        let out = engine.tick(&info(0), &project, track, data, &peers);
        assert!(out.cv < 0.1);

        // rising edge starts the ramp
        peers[0].gate = true;
        let mut cv = Vec::new();
        for tick in 1..24 {
            let out = engine.tick(&info(tick), &project, track, data, &peers);
            cv.push(out.cv);
        }
        assert!(cv.last().unwrap() > &3.0);

        // second rising edge restarts from the bottom
        peers[0].gate = false;
        engine.tick(&info(24), &project, track, data, &peers);
        peers[0].gate = true;
        let out = engine.tick(&info(25), &project, track, data, &peers);
        assert!(out.cv < 1.0);
    }

    #[test]
    fn test_gate_shape_follows_gate() {
        let mut project = curve_project(0);
        if let TrackKind::Curve(data) = project.track_mut(1).kind_mut() {
            data.sequences[0].set_trigger_shape(TriggerShape::Gate);
            data.sequences[0].step_mut(0).set_shape(CurveShape::High);
        }
        let mut engine = CurveTrackEngine::new(1);
        let track = project.track(1);
        let TrackKind::Curve(data) = track.kind() else {
            panic!()
        };
        let mut peers = [TrackOutput::default(); TRACK_COUNT];

        peers[0].gate = true;
        let mut out = TrackOutput::default();
        for tick in 0..12 {
            out = engine.tick(&info(tick), &project, track, data, &peers);
        }
        assert!(out.cv > 4.0);

        // gate drops: output falls back to the resting level
        peers[0].gate = false;
        for tick in 12..24 {
            out = engine.tick(&info(tick), &project, track, data, &peers);
        }
        assert!(out.cv < 1.0);
    }

    #[test]
    fn test_note_filter_blocks_trigger() {
        let mut project = curve_project(0);
        if let TrackKind::Curve(data) = project.track_mut(1).kind_mut() {
            data.sequences[0].set_note_filter_min(0);
            data.sequences[0].set_note_filter_max(12);
        }
        let mut engine = CurveTrackEngine::new(1);
        let track = project.track(1);
        let TrackKind::Curve(data) = track.kind() else {
            panic!()
        };
        let mut peers = [TrackOutput::default(); TRACK_COUNT];

        // note outside the filter range: the rising edge is ignored
        peers[0].gate = true;
        peers[0].note = 30;
        for tick in 0..24 {
            let out = engine.tick(&info(tick), &project, track, data, &peers);
            assert!(out.cv < 0.1, "tick {}", tick);
        }
    }
}
