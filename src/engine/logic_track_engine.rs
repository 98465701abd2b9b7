// Logic track engine - combines the outputs of two input tracks with
// per-step gate/note operators. Cross-track reads observe the stored
// peer outputs: tracks evaluated earlier this tick are current, later
// ones are one tick old, which breaks dependency cycles.

use crate::config::TRACK_COUNT;
use crate::engine::note_track_engine::{effective_pattern, relative_tick};
use crate::engine::rng::Rng;
use crate::engine::track_engine::{
    biased, probability, rotated, schedule_gate, slide_toward, variation, GateQueue, StepCursor,
    TickInfo, TrackOutput,
};
use crate::model::logic_sequence::LogicSequence;
use crate::model::track::{LogicTrackData, Track};
use crate::model::types::ConditionState;
use crate::model::Project;

pub struct LogicTrackEngine {
    rng: Rng,
    cursor: StepCursor,
    gate_queue: GateQueue,
    gate: bool,
    cv_current: f32,
    cv_target: f32,
    slide_active: bool,
    note: i32,
    last_played: bool,
}

impl LogicTrackEngine {
    pub fn new(track_index: usize) -> Self {
        Self {
            rng: Rng::with_seed(track_index as u32 + 1),
            cursor: StepCursor::new(),
            gate_queue: GateQueue::new(),
            gate: false,
            cv_current: 0.0,
            cv_target: 0.0,
            slide_active: false,
            note: 0,
            last_played: false,
        }
    }

    pub fn reset(&mut self, track_index: usize) {
        *self = Self::new(track_index);
    }

    pub fn tick(
        &mut self,
        info: &TickInfo,
        project: &Project,
        track: &Track,
        data: &LogicTrackData,
        peers: &[TrackOutput; TRACK_COUNT],
    ) -> TrackOutput {
        let pattern = effective_pattern(info, track);
        let sequence = &data.sequences[pattern];

        let divisor = sequence.divisor().max(1);
        let relative = relative_tick(info.tick, sequence.reset_measure());
        if relative % divisor == 0 {
            if relative == 0 {
                self.cursor.reset();
            }
            self.evaluate_step(info, project, track, sequence, divisor, peers);
        }

        while let Some(gate) = self.gate_queue.pop_due(info.tick) {
            self.gate = gate;
        }

        self.cv_current = if self.slide_active {
            slide_toward(self.cv_current, self.cv_target, track.slide_time(), info.dt)
        } else {
            self.cv_target
        };

        TrackOutput {
            gate: self.gate,
            cv: self.cv_current,
            note: self.note,
        }
    }

    fn evaluate_step(
        &mut self,
        info: &TickInfo,
        project: &Project,
        track: &Track,
        sequence: &LogicSequence,
        divisor: u32,
        peers: &[TrackOutput; TRACK_COUNT],
    ) {
        let first = sequence.first_step();
        let last = sequence.last_step();
        let raw = self
            .cursor
            .advance(sequence.run_mode(), first, last, &mut self.rng);
        let step_index = rotated(raw, track.rotate(), first, last);
        let step = sequence.step(step_index);

        let input_a = sequence.input_track_a().map(|t| peers[t]);
        let input_b = sequence.input_track_b().map(|t| peers[t]);

        let gate_a = input_a.map_or(false, |o| o.gate);
        let gate_b = input_b.map(|o| o.gate);
        let note_a = input_a.map_or(0, |o| o.note);
        let note_b = input_b.map(|o| (o.gate, o.note));

        let condition_state = ConditionState {
            fill: info.fill,
            pre: self.last_played,
            iteration: self.cursor.iteration(),
        };
        let condition_ok = step.condition().evaluate(&condition_state);

        let gate_result = step.evaluate_gate_logic(gate_a, gate_b);
        let note_result = step.evaluate_note_logic(note_a, note_b, track.transpose());
        let note_ok = note_result.map_or(false, |n| sequence.note_passes_filter(n));

        let fires = info.audible
            && condition_ok
            && gate_result
            && note_ok
            && self.rng.coin(probability(biased(
                step.gate_probability(),
                track.gate_probability_bias(),
            )));
        self.last_played = fires;

        if fires {
            let note = self.resolve_note(project, track, note_result.unwrap_or(0), step_index, sequence);
            self.note = note;
            self.cv_target = note as f32 / 12.0;
            self.slide_active = step.slide();

            let offset = step.gate_offset().max(0) as u32;
            let on_tick = info.tick + offset.min(divisor - 1);
            let length = biased(step.length(), track.length_bias());
            let length_ticks = ((length.clamp(0, 15) as u32 * divisor) / 16).max(1);
            let retrigger = if step.retrigger() > 0
                && self.rng.coin(probability(biased(
                    step.retrigger_probability(),
                    track.retrigger_probability_bias(),
                ))) {
                step.retrigger()
            } else {
                0
            };
            schedule_gate(&mut self.gate_queue, on_tick, length_ticks, retrigger);
        }
    }

    fn resolve_note(
        &mut self,
        project: &Project,
        track: &Track,
        input_note: i32,
        step_index: usize,
        sequence: &LogicSequence,
    ) -> i32 {
        let step = sequence.step(step_index);
        let mut note = input_note;
        if step.note_variation_range() != 0
            && self.rng.coin(probability(biased(
                step.note_variation_probability(),
                track.note_probability_bias(),
            )))
        {
            note += variation(&mut self.rng, step.note_variation_range());
        }

        // input notes are already semitones; only requantize when the
        // step asks for scale treatment to be bypassed explicitly
        let semitones = if step.bypass_scale() {
            note
        } else {
            project.scale_note_to_semitone(0, note)
        };
        semitones + 12 * track.octave()
    }
}
