// Stochastic track engine - note evaluation with interval rest draws
// and a reseedable generator for repeatable "random" patterns.

use crate::engine::note_track_engine::{effective_pattern, relative_tick};
use crate::engine::rng::Rng;
use crate::engine::track_engine::{
    biased, probability, rotated, schedule_gate, slide_toward, variation, GateQueue, StepCursor,
    TickInfo, TrackOutput,
};
use crate::model::stochastic_sequence::StochasticSequence;
use crate::model::track::{StochasticTrackData, Track};
use crate::model::types::{ConditionState, CvUpdateMode, FillMode};
use crate::model::Project;

pub struct StochasticTrackEngine {
    rng: Rng,
    cursor: StepCursor,
    gate_queue: GateQueue,
    gate: bool,
    cv_current: f32,
    cv_target: f32,
    slide_active: bool,
    note: i32,
    last_played: bool,
    step_counter: u32,
    seeded: bool,
}

impl StochasticTrackEngine {
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
            step_counter: 0,
            seeded: false,
        }
    }

    pub fn reset(&mut self, track_index: usize) {
        *self = Self::new(track_index);
    }

    /// Restore the generator to the sequence's stored seed so the
    /// "random" pattern repeats from the top.
    pub fn reseed(&mut self, seed: u32) {
        self.rng = Rng::with_seed(seed);
        self.seeded = true;
        self.cursor.reset();
        self.step_counter = 0;
    }

    pub fn tick(
        &mut self,
        info: &TickInfo,
        project: &Project,
        track: &Track,
        data: &StochasticTrackData,
    ) -> TrackOutput {
        let pattern = effective_pattern(info, track);
        let sequence = &data.sequences[pattern];

        if !self.seeded {
            self.reseed(sequence.seed());
        }

        let divisor = sequence.divisor().max(1);
        let relative = relative_tick(info.tick, sequence.reset_measure());
        if relative % divisor == 0 {
            if relative == 0 {
                self.cursor.reset();
                self.step_counter = 0;
            }
            self.evaluate_step(info, project, track, sequence, divisor);
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
        sequence: &StochasticSequence,
        divisor: u32,
    ) {
        let (first, last) = if sequence.use_loop() {
            (sequence.loop_first_step(), sequence.loop_last_step())
        } else {
            (sequence.first_step(), sequence.last_step())
        };
        let raw = self
            .cursor
            .advance(sequence.run_mode(), first, last, &mut self.rng);
        let step_index = rotated(raw, track.rotate(), first, last);
        let step = sequence.step(step_index);

        let position = self.step_counter;
        self.step_counter += 1;

        let condition_state = ConditionState {
            fill: info.fill,
            pre: self.last_played,
            iteration: self.cursor.iteration(),
        };
        let condition_ok = step.condition().evaluate(&condition_state);

        // interval rest draws are the stochastic core: every 2nd, 4th,
        // 8th and 15th step may be forced to rest
        let rest = self.draw_rest(sequence, position);

        let fill_gates = info.fill && track.fill_mode() == FillMode::Gates;
        let gate_armed = step.gate() || fill_gates;
        let fires = info.audible
            && condition_ok
            && !rest
            && gate_armed
            && self.rng.coin(probability(biased(
                step.gate_probability(),
                track.gate_probability_bias(),
            )));
        self.last_played = fires;

        let update_cv = fires || track.cv_update_mode() == CvUpdateMode::Always;
        if update_cv {
            let note = self.resolve_note(project, track, sequence, step_index);
            self.note = note;
            self.cv_target = note as f32 / 12.0;
            self.slide_active = step.slide();
        }

        if fires {
            let offset = step.gate_offset().max(0) as u32;
            let on_tick = info.tick + offset.min(divisor - 1);

            let mut length = biased(step.length(), track.length_bias());
            if step.length_variation_range() != 0
                && self
                    .rng
                    .coin(probability(step.length_variation_probability()))
            {
                length += variation(&mut self.rng, step.length_variation_range());
            }
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

    fn draw_rest(&mut self, sequence: &StochasticSequence, position: u32) -> bool {
        let mut rest = false;
        for (interval, percent) in [
            (2, sequence.rest_probability_2()),
            (4, sequence.rest_probability_4()),
            (8, sequence.rest_probability_8()),
            (15, sequence.rest_probability_15()),
        ] {
            if percent > 0 && (position + 1) % interval == 0 {
                // draw even when an earlier interval already rested, so
                // the stream of random numbers stays aligned
                if self.rng.coin(percent as f32 / 100.0) {
                    rest = true;
                }
            }
        }
        rest
    }

    fn resolve_note(
        &mut self,
        project: &Project,
        track: &Track,
        sequence: &StochasticSequence,
        step_index: usize,
    ) -> i32 {
        let step = sequence.step(step_index);
        let mut note = step.note();
        if step.note_variation_range() != 0
            && self.rng.coin(probability(biased(
                step.note_variation_probability(),
                track.note_probability_bias(),
            )))
        {
            note += variation(&mut self.rng, step.note_variation_range());
        }

        // the octave range constrains the sequence's own excursions
        let octave = track.octave()
            + step
                .octave()
                .clamp(sequence.octave_range_low(), sequence.octave_range_high());

        let semitones = if step.bypass_scale() {
            sequence.root_note() + note
        } else {
            project.scale_note_to_semitone(sequence.scale(), sequence.root_note() + note)
        };
        semitones + 12 * octave + track.transpose()
    }
}
