// Note track engine - per-tick evaluation of a note sequence into
// gate edges, CV and the note value peers observe.

use crate::config::{MEASURE_TICKS, SEQUENCE_COUNT};
use crate::engine::rng::Rng;
use crate::engine::track_engine::{
    biased, probability, rotated, schedule_gate, slide_toward, variation, GateQueue, StepCursor,
    TickInfo, TrackOutput,
};
use crate::model::note_sequence::NoteSequence;
use crate::model::track::{NoteTrackData, Track};
use crate::model::types::{ConditionState, CvUpdateMode, FillMode};
use crate::model::Project;

pub struct NoteTrackEngine {
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

impl NoteTrackEngine {
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
        data: &NoteTrackData,
    ) -> TrackOutput {
        let pattern = effective_pattern(info, track);
        let sequence = &data.sequences[pattern];

        let divisor = sequence.divisor().max(1);
        let relative = relative_tick(info.tick, sequence.reset_measure());
        if relative % divisor == 0 {
            if relative == 0 {
                self.cursor.reset();
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
        sequence: &NoteSequence,
        divisor: u32,
    ) {
        let first = sequence.first_step();
        let last = sequence.last_step();
        let raw = self
            .cursor
            .advance(sequence.run_mode(), first, last, &mut self.rng);
        let step_index = rotated(raw, track.rotate(), first, last);
        let step = sequence.step(step_index);

        let condition_state = ConditionState {
            fill: info.fill,
            pre: self.last_played,
            iteration: self.cursor.iteration(),
        };
        let condition_ok = step.condition().evaluate(&condition_state);

        let fill_gates = info.fill && track.fill_mode() == FillMode::Gates;
        let gate_armed = step.gate() || fill_gates;
        let gate_probability = if fill_gates && !step.gate() {
            // fill-injected gates follow the fill amount
            info.fill_amount as f32 / 100.0
        } else {
            probability(biased(step.gate_probability(), track.gate_probability_bias()))
        };

        let fires = info.audible
            && condition_ok
            && gate_armed
            && self.rng.coin(gate_probability);
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
            let length_ticks = self.resolve_length(track, sequence, step_index, divisor);
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
        sequence: &NoteSequence,
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

        let semitones = if step.bypass_scale() {
            sequence.root_note() + note
        } else {
            project.scale_note_to_semitone(sequence.scale(), sequence.root_note() + note)
        };
        semitones + 12 * track.octave() + track.transpose()
    }

    fn resolve_length(
        &mut self,
        track: &Track,
        sequence: &NoteSequence,
        step_index: usize,
        divisor: u32,
    ) -> u32 {
        let step = sequence.step(step_index);
        let mut length = biased(step.length(), track.length_bias());
        if step.length_variation_range() != 0
            && self
                .rng
                .coin(probability(step.length_variation_probability()))
        {
            length += variation(&mut self.rng, step.length_variation_range());
        }
        ((length.clamp(0, 15) as u32 * divisor) / 16).max(1)
    }
}

/// The fill mode NextPattern plays the following pattern while fill is
/// held.
pub fn effective_pattern(info: &TickInfo, track: &Track) -> usize {
    let mut pattern = info.pattern;
    if info.fill && track.fill_mode() == FillMode::NextPattern {
        pattern += 1;
    }
    pattern.min(SEQUENCE_COUNT - 1)
}

/// Tick relative to the sequence's reset measure.
pub fn relative_tick(tick: u32, reset_measure: u32) -> u32 {
    if reset_measure > 0 {
        tick % (reset_measure * MEASURE_TICKS)
    } else {
        tick
    }
}
