// Pattern data model - project, tracks, sequences and packed steps

mod bitfield;

pub mod arp_sequence;
pub mod arpeggiator;
pub mod clock_setup;
pub mod curve_sequence;
pub mod logic_sequence;
pub mod midi_output;
pub mod note_sequence;
pub mod play_state;
pub mod project;
pub mod routable;
pub mod routing;
pub mod scale;
pub mod song;
pub mod stochastic_sequence;
pub mod track;
pub mod types;

pub use arp_sequence::ArpSequence;
pub use arpeggiator::{ArpMode, Arpeggiator};
pub use clock_setup::{ClockMode, ClockSetup};
pub use curve_sequence::{CurveSequence, CurveShape, TriggerShape};
pub use logic_sequence::{GateLogic, LogicSequence, NoteLogic};
pub use midi_output::{MidiOutput, MidiOutputSetup, MidiOutputTarget};
pub use note_sequence::{NoteLayer, NoteSequence, Step};
pub use play_state::{PlayState, TrackOp};
pub use project::{load_project, save_project, Project};
pub use routable::Routable;
pub use routing::{Route, Routing, RoutingSource, RoutingTarget};
pub use scale::{Scale, UserScale};
pub use song::{Song, SongSlot};
pub use stochastic_sequence::{StochasticSequence, StochasticStep};
pub use track::{Track, TrackKind};
pub use types::{Condition, ConditionState, CvUpdateMode, FillMode, MidiPort, PlayMode, RunMode};
