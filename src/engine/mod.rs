// Sequencer engine - clock, per-track engines and the tick loop

pub mod arp_track_engine;
pub mod clock;
pub mod curve_track_engine;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod logic_track_engine;
pub mod midi_cv_track_engine;
pub mod note_track_engine;
pub mod rng;
pub mod stochastic_track_engine;
pub mod track_engine;

pub use clock::{Clock, ClockEvents, ClockListener, ClockOutputState, ClockTimer, NullTimer};
pub use engine::Engine;
pub use rng::Rng;
pub use track_engine::{TickInfo, TrackOutput};
