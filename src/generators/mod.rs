// Rhythm primitives and sequence generators

pub mod euclidean;
pub mod random;
pub mod rhythm;
pub mod sequence_builder;

pub use euclidean::EuclideanGenerator;
pub use random::RandomGenerator;
pub use rhythm::Pattern;
pub use sequence_builder::{NoteSequenceBuilder, SequenceBuilder};
