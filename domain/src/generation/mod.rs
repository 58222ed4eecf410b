//! Generation domain.
//!
//! - [`event::GenerationEvent`]: the ordered event protocol of a streamed generation
//! - [`value_objects::GenerationResult`]: the committed outcome of one generation

pub mod event;
pub mod value_objects;
