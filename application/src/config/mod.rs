//! Application-level configuration.
//!
//! - [`GenerationParams`]: model priority, sampling and context policy

pub mod generation_params;

pub use generation_params::GenerationParams;
