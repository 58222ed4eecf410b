//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod provider_gateway;
pub mod run_generation;
