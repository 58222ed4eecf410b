//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: identifier of an upstream text-generation model
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
