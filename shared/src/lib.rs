//! Shared types and models for the AquaMon water-quality platform
//!
//! This crate contains the domain model shared between the application
//! core, its external-service clients, and the tests: the user profile,
//! water report records, the fixed parameter catalog with its ideal
//! ranges, and the pure status evaluator.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
