//! External service integrations

pub mod gemini;
pub mod weather;
