//! AquaMon application library
//!
//! Everything behind the console front-end: configuration, the local
//! JSON store, the report session state machine, and the external
//! weather and AI clients.

pub mod config;
pub mod error;
pub mod external;
pub mod session;
pub mod store;
pub mod threat;

pub use config::Config;
pub use error::{AppError, AppResult};
