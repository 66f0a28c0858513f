//! Domain models for the AquaMon water-quality platform

mod parameters;
mod report;
mod user;
mod weather;

pub use parameters::*;
pub use report::*;
pub use user::*;
pub use weather::*;
