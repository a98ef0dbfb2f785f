//! Core data models: configuration, identifier, outcome

mod build_info;
mod config;
mod identifier;
mod outcome;

pub use build_info::*;
pub use config::*;
pub use identifier::*;
pub use outcome::*;
