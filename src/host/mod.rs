//! Host module for external process execution

pub mod command_runner;

pub use command_runner::{CommandError, CommandOptions, CommandResult, CommandRunner};
