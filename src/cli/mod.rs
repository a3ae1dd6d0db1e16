//! Command-line interface for taluka-geo.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ResolveArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
