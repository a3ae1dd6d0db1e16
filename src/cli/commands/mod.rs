//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`], which loads configuration once for all commands.

pub mod cache;
pub mod dispatcher;
pub mod resolve;
pub mod table;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
