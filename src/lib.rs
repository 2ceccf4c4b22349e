//! An interactive, line-oriented file manager shell.
//!
//! The user types short commands (`ls`, `cd`, `cp`, `hash`, `compress`, ...) and the
//! shell resolves each line to a built-in operation, runs it to completion and reports
//! the current working directory before prompting again.
//!
//! The main entry point is [`Interpreter`]. It owns the session [`env::Environment`]
//! and a table of [`command::CommandFactory`] objects that turn a parsed line into an
//! executable command. Failures are collapsed into the two user-facing kinds of
//! [`error::ShellError`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod fs_ops;
mod interpreter;
mod os_info;
pub mod parser;
mod table;

/// Re-export of the command runner and session loop.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Farewell, Input, Interpreter, LineSource};
