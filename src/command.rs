use crate::env::Environment;
use crate::error::CommandError;
use std::io::Write;

/// What the session should do after a command finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Report the working directory and prompt again.
    Continue,
    /// End the session.
    Exit,
}

/// Object-safe trait for a resolved command, bound to its arguments.
///
/// An instance is created per input line and executed exactly once.
pub trait ExecutableCommand {
    /// Executes the command, writing any user-visible output to `stdout`.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow, CommandError>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name` or when the
/// arguments don't satisfy the command's arity. Both cases look the same to the caller.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
