//! Error types for commands and the two user-facing failure kinds.

use std::io;
use thiserror::Error;

/// Failure reported by a command while it runs.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The filesystem or the OS refused the operation.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The command itself detected that the operation can't be done,
    /// e.g. the rename target already exists.
    #[error("{0}")]
    Failed(String),

    /// The arguments have the right count but can't be used.
    #[error("{0}")]
    InvalidArgument(String),
}

/// The category every failure collapses into before it is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    OperationFailed,
}

impl CommandError {
    /// Classifies this failure.
    ///
    /// Anything that happened while performing a well-formed operation is an
    /// operation failure; unusable arguments are an input error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Io(_) | CommandError::Failed(_) => ErrorKind::OperationFailed,
            CommandError::InvalidArgument(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Normalized error returned by the interpreter.
///
/// The displayed message is fixed per kind. `detail` keeps the original
/// message for diagnostics and is never printed to the user.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Invalid input")]
    InvalidInput { detail: Option<String> },

    #[error("Operation failed")]
    OperationFailed { detail: Option<String> },
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ShellError::OperationFailed { .. } => ErrorKind::OperationFailed,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ShellError::InvalidInput { detail } | ShellError::OperationFailed { detail } => {
                detail.as_deref()
            }
        }
    }
}

impl From<CommandError> for ShellError {
    fn from(err: CommandError) -> Self {
        let detail = Some(err.to_string());
        match err.kind() {
            ErrorKind::InvalidInput => ShellError::InvalidInput { detail },
            ErrorKind::OperationFailed => ShellError::OperationFailed { detail },
        }
    }
}
