use crate::error::CommandError;
use std::env as stdenv;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Session-level view of the process state used by the interpreter.
///
/// The environment contains:
/// - `user_name`: the name given at startup, used for greeting and farewell.
/// - `home_dir`: the directory the session starts in.
/// - `current_dir`: the working directory commands resolve relative paths against.
///
/// `current_dir` mirrors the process working directory; it only changes through
/// [`Environment::change_dir`].
#[derive(Debug, Clone)]
pub struct Environment {
    pub user_name: String,
    pub home_dir: PathBuf,
    current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// `home_dir` is read from `HOME` (or `USERPROFILE`), falling back to the
    /// process working directory.
    pub fn new(user_name: impl Into<String>) -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home_dir = ["HOME", "USERPROFILE"]
            .iter()
            .find_map(|key| stdenv::var_os(key).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
            .unwrap_or_else(|| current_dir.clone());
        Self {
            user_name: user_name.into(),
            home_dir,
            current_dir,
        }
    }

    /// Environment with explicit directories. The process working directory is left alone.
    pub fn with_dirs(user_name: impl Into<String>, home_dir: PathBuf, current_dir: PathBuf) -> Self {
        Self {
            user_name: user_name.into(),
            home_dir,
            current_dir,
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Resolve `path` against the current directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }

    /// Change the working directory of both the session and the process.
    pub fn change_dir(&mut self, path: impl AsRef<Path>) -> Result<(), CommandError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CommandError::InvalidArgument("cd: empty path".to_string()));
        }
        let canonical = fs::canonicalize(self.resolve(path))?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", canonical.display()),
            )
            .into());
        }
        stdenv::set_current_dir(&canonical)?;
        self.current_dir = canonical;
        Ok(())
    }
}
