use std::{io, path::PathBuf, result::Result as StdResult};
use thiserror::Error;

/// Custom Result type for mirror operations.
pub type Result<T> = StdResult<T, MirrorError>;

/// Mirror-specific error types.
///
/// A ref pattern that does not resolve is not an error: see
/// [`BareRepository::resolve`](crate::BareRepository::resolve).
#[derive(Error, Debug)]
pub enum MirrorError {
    /// A git command exited with a non-zero status where success was required.
    #[error("Git command failed: {command}\nError: {stderr}")]
    CommandFailed {
        /// The command line that was executed.
        command: String,
        /// The process exit status code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The git binary could not be launched at all.
    #[error("Failed to execute git command: {command}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying launch failure.
        #[source]
        source: io::Error,
    },

    /// A query was made against a mirror that has not been cloned.
    #[error("Mirror does not exist: {}", path.display())]
    NotCloned {
        /// Expected location of the mirror.
        path: PathBuf,
    },

    /// A path could not be passed to git because it is not valid UTF-8.
    #[error("Invalid path: {}", path.display())]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
    },

    /// The configuration file could not be read or parsed.
    #[error("Config error in {}: {message}", path.display())]
    Config {
        /// Path of the offending configuration file.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },
}

impl MirrorError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotCloned { .. } => 2,
            Self::Config { .. } => 3,
            Self::CommandFailed { .. } => 4,
            Self::Spawn { .. } => 5,
            Self::InvalidPath { .. } => 1,
        }
    }
}
