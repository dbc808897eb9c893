use super::OutputStream;
use std::{
    error::Error as StdError,
    fmt::{self, Display},
    io,
};

/// The specific cause of an [`Error`].
#[derive(Debug)]
pub enum Cause {
    SpawnFailed(io::Error),
    TempFileFailed(io::Error),
    CaptureFailed {
        stream: OutputStream,
        source: io::Error,
    },
    WaitFailed(io::Error),
    Stderr {
        message: String,
        exit_code: Option<i32>,
    },
    NoOutput {
        exit_code: Option<i32>,
    },
    WorkerPanicked,
}

/// The bearer of bad news.
#[derive(Debug)]
pub struct Error {
    command: String,
    cause: Box<Cause>,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.cause {
            Cause::SpawnFailed(err) => write!(
                f,
                "Failed to spawn child process for command {:?}: {}",
                self.command, err
            ),
            Cause::TempFileFailed(err) => write!(
                f,
                "Failed to create a temporary file for the output of command {:?}: {}",
                self.command, err
            ),
            Cause::CaptureFailed { stream, source } => write!(
                f,
                "Failed to read {} of command {:?}: {}",
                stream, self.command, source
            ),
            Cause::WaitFailed(err) => write!(
                f,
                "Failed to wait for child process for command {:?} to exit: {}",
                self.command, err
            ),
            Cause::Stderr { message, .. } => {
                write!(f, "Command {:?} failed: {}", self.command, message)
            }
            Cause::NoOutput { exit_code } => {
                write!(
                    f,
                    "Command {:?} finished without output or error message",
                    self.command
                )?;
                if let Some(exit_code) = exit_code {
                    write!(f, " (exit code {}).", exit_code)
                } else {
                    write!(f, " and returned no exit code.")
                }
            }
            Cause::WorkerPanicked => write!(
                f,
                "The worker running command {:?} panicked before reporting back.",
                self.command
            ),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &*self.cause {
            Cause::SpawnFailed(err) | Cause::TempFileFailed(err) | Cause::WaitFailed(err) => {
                Some(err as _)
            }
            Cause::CaptureFailed { source, .. } => Some(source as _),
            _ => None,
        }
    }
}

impl Error {
    pub fn new(command: impl Into<String>, cause: Cause) -> Self {
        Self {
            command: command.into(),
            cause: Box::new(cause),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// The stderr text, if that's what sank the command.
    pub fn message(&self) -> Option<&str> {
        if let Cause::Stderr { message, .. } = &*self.cause {
            Some(message)
        } else {
            None
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match &*self.cause {
            Cause::Stderr { exit_code, .. } | Cause::NoOutput { exit_code } => *exit_code,
            _ => None,
        }
    }

    /// Some tools (`simctl delete`, notably) say nothing at all when they
    /// succeed. That's only a success if the exit code agrees.
    pub fn is_silent_success(&self) -> bool {
        matches!(&*self.cause, Cause::NoOutput { exit_code: Some(0) })
    }
}
