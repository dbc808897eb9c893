use super::{Cause, Error, Result};
use std::{
    borrow::Cow,
    fmt::{self, Display},
    process::ExitStatus,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputStream {
    Out,
    Err,
}

impl Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl OutputStream {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "stdout",
            Self::Err => "stderr",
        }
    }
}

/// Everything a finished child left behind.
#[derive(Debug)]
pub struct Output {
    command: String,
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Output {
    pub(crate) fn new(command: String, status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            command,
            status,
            stdout,
            stderr,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn stream(&self, stream: OutputStream) -> &[u8] {
        match stream {
            OutputStream::Out => &self.stdout,
            OutputStream::Err => &self.stderr,
        }
    }

    pub fn stdout(&self) -> &[u8] {
        self.stream(OutputStream::Out)
    }

    pub fn stderr(&self) -> &[u8] {
        self.stream(OutputStream::Err)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Non-empty stdout always wins; tools like `simctl` print warnings to
    /// stderr next to perfectly valid data.
    pub fn into_result(self) -> Result<Vec<u8>> {
        if !self.status.success() {
            log::info!(
                "command {:?} exited with {}; deciding the outcome from its output",
                self.command,
                self.status
            );
        }
        resolve(&self.command, self.status.code(), self.stdout, &self.stderr)
    }
}

pub(crate) fn resolve(
    command: &str,
    exit_code: Option<i32>,
    stdout: Vec<u8>,
    stderr: &[u8],
) -> Result<Vec<u8>> {
    if !stdout.is_empty() {
        if !stderr.is_empty() {
            log::warn!(
                "command {:?} wrote to stderr alongside its output: {}",
                command,
                String::from_utf8_lossy(stderr).trim_end()
            );
        }
        Ok(stdout)
    } else if !stderr.is_empty() {
        Err(Error::new(
            command,
            Cause::Stderr {
                message: String::from_utf8_lossy(stderr).trim_end().to_owned(),
                exit_code,
            },
        ))
    } else {
        Err(Error::new(command, Cause::NoOutput { exit_code }))
    }
}
