//! Builds external commands and captures everything they print.
//!
//! Capture goes through `duct`, which drains stdout and stderr on their own
//! threads while the child runs. Reading only after the child exits deadlocks
//! as soon as the output outgrows the pipe buffer, which `simctl list -j` does
//! easily. Exit status is never checked here; [`Output::into_result`] decides.

mod error;
mod output;

mod result {
    pub type Result<T> = std::result::Result<T, super::error::Error>;
}

pub use self::{error::*, output::*, result::*};

use crate::DuctExpressionExt as _;
use std::{
    ffi::{OsStr, OsString},
    fmt::{self, Display},
    fs,
    path::PathBuf,
};

/// Build and run commands, keeping a printable form around for logs and errors.
#[derive(Clone, Debug)]
pub struct Command {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    pure: bool,
    display: String,
    expect_large_output: bool,
    spill_dir: Option<PathBuf>,
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Command {
    fn push_display(&mut self, component: &OsStr) {
        if !self.display.is_empty() {
            self.display.push(' ');
        }
        self.display.push_str(component.to_string_lossy().as_ref());
    }

    /// Start building a command that inherits all env vars from the environment.
    pub fn impure(name: impl AsRef<OsStr>) -> Self {
        let name = name.as_ref();
        let mut this = Self {
            program: PathBuf::from(name),
            args: Default::default(),
            env: Default::default(),
            pure: false,
            display: Default::default(),
            expect_large_output: false,
            spill_dir: None,
        };
        this.push_display(name);
        this
    }

    /// Start building a command with a completely clean environment. Note that
    /// at minimum, you'll often want to add `PATH` and `HOME` to the environment
    /// for `xcrun` to find anything.
    pub fn pure(name: impl AsRef<OsStr>) -> Self {
        let mut this = Self::impure(name);
        this.pure = true;
        this
    }

    /// Get the command's string representation.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn expects_large_output(&self) -> bool {
        self.expect_large_output
    }

    /// Spill stdout into a temporary file instead of reading it from a pipe.
    pub fn set_expect_large_output(&mut self, expect_large_output: bool) -> &mut Self {
        self.expect_large_output = expect_large_output;
        self
    }

    pub fn with_expect_large_output(mut self, expect_large_output: bool) -> Self {
        self.set_expect_large_output(expect_large_output);
        self
    }

    /// Where spill files go. Defaults to the system temp dir.
    pub fn set_spill_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.spill_dir = Some(dir.into());
        self
    }

    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.set_spill_dir(dir);
        self
    }

    pub fn add_env_var(&mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) -> &mut Self {
        let key = key.as_ref();
        let val = val.as_ref();
        log::debug!(
            "adding env var {:?} = {:?} to command {:?}",
            key,
            val,
            self.display
        );
        self.env.push((key.to_owned(), val.to_owned()));
        self
    }

    pub fn with_env_var(mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) -> Self {
        self.add_env_var(key, val);
        self
    }

    pub fn add_env_vars(
        &mut self,
        vars: impl IntoIterator<Item = (impl AsRef<OsStr>, impl AsRef<OsStr>)>,
    ) -> &mut Self {
        for (key, val) in vars {
            self.add_env_var(key, val);
        }
        self
    }

    pub fn with_env_vars(
        mut self,
        vars: impl IntoIterator<Item = (impl AsRef<OsStr>, impl AsRef<OsStr>)>,
    ) -> Self {
        self.add_env_vars(vars);
        self
    }

    pub fn add_arg(&mut self, name: impl AsRef<OsStr>) -> &mut Self {
        let name = name.as_ref();
        log::debug!("adding arg {:?} to command {:?}", name, self.display);
        self.args.push(name.to_owned());
        self.push_display(name);
        self
    }

    pub fn with_arg(mut self, name: impl AsRef<OsStr>) -> Self {
        self.add_arg(name);
        self
    }

    pub fn add_args(&mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        for arg in args {
            self.add_arg(arg);
        }
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Self {
        self.add_args(args);
        self
    }

    fn error(&self, cause: Cause) -> Error {
        Error::new(self.display.clone(), cause)
    }

    fn expression(&self) -> duct::Expression {
        let expression = duct::cmd(&self.program, &self.args)
            .stdin_null()
            .stderr_capture()
            .unchecked();
        if self.pure {
            expression.full_env(self.env.iter().cloned())
        } else {
            expression.vars(self.env.iter().cloned())
        }
    }

    fn spill_file(&self) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("simbatch-stdout-").suffix(".out");
        match &self.spill_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|err| self.error(Cause::TempFileFailed(err)))
    }

    /// Run the command to completion, collecting both streams. This blocks the
    /// calling thread; see [`crate::runner::dispatch`] for the non-blocking form.
    pub fn capture(&self) -> Result<Output> {
        log::trace!("running command {:?} and capturing output", self.display);
        let spill = if self.expect_large_output {
            Some(self.spill_file()?)
        } else {
            None
        };
        let expression = match &spill {
            Some(file) => {
                log::debug!(
                    "spilling stdout of command {:?} to {:?}",
                    self.display,
                    file.path()
                );
                self.expression().stdout_path(file.path())
            }
            None => self.expression().stdout_capture(),
        };

        let handle = expression
            .start()
            .map_err(|err| self.error(Cause::SpawnFailed(err)))?;
        let output = handle
            .into_output()
            .map_err(|err| self.error(Cause::WaitFailed(err)))?;
        let (status, mut stdout, stderr) = (output.status, output.stdout, output.stderr);

        if let Some(file) = spill {
            stdout = fs::read(file.path()).map_err(|source| {
                self.error(Cause::CaptureFailed {
                    stream: OutputStream::Out,
                    source,
                })
            })?;
            log::debug!(
                "read {} bytes of spilled stdout for command {:?}",
                stdout.len(),
                self.display
            );
            // Dropping the handle deletes the file.
            drop(file);
        }

        log::debug!(
            "command {:?} exited with {} ({} bytes stdout, {} bytes stderr)",
            self.display,
            status,
            stdout.len(),
            stderr.len()
        );
        Ok(Output::new(self.display.clone(), status, stdout, stderr))
    }

    /// Run the command and decide between its output and its complaints.
    pub fn execute(&self) -> Result<Vec<u8>> {
        self.capture()?.into_result()
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;

    fn sh(script: &str) -> Command {
        Command::impure("/bin/sh").with_args(["-c", script])
    }

    #[test]
    fn display_lists_every_arg() {
        let command = Command::pure("/usr/bin/xcrun").with_args(["simctl", "list", "-j"]);
        assert_eq!(command.display(), "/usr/bin/xcrun simctl list -j");
    }

    #[test]
    fn captures_both_streams() {
        let output = sh("printf out; printf err >&2").capture().unwrap();
        assert_eq!(output.stdout(), b"out");
        assert_eq!(output.stderr(), b"err");
        assert!(output.status().success());
    }

    #[test]
    fn stdout_wins_when_both_streams_are_written() {
        let out = sh("echo '{}'; echo 'warning: something' >&2; exit 1")
            .execute()
            .unwrap();
        assert_eq!(out, b"{}\n");
    }

    #[test]
    fn stderr_alone_fails() {
        let err = sh("echo 'Invalid device: nope' >&2; exit 1")
            .execute()
            .unwrap_err();
        assert_eq!(err.message(), Some("Invalid device: nope"));
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn no_output_fails_generically() {
        let err = sh("exit 0").execute().unwrap_err();
        assert!(matches!(err.cause(), Cause::NoOutput { exit_code: Some(0) }));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = Command::impure("/definitely/not/a/real/tool")
            .execute()
            .unwrap_err();
        assert!(matches!(err.cause(), Cause::SpawnFailed(_)));
        assert!(err.to_string().contains("/definitely/not/a/real/tool"));
    }

    #[test]
    fn large_output_through_pipes_does_not_deadlock() {
        // Well past any pipe buffer, on both streams at once.
        let out = sh("head -c 1048576 /dev/zero; head -c 262144 /dev/zero >&2")
            .execute()
            .unwrap();
        assert_eq!(out.len(), 1_048_576);
    }

    #[test]
    fn large_output_through_a_temporary_file() {
        let output = sh("head -c 2097152 /dev/zero; echo done >&2")
            .with_expect_large_output(true)
            .capture()
            .unwrap();
        assert_eq!(output.stdout().len(), 2_097_152);
        assert_eq!(output.stderr(), b"done\n");
    }

    #[test]
    fn concurrent_spills_use_separate_files_and_clean_up() {
        let spill_dir = tempfile::tempdir().unwrap();
        let handles = (0..4usize)
            .map(|i| {
                let len = 300_000 + i;
                let command = sh(&format!("head -c {} /dev/zero", len))
                    .with_expect_large_output(true)
                    .with_spill_dir(spill_dir.path());
                std::thread::spawn(move || (len, command.execute()))
            })
            .collect::<Vec<_>>();
        for handle in handles {
            let (len, result) = handle.join().unwrap();
            assert_eq!(result.unwrap().len(), len);
        }
        let leftovers = fs::read_dir(spill_dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn spill_file_is_gone_after_a_failed_run() {
        let spill_dir = tempfile::tempdir().unwrap();
        let err = sh("echo 'no devices' >&2; exit 3")
            .with_expect_large_output(true)
            .with_spill_dir(spill_dir.path())
            .execute()
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(fs::read_dir(spill_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn output_keeps_arrival_order() {
        let out = sh("for i in 1 2 3 4 5; do echo $i; done").execute().unwrap();
        assert_eq!(out, b"1\n2\n3\n4\n5\n");
    }
}
