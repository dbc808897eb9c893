use crate::{
    command::{self, Cause, Command},
    env::{Env, ExplicitEnv as _},
};
use std::{
    ffi::OsString,
    fmt::{self, Display},
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
    thread,
};

/// One call to an external tool, described as a value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    expect_large_output: bool,
}

impl Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            expect_large_output: false,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_expect_large_output(mut self, expect_large_output: bool) -> Self {
        self.expect_large_output = expect_large_output;
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn expects_large_output(&self) -> bool {
        self.expect_large_output
    }

    pub fn command(&self, env: &Env) -> Command {
        Command::pure(&self.program)
            .with_env_vars(env.explicit_env())
            .with_args(&self.args)
            .with_expect_large_output(self.expect_large_output)
    }
}

pub trait Runner: Send + Sync + 'static {
    fn execute(&self, invocation: &Invocation) -> command::Result<Vec<u8>>;
}

/// Runs invocations as real child processes.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    env: Env,
}

impl ProcessRunner {
    pub fn new(env: Env) -> Self {
        Self { env }
    }
}

impl Runner for ProcessRunner {
    fn execute(&self, invocation: &Invocation) -> command::Result<Vec<u8>> {
        invocation.command(&self.env).execute()
    }
}

/// Runs `invocation` on a worker thread and hands the result to `then`, which
/// is called exactly once, on that worker thread.
pub fn dispatch<R, F>(runner: Arc<R>, invocation: Invocation, then: F) -> thread::JoinHandle<()>
where
    R: Runner + ?Sized,
    F: FnOnce(command::Result<Vec<u8>>) + Send + 'static,
{
    thread::spawn(move || {
        log::debug!("dispatching {:?} to a worker", invocation.to_string());
        let result = panic::catch_unwind(AssertUnwindSafe(|| runner.execute(&invocation)))
            .unwrap_or_else(|_| {
                log::error!("worker running {:?} panicked", invocation.to_string());
                Err(command::Error::new(
                    invocation.to_string(),
                    Cause::WorkerPanicked,
                ))
            });
        then(result)
    })
}


#[cfg(test)]
mod test {
    use super::{fake::ScriptedRunner, *};
    use std::sync::mpsc;

    #[test]
    fn invocation_displays_like_a_shell_line() {
        let invocation = Invocation::new("/usr/bin/xcrun").with_args(["simctl", "list", "-j"]);
        assert_eq!(invocation.to_string(), "/usr/bin/xcrun simctl list -j");
    }

    #[test]
    fn dispatch_resolves_exactly_once() {
        let runner = Arc::new(ScriptedRunner::new().then_reply(|_| Ok(b"ok".to_vec())));
        let (tx, rx) = mpsc::channel();
        dispatch(runner, Invocation::new("tool"), move |result| {
            tx.send(result).unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(rx.recv().unwrap().unwrap(), b"ok");
        assert!(rx.recv().is_err());
    }

    #[test]
    fn dispatch_turns_a_panicking_runner_into_an_error() {
        let runner = Arc::new(ScriptedRunner::new().then_reply(|_| panic!("boom")));
        let (tx, rx) = mpsc::channel();
        dispatch(runner, Invocation::new("tool"), move |result| {
            tx.send(result).unwrap();
        })
        .join()
        .unwrap();
        let err = rx.recv().unwrap().unwrap_err();
        assert!(matches!(err.cause(), Cause::WorkerPanicked));
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_passes_only_explicit_env() {
        let runner = ProcessRunner::new(Env::with_home("/tmp/simbatch-home", "/usr/bin:/bin"));
        let out = runner
            .execute(&Invocation::new("/bin/sh").with_args(["-c", "printf \"$HOME\""]))
            .unwrap();
        assert_eq!(out, b"/tmp/simbatch-home");
    }
}
