use crate::util::cli::{Report, Reportable};
use std::{
    ffi::OsStr,
    fmt::{self, Debug, Display},
    path::{Path, PathBuf},
};

pub trait ExplicitEnv: Debug {
    fn explicit_env(&self) -> Vec<(&str, &OsStr)>;
}

#[derive(Debug)]
pub enum Error {
    HomeNotSet(std::env::VarError),
    PathNotSet(std::env::VarError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HomeNotSet(err) => write!(
                f,
                "The `HOME` environment variable isn't set, so simulator data can't be located: {}",
                err
            ),
            Self::PathNotSet(err) => write!(
                f,
                "The `PATH` environment variable isn't set, so `xcrun` can't find its tools: {}",
                err
            ),
        }
    }
}

impl std::error::Error for Error {}

impl Reportable for Error {
    fn report(&self) -> Report {
        Report::error("Failed to initialize base environment", self)
    }
}

/// The handful of variables child processes get; everything else is dropped.
#[derive(Clone, Debug)]
pub struct Env {
    home: PathBuf,
    path: String,
    term: Option<String>,
    developer_dir: Option<String>,
}

impl Env {
    pub fn new() -> Result<Self, Error> {
        let home = std::env::var("HOME").map_err(Error::HomeNotSet)?;
        let path = std::env::var("PATH").map_err(Error::PathNotSet)?;
        let term = std::env::var("TERM").ok();
        // `xcode-select` can be overridden per-shell with this one.
        let developer_dir = std::env::var("DEVELOPER_DIR").ok();
        Ok(Self {
            home: home.into(),
            path,
            term,
            developer_dir,
        })
    }

    pub fn with_home(home: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            path: path.into(),
            term: None,
            developer_dir: None,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn simulator_devices_dir(&self) -> PathBuf {
        self.home.join("Library/Developer/CoreSimulator/Devices")
    }
}

impl ExplicitEnv for Env {
    fn explicit_env(&self) -> Vec<(&str, &OsStr)> {
        let mut env = vec![("HOME", self.home.as_os_str()), ("PATH", self.path.as_ref())];
        if let Some(term) = self.term.as_ref() {
            env.push(("TERM", term.as_ref()));
        }
        if let Some(developer_dir) = self.developer_dir.as_ref() {
            env.push(("DEVELOPER_DIR", developer_dir.as_ref()));
        }
        env
    }
}
