mod raw;

pub use self::raw::{LoadError, Raw};

use crate::{
    apple::{
        simctl::{Simctl, DEFAULT_XCRUN},
        toolchain::{Xcodebuild, DEFAULT_XCODEBUILD},
    },
    env::Env,
};
use std::path::PathBuf;

pub static DIR_NAME: &str = ".simbatch";

/// Where to find the tools we shell out to.
#[derive(Clone, Debug)]
pub struct Config {
    simctl: Simctl,
    xcodebuild: Xcodebuild,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(Raw::default())
    }
}

impl Config {
    pub fn path(env: &Env) -> PathBuf {
        env.home().join(DIR_NAME).join(Raw::file_name())
    }

    pub fn from_raw(raw: Raw) -> Self {
        Self {
            simctl: Simctl::new(raw.xcrun.unwrap_or_else(|| DEFAULT_XCRUN.into())),
            xcodebuild: Xcodebuild::new(
                raw.xcodebuild
                    .unwrap_or_else(|| DEFAULT_XCODEBUILD.into()),
            ),
        }
    }

    pub fn load(env: &Env) -> Result<Self, LoadError> {
        Raw::load(&Self::path(env)).map(|raw| Self::from_raw(raw.unwrap_or_default()))
    }

    pub fn simctl(&self) -> &Simctl {
        &self.simctl
    }

    pub fn xcodebuild(&self) -> &Xcodebuild {
        &self.xcodebuild
    }
}
