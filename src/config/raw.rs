use crate::util::cli::{Report, Reportable};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum LoadError {
    ReadFailed {
        path: PathBuf,
        cause: io::Error,
    },
    ParseFailed {
        path: PathBuf,
        cause: toml::de::Error,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { path, cause } => {
                write!(f, "Failed to read config file at {:?}: {}", path, cause)
            }
            Self::ParseFailed { path, cause } => {
                write!(f, "Failed to parse config file at {:?}: {}", path, cause)
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl Reportable for LoadError {
    fn report(&self) -> Report {
        Report::error("Failed to load config", self)
    }
}

/// The config file exactly as written; every key is optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Raw {
    pub xcrun: Option<PathBuf>,
    pub xcodebuild: Option<PathBuf>,
}

impl Raw {
    pub fn file_name() -> &'static str {
        "config.toml"
    }

    /// A missing file isn't an error; it just means nothing was customized.
    pub fn load(path: &Path) -> Result<Option<Self>, LoadError> {
        if !path.is_file() {
            log::info!("no config file at {:?}; using defaults", path);
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|cause| LoadError::ReadFailed {
            path: path.to_owned(),
            cause,
        })?;
        let raw = toml::from_slice::<Self>(&bytes).map_err(|cause| LoadError::ParseFailed {
            path: path.to_owned(),
            cause,
        })?;
        log::info!("loaded config file at {:?}: {:?}", path, raw);
        Ok(Some(raw))
    }
}
