use super::ParseError;
use crate::{
    command,
    runner::{Invocation, Runner},
    util::cli::{Report, Reportable},
};
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use thiserror::Error;

pub static DEFAULT_XCODEBUILD: &str = "/usr/bin/xcodebuild";

#[derive(Debug, Error)]
pub enum Error {
    #[error("`xcodebuild -version` call failed: {0}")]
    XcodebuildFailed(#[from] command::Error),
    #[error("`xcodebuild -version` output couldn't be read: {0}")]
    VersionInvalid(#[from] ParseError),
}

impl Reportable for Error {
    fn report(&self) -> Report {
        Report::error("Failed to detect Xcode version", self)
    }
}

/// What `xcodebuild -version` tells us.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolchainVersion {
    pub xcode_version: String,
    pub xcode_build_version: String,
}

impl Display for ToolchainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.xcode_version, self.xcode_build_version)
    }
}

/// Expects exactly two lines, like:
///
/// ```text
/// Xcode 15.0
/// Build version 15A240d
/// ```
pub fn decode(text: &str) -> Result<ToolchainVersion, ParseError> {
    if text.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let lines = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    match lines.as_slice() {
        [version, build] => Ok(ToolchainVersion {
            xcode_version: (*version).to_owned(),
            xcode_build_version: build.split_whitespace().last().unwrap_or_default().to_owned(),
        }),
        _ => Err(ParseError::UnexpectedFormat(text.to_owned())),
    }
}

pub fn decode_bytes(bytes: &[u8]) -> Result<ToolchainVersion, ParseError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => decode(text),
        Err(err) => {
            log::warn!("`xcodebuild -version` printed invalid UTF-8: {}", err);
            Err(ParseError::UnexpectedFormat(
                String::from_utf8_lossy(bytes).into_owned(),
            ))
        }
    }
}

#[derive(Clone, Debug)]
pub struct Xcodebuild {
    path: PathBuf,
}

impl Default for Xcodebuild {
    fn default() -> Self {
        Self::new(DEFAULT_XCODEBUILD)
    }
}

impl Xcodebuild {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Invocation {
        Invocation::new(&self.path).with_arg("-version")
    }
}

pub(crate) fn interpret(result: command::Result<Vec<u8>>) -> Result<ToolchainVersion, Error> {
    let bytes = result?;
    let version = decode_bytes(&bytes)?;
    log::info!("detected toolchain {}", version);
    Ok(version)
}

pub fn toolchain_version<R: Runner + ?Sized>(
    runner: &R,
    xcodebuild: &Xcodebuild,
) -> Result<ToolchainVersion, Error> {
    interpret(runner.execute(&xcodebuild.version()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::runner::fake::ScriptedRunner;
    use rstest::rstest;

    #[rstest(
        input,
        version,
        build,
        case("Xcode 15.0\nBuild version 15A240d", "Xcode 15.0", "15A240d"),
        case("Xcode 15.0\nBuild version 15A240d\n", "Xcode 15.0", "15A240d"),
        case("Xcode 11.3.1\nBuild version 11C505", "Xcode 11.3.1", "11C505"),
        case("Xcode 14.2\n\nBuild version 14C18\n", "Xcode 14.2", "14C18")
    )]
    fn decodes_two_lines(input: &str, version: &str, build: &str) {
        assert_eq!(
            decode(input).unwrap(),
            ToolchainVersion {
                xcode_version: version.to_owned(),
                xcode_build_version: build.to_owned(),
            }
        );
    }

    #[rstest(
        input,
        case("Xcode 15.0"),
        case("Xcode 15.0\nBuild version 15A240d\nExtra line"),
        case("\n\n"),
        case("xcode-select: error: tool 'xcodebuild' requires Xcode\n")
    )]
    fn other_line_counts_are_unexpected(input: &str) {
        match decode(input) {
            Err(ParseError::UnexpectedFormat(raw)) => assert_eq!(raw, input),
            other => panic!("expected `UnexpectedFormat`, got {:?}", other),
        }
    }

    #[test]
    fn empty_input() {
        assert!(matches!(decode(""), Err(ParseError::EmptyInput)));
    }

    #[test]
    fn invalid_utf8_is_unexpected() {
        assert!(matches!(
            decode_bytes(&[0xff, 0xfe, b'\n', 0xfd]),
            Err(ParseError::UnexpectedFormat(_))
        ));
    }

    #[test]
    fn label_includes_build() {
        let runner = ScriptedRunner::new()
            .then_reply(|_| Ok(b"Xcode 15.0\nBuild version 15A240d\n".to_vec()));
        let version = toolchain_version(&runner, &Xcodebuild::default()).unwrap();
        assert_eq!(version.to_string(), "Xcode 15.0 (15A240d)");
        assert_eq!(runner.seen()[0].to_string(), "/usr/bin/xcodebuild -version");
    }
}
