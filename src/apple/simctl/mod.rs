mod delete;
mod device_list;

pub use delete::{delete, DeleteError};
pub(crate) use delete::interpret as interpret_delete;
pub use device_list::{decode, device_list, ListError, SimulatorList};
pub(crate) use device_list::interpret as interpret_list;

use crate::runner::Invocation;
use serde::Deserialize;
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use uuid::Uuid;

pub static DEFAULT_XCRUN: &str = "/usr/bin/xcrun";

/// `simctl` prints UDIDs in uppercase, so we do too.
pub fn format_udid(udid: &Uuid) -> String {
    udid.to_string().to_uppercase()
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "String")]
pub enum DeviceState {
    Shutdown,
    Booted,
    Creating,
    /// `simctl` has a few transient states ("Booting", "Shutting Down") that
    /// aren't worth failing a whole listing over.
    Other(String),
}

impl From<String> for DeviceState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Shutdown" => Self::Shutdown,
            "Booted" => Self::Booted,
            "Creating" => Self::Creating,
            _ => Self::Other(raw),
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl DeviceState {
    pub fn label(&self) -> &str {
        match self {
            Self::Shutdown => "Shutdown",
            Self::Booted => "Booted",
            Self::Creating => "Creating",
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    name: String,
    udid: Uuid,
    state: DeviceState,
    is_available: bool,
    #[serde(default)]
    availability_error: Option<String>,
}

impl Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, format_udid(&self.udid))
    }
}

impl Device {
    pub fn new(name: impl Into<String>, udid: Uuid, state: DeviceState, is_available: bool) -> Self {
        Self {
            name: name.into(),
            udid,
            state,
            is_available,
            availability_error: None,
        }
    }

    pub fn with_availability_error(mut self, error: impl Into<String>) -> Self {
        self.availability_error = Some(error.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn udid(&self) -> Uuid {
        self.udid
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn availability_error(&self) -> Option<&str> {
        self.availability_error.as_deref()
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    name: String,
    version: String,
    is_available: bool,
    identifier: String,
}

impl Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Runtime {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        is_available: bool,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            is_available,
            identifier: identifier.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// `com.apple.CoreSimulator.SimRuntime.iOS-17-0` -> `iOS-17-0`
    pub fn short_identifier(identifier: &str) -> &str {
        identifier.rsplit('.').next().unwrap_or(identifier)
    }
}

/// Builds the `xcrun simctl` invocations we need.
#[derive(Clone, Debug)]
pub struct Simctl {
    xcrun: PathBuf,
}

impl Default for Simctl {
    fn default() -> Self {
        Self::new(DEFAULT_XCRUN)
    }
}

impl Simctl {
    pub fn new(xcrun: impl Into<PathBuf>) -> Self {
        Self {
            xcrun: xcrun.into(),
        }
    }

    pub fn xcrun(&self) -> &Path {
        &self.xcrun
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.xcrun).with_arg("simctl")
    }

    /// The full listing is easily a few hundred KiB of JSON.
    pub fn list(&self) -> Invocation {
        self.invocation()
            .with_args(["list", "-j"])
            .with_expect_large_output(true)
    }

    pub fn delete(&self, udid: Uuid) -> Invocation {
        self.invocation()
            .with_arg("delete")
            .with_arg(format_udid(&udid))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(
        raw,
        state,
        case("Shutdown", DeviceState::Shutdown),
        case("Booted", DeviceState::Booted),
        case("Creating", DeviceState::Creating),
        case("Shutting Down", DeviceState::Other("Shutting Down".into()))
    )]
    fn device_state_from_simctl_text(raw: &str, state: DeviceState) {
        let parsed = DeviceState::from(raw.to_owned());
        assert_eq!(parsed, state);
        assert_eq!(parsed.label(), raw);
    }

    #[rstest(
        identifier,
        short,
        case("com.apple.CoreSimulator.SimRuntime.iOS-17-0", "iOS-17-0"),
        case("watchOS-10-0", "watchOS-10-0"),
        case("trailing.", "")
    )]
    fn short_identifier_is_the_last_dot_segment(identifier: &str, short: &str) {
        assert_eq!(Runtime::short_identifier(identifier), short);
    }

    #[test]
    fn list_expects_large_output() {
        let list = Simctl::default().list();
        assert_eq!(list.to_string(), "/usr/bin/xcrun simctl list -j");
        assert!(list.expects_large_output());
    }

    #[test]
    fn delete_passes_uppercase_udid() {
        let udid = Uuid::parse_str("0b5c6a1e-93a4-4d8c-9c1f-2a3b4c5d6e7f").unwrap();
        let delete = Simctl::new("/opt/xcrun").delete(udid);
        assert_eq!(
            delete.to_string(),
            "/opt/xcrun simctl delete 0B5C6A1E-93A4-4D8C-9C1F-2A3B4C5D6E7F"
        );
        assert!(!delete.expects_large_output());
    }
}
