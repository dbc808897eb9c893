use super::{Device, Runtime, Simctl};
use crate::{
    apple::ParseError,
    command,
    runner::Runner,
    util::cli::{Report, Reportable},
};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Failed to request device list from `simctl`: {0}")]
    DetectionFailed(#[from] command::Error),
    #[error("Failed to read the device list from `simctl`: {0}")]
    InvalidDeviceList(#[from] ParseError),
}

impl Reportable for ListError {
    fn report(&self) -> Report {
        Report::error("Failed to list iOS simulators", self)
    }
}

/// The part of `simctl list -j` we care about. Device types and pairs are
/// ignored; devices stay grouped by runtime identifier, in the order `simctl`
/// printed them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimulatorList {
    pub runtimes: Vec<Runtime>,
    pub devices: IndexMap<String, Vec<Device>>,
}

impl SimulatorList {
    pub fn device_count(&self) -> usize {
        self.devices.values().map(Vec::len).sum()
    }
}

/// No partial results: anything structurally off discards the whole payload.
pub fn decode(bytes: &[u8]) -> Result<SimulatorList, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let list = serde_json::from_slice::<SimulatorList>(bytes)?;
    log::info!(
        "decoded {} runtimes and {} devices",
        list.runtimes.len(),
        list.device_count()
    );
    Ok(list)
}

pub(crate) fn interpret(result: command::Result<Vec<u8>>) -> Result<SimulatorList, ListError> {
    let bytes = result?;
    decode(&bytes).map_err(ListError::from)
}

pub fn device_list<R: Runner + ?Sized>(
    runner: &R,
    simctl: &Simctl,
) -> Result<SimulatorList, ListError> {
    interpret(runner.execute(&simctl.list()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::apple::simctl::DeviceState;

    const SINGLE: &str = r#"{
        "runtimes": [{
            "name": "iOS 17.0",
            "version": "17.0",
            "isAvailable": true,
            "identifier": "com.apple.CoreSimulator.SimRuntime.iOS-17-0"
        }],
        "devices": {
            "com.apple.CoreSimulator.SimRuntime.iOS-17-0": [{
                "name": "iPhone 15",
                "udid": "6F7E2A0C-1D2B-4C3A-9E8F-0A1B2C3D4E5F",
                "state": "Booted",
                "isAvailable": true
            }]
        }
    }"#;

    #[test]
    fn decodes_runtimes_and_grouped_devices() {
        let list = decode(SINGLE.as_bytes()).unwrap();
        assert_eq!(list.runtimes.len(), 1);
        assert_eq!(list.runtimes[0].name(), "iOS 17.0");
        let devices = &list.devices["com.apple.CoreSimulator.SimRuntime.iOS-17-0"];
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name(), "iPhone 15");
        assert_eq!(devices[0].state(), &DeviceState::Booted);
        assert_eq!(devices[0].availability_error(), None);
    }

    #[test]
    fn ignores_fields_we_dont_model() {
        let json = r#"{
            "devicetypes": [{"name": "iPhone 15"}],
            "pairs": {},
            "runtimes": [],
            "devices": {
                "com.apple.CoreSimulator.SimRuntime.iOS-12-4": [{
                    "name": "iPhone X",
                    "udid": "00000000-0000-0000-0000-000000000001",
                    "state": "Shutdown",
                    "isAvailable": false,
                    "availabilityError": "runtime profile not found",
                    "dataPath": "/tmp/nowhere",
                    "deviceTypeIdentifier": "com.apple.CoreSimulator.SimDeviceType.iPhone-X"
                }]
            }
        }"#;
        let list = decode(json.as_bytes()).unwrap();
        let device = &list.devices["com.apple.CoreSimulator.SimRuntime.iOS-12-4"][0];
        assert!(!device.is_available());
        assert_eq!(
            device.availability_error(),
            Some("runtime profile not found")
        );
    }

    #[test]
    fn keeps_runtime_key_order() {
        let json = r#"{"runtimes": [], "devices": {"z": [], "a": [], "m": []}}"#;
        let list = decode(json.as_bytes()).unwrap();
        assert_eq!(list.devices.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
    }

    #[test]
    fn empty_input() {
        assert!(matches!(decode(b""), Err(ParseError::EmptyInput)));
    }

    #[test]
    fn structural_failure_discards_everything() {
        let json = r#"{"runtimes": [], "devices": {"ok": [{"name": "no udid"}]}}"#;
        assert!(matches!(
            decode(json.as_bytes()),
            Err(ParseError::DecodeFailed(_))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            decode(b"{\"runtimes\": ["),
            Err(ParseError::DecodeFailed(_))
        ));
    }

    #[test]
    fn command_failure_is_a_detection_failure() {
        let err = interpret(Err(command::Error::new(
            "xcrun simctl list -j",
            command::Cause::NoOutput { exit_code: Some(1) },
        )))
        .unwrap_err();
        assert!(matches!(err, ListError::DetectionFailed(_)));
    }
}
