use crate::apple::simctl::{Device, Runtime, SimulatorList};
use std::cmp::Ordering;
use uuid::Uuid;

pub static UNAVAILABLE: &str = "Unavailable";

/// How a device points at its runtime once the grouping is flattened away.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuntimeRef {
    /// Index into [`DeviceCatalog::runtimes`].
    Known(usize),
    /// The device's runtime identifier matched nothing `simctl` listed.
    Orphan(String),
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub device: Device,
    pub runtime: RuntimeRef,
}

/// One refresh worth of simulators. Rebuilt wholesale each time.
#[derive(Clone, Debug, Default)]
pub struct DeviceCatalog {
    runtimes: Vec<Runtime>,
    entries: Vec<Entry>,
}

impl From<SimulatorList> for DeviceCatalog {
    fn from(list: SimulatorList) -> Self {
        let SimulatorList { runtimes, devices } = list;
        let mut entries = Vec::with_capacity(devices.values().map(Vec::len).sum());
        for (identifier, devices) in devices {
            // First match wins if `simctl` ever lists a runtime twice.
            let runtime = match runtimes
                .iter()
                .position(|runtime| runtime.identifier() == identifier)
            {
                Some(index) => RuntimeRef::Known(index),
                None => {
                    log::info!("no runtime matches identifier {:?}", identifier);
                    RuntimeRef::Orphan(identifier)
                }
            };
            entries.extend(devices.into_iter().map(|device| Entry {
                device,
                runtime: runtime.clone(),
            }));
        }
        Self { runtimes, entries }
    }
}

impl DeviceCatalog {
    pub fn runtimes(&self) -> &[Runtime] {
        &self.runtimes
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn runtime(&self, runtime: &RuntimeRef) -> Option<&Runtime> {
        match runtime {
            RuntimeRef::Known(index) => self.runtimes.get(*index),
            RuntimeRef::Orphan(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn device(&self, udid: &Uuid) -> Option<&Device> {
        self.entries
            .iter()
            .map(|entry| &entry.device)
            .find(|device| device.udid() == *udid)
    }

    pub fn contains(&self, udid: &Uuid) -> bool {
        self.device(udid).is_some()
    }

    pub fn rows(&self) -> Vec<DisplayRow> {
        let mut rows = self
            .entries
            .iter()
            .map(|entry| {
                DisplayRow::new(&entry.device, &entry.runtime, self.runtime(&entry.runtime))
            })
            .collect::<Vec<_>>();
        rows.sort_by(DisplayRow::display_order);
        rows
    }
}

/// A device joined with its runtime, ready to print.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayRow {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub available: String,
    pub state: String,
    pub comment: String,
}

impl DisplayRow {
    fn new(device: &Device, runtime_ref: &RuntimeRef, runtime: Option<&Runtime>) -> Self {
        let own_error = device.availability_error().unwrap_or_default();
        let (version, comment) = match (runtime, runtime_ref) {
            (Some(runtime), _) => (runtime.name().to_owned(), own_error.to_owned()),
            (None, RuntimeRef::Orphan(identifier)) => (
                UNAVAILABLE.to_owned(),
                format!("{}: {}", Runtime::short_identifier(identifier), own_error),
            ),
            (None, RuntimeRef::Known(index)) => {
                log::error!("runtime index {} is out of range", index);
                (UNAVAILABLE.to_owned(), own_error.to_owned())
            }
        };
        Self {
            id: device.udid(),
            name: device.name().to_owned(),
            version,
            available: if device.is_available() { "Yes" } else { "No" }.to_owned(),
            state: device.state().label().to_owned(),
            comment,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.version == UNAVAILABLE
    }

    /// Version label (case-insensitive), then name (case-insensitive), with
    /// "Unavailable" rows always last. Exact text and id break any remaining
    /// ties so the order is total.
    pub fn display_order(a: &Self, b: &Self) -> Ordering {
        a.is_unavailable()
            .cmp(&b.is_unavailable())
            .then_with(|| caseless_cmp(&a.version, &b.version))
            .then_with(|| caseless_cmp(&a.name, &b.name))
            .then_with(|| a.version.cmp(&b.version))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
