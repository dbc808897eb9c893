use super::simctl::format_udid;
use crate::{
    env::Env,
    util::cli::{Report, Reportable},
};
use serde::Deserialize;
use std::{
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use uuid::Uuid;

static APP_CONTAINERS: &str = "data/Containers/Bundle/Application";
static INFO_PLIST: &str = "Info.plist";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read app containers in {path:?}: {source}")]
    ContainersUnreadable { path: PathBuf, source: io::Error },
}

impl Reportable for Error {
    fn report(&self) -> Report {
        Report::error("Failed to list installed apps", self)
    }
}

/// The bits of a bundle's `Info.plist` worth showing. Every key is optional;
/// whatever's missing falls back to what the filesystem says.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct InfoPlist {
    #[serde(rename = "CFBundleName")]
    pub name: Option<String>,
    #[serde(rename = "CFBundleShortVersionString")]
    pub version: Option<String>,
    #[serde(rename = "CFBundleVersion")]
    pub build_number: Option<String>,
    #[serde(rename = "MinimumOSVersion")]
    pub min_system_version: Option<String>,
}

impl InfoPlist {
    pub fn load(app: &Path) -> Result<Self, plist::Error> {
        plist::from_file(app.join(INFO_PLIST))
    }
}

/// An app installed on a simulator, as found on disk.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct AppBundle {
    pub title: String,
    pub bundle_name: String,
    pub version: Option<String>,
    pub build_number: Option<String>,
    pub container_id: String,
    pub path: PathBuf,
}

impl Display for AppBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(version) = &self.version {
            write!(f, " {}", version)?;
        }
        if let Some(build_number) = &self.build_number {
            write!(f, " ({})", build_number)?;
        }
        Ok(())
    }
}

impl AppBundle {
    fn new(container: &Path, path: PathBuf) -> Self {
        let bundle_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = InfoPlist::load(&path).unwrap_or_else(|err| {
            log::warn!(
                "couldn't read `{}` in {:?}; falling back to the bundle name: {}",
                INFO_PLIST,
                path,
                err
            );
            Default::default()
        });
        Self {
            title: info.name.unwrap_or_else(|| bundle_name.clone()),
            bundle_name,
            version: info.version,
            build_number: info.build_number,
            container_id: container
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
        }
    }
}

pub fn containers_dir(env: &Env, udid: &Uuid) -> PathBuf {
    env.simulator_devices_dir()
        .join(format_udid(udid))
        .join(APP_CONTAINERS)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}

fn visible_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.retain(|path| !is_hidden(path));
    entries.sort();
    Ok(entries)
}

fn find_app(container: &Path) -> Option<AppBundle> {
    let entries = match visible_entries(container) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("skipping unreadable app container {:?}: {}", container, err);
            return None;
        }
    };
    let app = entries
        .into_iter()
        .find(|path| path.extension().map_or(false, |ext| ext == "app"));
    match app {
        Some(path) => Some(AppBundle::new(container, path)),
        None => {
            log::warn!("app container {:?} has no `.app` bundle", container);
            None
        }
    }
}

/// Lists apps installed on the simulator with `udid`. A simulator that never
/// had anything installed has no containers directory at all.
pub fn installed_apps(env: &Env, udid: &Uuid) -> Result<Vec<AppBundle>, Error> {
    let dir = containers_dir(env, udid);
    if !dir.is_dir() {
        log::info!("no app containers at {:?}; nothing installed", dir);
        return Ok(Vec::new());
    }
    let containers = visible_entries(&dir).map_err(|source| Error::ContainersUnreadable {
        path: dir.clone(),
        source,
    })?;
    let mut apps = containers
        .iter()
        .filter(|path| path.is_dir())
        .filter_map(|container| find_app(container))
        .collect::<Vec<_>>();
    apps.sort();
    Ok(apps)
}

#[cfg(test)]
mod test {
    use super::*;

    fn udid() -> Uuid {
        Uuid::parse_str("6f7e2a0c-1d2b-4c3a-9e8f-0a1b2c3d4e5f").unwrap()
    }

    fn container(root: &Path, id: &str, entries: &[&str]) {
        let container = root.join(id);
        fs::create_dir_all(&container).unwrap();
        for entry in entries {
            fs::create_dir_all(container.join(entry)).unwrap();
        }
    }

    #[test]
    fn no_containers_means_no_apps() {
        let home = tempfile::tempdir().unwrap();
        let env = Env::with_home(home.path(), "/usr/bin");
        assert!(installed_apps(&env, &udid()).unwrap().is_empty());
    }

    #[test]
    fn finds_one_app_per_container() {
        let home = tempfile::tempdir().unwrap();
        let env = Env::with_home(home.path(), "/usr/bin");
        let root = containers_dir(&env, &udid());
        container(&root, "B-CONTAINER", &["Zebra.app", "SC_Info"]);
        container(&root, "A-CONTAINER", &["Aardvark.app"]);
        container(&root, "EMPTY", &["leftovers"]);
        container(&root, ".hidden", &["Ghost.app"]);

        let apps = installed_apps(&env, &udid()).unwrap();
        let names = apps.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(names, ["Aardvark", "Zebra"]);
        assert_eq!(apps[1].container_id, "B-CONTAINER");
        assert!(apps[1].path.ends_with("B-CONTAINER/Zebra.app"));
    }

    #[test]
    fn title_and_version_come_from_info_plist() {
        let home = tempfile::tempdir().unwrap();
        let env = Env::with_home(home.path(), "/usr/bin");
        let root = containers_dir(&env, &udid());
        container(&root, "C-CONTAINER", &["Runner.app"]);
        fs::write(
            root.join("C-CONTAINER/Runner.app").join(INFO_PLIST),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleName</key>
	<string>Weather Buddy</string>
	<key>CFBundleShortVersionString</key>
	<string>2.4</string>
	<key>CFBundleVersion</key>
	<string>117</string>
	<key>MinimumOSVersion</key>
	<string>15.0</string>
	<key>UIDeviceFamily</key>
	<array>
		<integer>1</integer>
	</array>
</dict>
</plist>
"#,
        )
        .unwrap();

        let apps = installed_apps(&env, &udid()).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].title, "Weather Buddy");
        assert_eq!(apps[0].bundle_name, "Runner");
        assert_eq!(apps[0].to_string(), "Weather Buddy 2.4 (117)");
    }

    #[test]
    fn broken_info_plist_falls_back_to_the_bundle_name() {
        let home = tempfile::tempdir().unwrap();
        let env = Env::with_home(home.path(), "/usr/bin");
        let root = containers_dir(&env, &udid());
        container(&root, "D-CONTAINER", &["Broken.app"]);
        fs::write(
            root.join("D-CONTAINER/Broken.app").join(INFO_PLIST),
            r#"<plist version="1.0"><dict><key>CFBundleName"#,
        )
        .unwrap();

        let apps = installed_apps(&env, &udid()).unwrap();
        assert_eq!(apps[0].title, "Broken");
        assert_eq!(apps[0].version, None);
        assert_eq!(apps[0].to_string(), "Broken");
    }
}
