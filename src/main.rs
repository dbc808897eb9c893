#![forbid(unsafe_code)]

use simbatch::{
    apple::{
        apps,
        simctl::{format_udid, ListError},
        toolchain,
    },
    catalog::DisplayRow,
    config::{Config, LoadError},
    env::{Env, Error as EnvError},
    model::{BatchReport, DeviceListModel, Event},
    runner::ProcessRunner,
    util::{
        cli::{self, Exec, GlobalFlags, Report, Reportable, TextWrapper},
        prompt,
    },
    NAME,
};
use colored::Colorize as _;
use std::{collections::HashSet, io, sync::Arc};
use structopt::StructOpt;
use uuid::Uuid;

#[derive(Debug, StructOpt)]
#[structopt(
    bin_name = NAME,
    about = "List, inspect, and batch-delete iOS simulators",
    settings = cli::SETTINGS
)]
struct Input {
    #[structopt(flatten)]
    flags: GlobalFlags,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, StructOpt)]
enum Command {
    #[structopt(
        name = "list",
        alias = "listsims",
        about = "Lists simulators, ordered by runtime"
    )]
    List,
    #[structopt(name = "delete", alias = "deletesim", about = "Deletes one simulator")]
    Delete {
        #[structopt(name = "UDID", help = "UDID of the simulator to delete")]
        udid: Uuid,
    },
    #[structopt(
        name = "delete-selected",
        alias = "deleteselected",
        about = "Deletes several simulators as one batch"
    )]
    DeleteSelected {
        #[structopt(name = "UDIDS", required = true, help = "UDIDs of the simulators to delete")]
        udids: Vec<Uuid>,
        #[structopt(short = "y", long = "yes", help = "Skip the confirmation prompt")]
        yes: bool,
    },
    #[structopt(name = "toolchain", about = "Prints the active Xcode version")]
    Toolchain,
    #[structopt(name = "apps", about = "Lists apps installed on a simulator")]
    Apps {
        #[structopt(name = "UDID", help = "UDID of the simulator to inspect")]
        udid: Uuid,
    },
}

#[derive(Debug)]
enum Error {
    EnvInitFailed(EnvError),
    ConfigFailed(LoadError),
    ListFailed(ListError),
    NoneListed,
    DeleteFailed(BatchReport),
    ToolchainFailed(toolchain::Error),
    AppsFailed(apps::Error),
    PromptFailed(io::Error),
}

impl Reportable for Error {
    fn report(&self) -> Report {
        match self {
            Self::EnvInitFailed(err) => err.report(),
            Self::ConfigFailed(err) => err.report(),
            Self::ListFailed(err) => err.report(),
            Self::NoneListed => Report::action_request(
                "None of the given simulators are listed",
                "Run `simbatch list` to see the UDIDs `simctl` knows about.",
            ),
            Self::DeleteFailed(report) => report.report(),
            Self::ToolchainFailed(err) => err.report(),
            Self::AppsFailed(err) => err.report(),
            Self::PromptFailed(err) => Report::error("Failed to prompt for confirmation", err),
        }
    }
}

type Model = DeviceListModel<ProcessRunner>;

fn refresh(model: &mut Model) -> Result<(), Error> {
    model.refresh();
    for event in model.settle() {
        if let Event::Refreshed(Err(err)) = event {
            return Err(Error::ListFailed(err));
        }
    }
    Ok(())
}

/// Waits out a batch deletion, narrating as devices go.
fn finish_batch(model: &mut Model, wrapper: &TextWrapper) -> Result<(), Error> {
    let mut finished = None;
    for event in model.settle() {
        match event {
            Event::Deleted { udid, succeeded } => {
                let status = if succeeded {
                    "deleted".color(cli::colors::VICTORY)
                } else {
                    "failed".color(cli::colors::ERROR)
                };
                println!("  {} {}", format_udid(&udid), status);
            }
            Event::BatchFinished(report) => finished = Some(report),
            Event::Refreshed(Err(err)) => {
                log::warn!("couldn't refresh the listing after deleting: {}", err)
            }
            _ => (),
        }
    }
    let report = finished.unwrap_or_default();
    if report.is_success() {
        report.report().print(wrapper);
        Ok(())
    } else {
        Err(Error::DeleteFailed(report))
    }
}

fn column_widths(rows: &[DisplayRow]) -> [usize; 5] {
    rows.iter().fold(
        [36, "Name".len(), "Runtime".len(), "Available".len(), "State".len()],
        |[udid, name, version, available, state], row| {
            [
                udid,
                name.max(row.name.chars().count()),
                version.max(row.version.chars().count()),
                available.max(row.available.len()),
                state.max(row.state.len()),
            ]
        },
    )
}

fn print_rows(rows: &[DisplayRow], selected: &HashSet<Uuid>) {
    if rows.is_empty() {
        println!("  -- none --");
        return;
    }
    let [udid_w, name_w, version_w, available_w, state_w] = column_widths(rows);
    println!(
        "{}",
        format!(
            "    {:udid_w$}  {:name_w$}  {:version_w$}  {:available_w$}  {:state_w$}  Comment",
            "UDID",
            "Name",
            "Runtime",
            "Available",
            "State",
            udid_w = udid_w,
            name_w = name_w,
            version_w = version_w,
            available_w = available_w,
            state_w = state_w,
        )
        .bold()
    );
    for row in rows {
        let mark = if selected.contains(&row.id) { "[x]" } else { "[ ]" };
        let line = format!(
            "{} {:udid_w$}  {:name_w$}  {:version_w$}  {:available_w$}  {:state_w$}  {}",
            mark,
            format_udid(&row.id),
            row.name,
            row.version,
            row.available,
            row.state,
            row.comment,
            udid_w = udid_w,
            name_w = name_w,
            version_w = version_w,
            available_w = available_w,
            state_w = state_w,
        );
        if row.is_unavailable() {
            println!("{}", line.color(cli::colors::WARNING));
        } else {
            println!("{}", line);
        }
    }
}

impl Exec for Input {
    type Report = Error;

    fn global_flags(&self) -> GlobalFlags {
        self.flags
    }

    fn exec(self, wrapper: &TextWrapper) -> Result<(), Self::Report> {
        let Self {
            flags: GlobalFlags { interactivity, .. },
            command,
        } = self;
        let env = Env::new().map_err(Error::EnvInitFailed)?;
        let config = Config::load(&env).map_err(Error::ConfigFailed)?;
        let mut model = DeviceListModel::new(
            Arc::new(ProcessRunner::new(env.clone())),
            config.simctl().clone(),
            config.xcodebuild().clone(),
        );
        match command {
            Command::List => {
                refresh(&mut model)?;
                print_rows(model.rows(), model.selected_ids());
                Ok(())
            }
            Command::Delete { udid } => {
                println!("Deleting simulator {}...", format_udid(&udid));
                model.delete_one(udid);
                finish_batch(&mut model, wrapper)
            }
            Command::DeleteSelected { udids, yes } => {
                refresh(&mut model)?;
                for udid in udids {
                    model.select(udid);
                }
                let doomed = model
                    .rows()
                    .iter()
                    .filter(|row| model.is_selected(&row.id))
                    .cloned()
                    .collect::<Vec<_>>();
                print_rows(&doomed, model.selected_ids());
                if doomed.is_empty() {
                    return Err(Error::NoneListed);
                }
                if interactivity.should_confirm(yes) {
                    let confirmed = prompt::yes_no(
                        format!("Delete {} simulator(s)?", doomed.len()),
                        Some(false),
                    )
                    .map_err(Error::PromptFailed)?;
                    if confirmed != Some(true) {
                        println!("Nothing was deleted.");
                        return Ok(());
                    }
                }
                model.delete_selected();
                finish_batch(&mut model, wrapper)
            }
            Command::Toolchain => {
                model.fetch_toolchain_version();
                for event in model.settle() {
                    if let Event::Toolchain(result) = event {
                        let version = result.map_err(Error::ToolchainFailed)?;
                        println!("{}", version);
                    }
                }
                Ok(())
            }
            Command::Apps { udid } => {
                let apps = apps::installed_apps(&env, &udid).map_err(Error::AppsFailed)?;
                println!("Apps installed on {}:", format_udid(&udid));
                prompt::list_display_only(apps.iter(), apps.len());
                Ok(())
            }
        }
    }
}

fn main() {
    cli::exec::<Input>()
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(name: &str, version: &str) -> DisplayRow {
        DisplayRow {
            id: Uuid::from_u128(1),
            name: name.to_owned(),
            version: version.to_owned(),
            available: "Yes".to_owned(),
            state: "Shutdown".to_owned(),
            comment: String::new(),
        }
    }

    #[test]
    fn widths_fit_the_longest_cell() {
        let rows = [row("iPhone 15 Pro Max", "iOS 17.0"), row("SE", "watchOS 10.0")];
        assert_eq!(column_widths(&rows), [36, 17, 12, 9, 8]);
    }

    #[test]
    fn parses_legacy_subcommand_names() {
        let input = Input::from_iter_safe(&[
            "simbatch",
            "deleteselected",
            "6F7E2A0C-1D2B-4C3A-9E8F-0A1B2C3D4E5F",
            "00000000-0000-0000-0000-000000000001",
            "--yes",
        ])
        .unwrap();
        match input.command {
            Command::DeleteSelected { udids, yes } => {
                assert_eq!(udids.len(), 2);
                assert!(yes);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn nothing_to_delete_exits_nonzero() {
        let report = Error::NoneListed.report();
        assert_eq!(report.label(), cli::Label::ActionRequest);
        assert_ne!(report.exit_code(), 0);
    }

    #[test]
    fn rejects_malformed_udids() {
        assert!(Input::from_iter_safe(&["simbatch", "delete", "not-a-udid"]).is_err());
    }
}
