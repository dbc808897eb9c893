//! The device list as the presentation layer sees it.
//!
//! Every subprocess runs on a worker thread. Workers never touch the model:
//! they send a [`Message`] back, and the thread that owns the model applies it
//! in [`DeviceListModel::next_event`]. That's the only place the catalog and
//! the selection change.

use crate::{
    apple::{
        simctl::{self, DeleteError, ListError, Simctl},
        toolchain::{self, ToolchainVersion, Xcodebuild},
    },
    catalog::{DeviceCatalog, DisplayRow},
    runner::{self, ProcessRunner, Runner},
    selection::Selection,
    util::{
        self,
        cli::{Report, Reportable},
    },
};
use std::{
    collections::HashSet,
    mem,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, PoisonError,
    },
};
use uuid::Uuid;

/// How one batch deletion went, item by item.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<DeleteError>,
    /// Selected ids that weren't in the latest listing, so were never sent.
    pub skipped: Vec<Uuid>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Reportable for BatchReport {
    fn report(&self) -> Report {
        if self.is_success() {
            let details = if self.skipped.is_empty() {
                "Nothing was skipped.".to_owned()
            } else {
                let skipped = self.skipped.iter().map(simctl::format_udid).collect::<Vec<_>>();
                format!("Skipped {}, which weren't listed.", util::list_display(&skipped))
            };
            Report::victory(
                format!("Deleted {} simulator(s)", self.deleted.len()),
                details,
            )
        } else {
            Report::error(
                format!(
                    "Failed to delete {} of {} simulator(s)",
                    self.failed.len(),
                    self.completed()
                ),
                self.failed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
    }
}

/// Counts outstanding deletions down to zero across worker threads. Whoever
/// records the last outcome gets the finished report.
#[derive(Debug)]
pub(crate) struct Countdown {
    remaining: AtomicUsize,
    report: Mutex<BatchReport>,
}

impl Countdown {
    pub(crate) fn new(outstanding: usize, skipped: Vec<Uuid>) -> Self {
        Self {
            remaining: AtomicUsize::new(outstanding),
            report: Mutex::new(BatchReport {
                skipped,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn complete(&self, udid: Uuid, result: Result<(), DeleteError>) -> Option<BatchReport> {
        let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(()) => report.deleted.push(udid),
            Err(err) => report.failed.push(err),
        }
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            Some(mem::take(&mut *report))
        } else {
            None
        }
    }
}

/// What workers send back to the owning thread.
#[derive(Debug)]
enum Message {
    Listed {
        generation: u64,
        listed: Result<DeviceCatalog, ListError>,
    },
    Deleted { udid: Uuid, succeeded: bool },
    BatchFinished(BatchReport),
    Toolchain(Result<ToolchainVersion, toolchain::Error>),
}

/// What [`DeviceListModel::next_event`] reports after applying a message.
#[derive(Debug)]
pub enum Event {
    /// The listing was replaced; carries the new device count.
    Refreshed(Result<usize, ListError>),
    /// A listing finished after a newer one was already applied, so it was
    /// thrown away.
    RefreshSuperseded,
    Deleted { udid: Uuid, succeeded: bool },
    /// Every deletion in a batch has completed. A refresh is already underway.
    BatchFinished(BatchReport),
    Toolchain(Result<ToolchainVersion, toolchain::Error>),
}

fn send(tx: &Sender<Message>, message: Message) {
    if let Err(err) = tx.send(message) {
        log::debug!("model went away before {:?} arrived", err.0);
    }
}

#[derive(Debug)]
pub struct DeviceListModel<R: Runner + ?Sized = ProcessRunner> {
    runner: Arc<R>,
    simctl: Simctl,
    xcodebuild: Xcodebuild,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    in_flight: usize,
    /// Bumped by every `refresh()`; listings carry the value they started with.
    refresh_generation: u64,
    applied_generation: u64,
    catalog: DeviceCatalog,
    rows: Vec<DisplayRow>,
    selection: Selection,
}

impl<R: Runner + ?Sized> DeviceListModel<R> {
    pub fn new(runner: Arc<R>, simctl: Simctl, xcodebuild: Xcodebuild) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            runner,
            simctl,
            xcodebuild,
            tx,
            rx,
            in_flight: 0,
            refresh_generation: 0,
            applied_generation: 0,
            catalog: Default::default(),
            rows: Default::default(),
            selection: Default::default(),
        }
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn select(&mut self, udid: Uuid) -> bool {
        self.selection.select(udid)
    }

    pub fn deselect(&mut self, udid: &Uuid) -> bool {
        self.selection.deselect(udid)
    }

    pub fn is_selected(&self, udid: &Uuid) -> bool {
        self.selection.is_selected(udid)
    }

    pub fn selected_ids(&self) -> &HashSet<Uuid> {
        self.selection.selected_ids()
    }

    /// Whether any requests are still waiting on a worker.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn refresh(&mut self) {
        self.in_flight += 1;
        self.refresh_generation += 1;
        let generation = self.refresh_generation;
        let tx = self.tx.clone();
        runner::dispatch(Arc::clone(&self.runner), self.simctl.list(), move |result| {
            let listed = simctl::interpret_list(result).map(DeviceCatalog::from);
            send(&tx, Message::Listed { generation, listed });
        });
    }

    pub fn fetch_toolchain_version(&mut self) {
        self.in_flight += 1;
        let tx = self.tx.clone();
        runner::dispatch(
            Arc::clone(&self.runner),
            self.xcodebuild.version(),
            move |result| send(&tx, Message::Toolchain(toolchain::interpret(result))),
        );
    }

    pub fn delete_one(&mut self, udid: Uuid) {
        self.start_batch(vec![udid], Vec::new());
    }

    /// Deletes every selected device that the latest listing knows about.
    /// Returns how many deletions were started.
    pub fn delete_selected(&mut self) -> usize {
        let (present, absent): (Vec<Uuid>, Vec<Uuid>) = self
            .selection
            .selected_ids()
            .iter()
            .copied()
            .partition(|udid| self.catalog.contains(udid));
        for udid in &absent {
            log::warn!(
                "selected simulator {} isn't listed anymore; skipping it",
                simctl::format_udid(udid)
            );
        }
        let count = present.len();
        self.start_batch(present, absent);
        count
    }

    fn start_batch(&mut self, udids: Vec<Uuid>, skipped: Vec<Uuid>) {
        self.in_flight += 1;
        log::info!("deleting {} simulator(s)", udids.len());
        if udids.is_empty() {
            send(
                &self.tx,
                Message::BatchFinished(BatchReport {
                    skipped,
                    ..Default::default()
                }),
            );
            return;
        }
        let countdown = Arc::new(Countdown::new(udids.len(), skipped));
        for udid in udids {
            let tx = self.tx.clone();
            let countdown = Arc::clone(&countdown);
            runner::dispatch(
                Arc::clone(&self.runner),
                self.simctl.delete(udid),
                move |result| {
                    let result = simctl::interpret_delete(udid, result);
                    match &result {
                        Ok(()) => log::info!("{} delete successful", simctl::format_udid(&udid)),
                        Err(err) => log::error!("{}", err),
                    }
                    send(
                        &tx,
                        Message::Deleted {
                            udid,
                            succeeded: result.is_ok(),
                        },
                    );
                    if let Some(report) = countdown.complete(udid, result) {
                        send(&tx, Message::BatchFinished(report));
                    }
                },
            );
        }
    }

    fn apply(&mut self, message: Message) -> Event {
        match message {
            Message::Listed { generation, .. } if generation <= self.applied_generation => {
                self.in_flight -= 1;
                log::info!(
                    "dropping listing #{}; #{} is already applied",
                    generation,
                    self.applied_generation
                );
                Event::RefreshSuperseded
            }
            Message::Listed {
                generation,
                listed: Ok(catalog),
            } => {
                self.in_flight -= 1;
                self.applied_generation = generation;
                self.rows = catalog.rows();
                self.catalog = catalog;
                Event::Refreshed(Ok(self.rows.len()))
            }
            Message::Listed {
                generation,
                listed: Err(err),
            } => {
                self.in_flight -= 1;
                self.applied_generation = generation;
                log::error!("{}", err);
                self.catalog = Default::default();
                self.rows.clear();
                self.selection.clear();
                Event::Refreshed(Err(err))
            }
            Message::Deleted { udid, succeeded } => {
                self.selection.deselect(&udid);
                Event::Deleted { udid, succeeded }
            }
            Message::BatchFinished(report) => {
                self.in_flight -= 1;
                self.refresh();
                Event::BatchFinished(report)
            }
            Message::Toolchain(result) => {
                self.in_flight -= 1;
                Event::Toolchain(result)
            }
        }
    }

    /// Blocks until a worker reports back, applies it, and says what changed.
    /// Returns `None` once nothing is outstanding.
    pub fn next_event(&mut self) -> Option<Event> {
        if !self.is_busy() {
            return None;
        }
        // We hold a sender ourselves, so this can't disconnect.
        let message = self.rx.recv().ok()?;
        Some(self.apply(message))
    }

    /// Applies events until every outstanding request has resolved.
    pub fn settle(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.next_event()).collect()
    }
}
