//! Running many transfers as one job.
//!
//! A [`Batch`] collects transfers, starts them all at once and reduces their
//! outcomes into a single [`BatchOutcome`]. Every transfer runs in its own
//! tokio task; their events flow through one queue consumed by a collector
//! task, which is the only place the tally is updated. This makes the
//! completion check race-free and guarantees the job-level outcome is
//! emitted exactly once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dljob::batch::BatchBuilder;
//! use dljob::transfer::Destination;
//! use std::path::PathBuf;
//!
//! # async fn example() -> dljob::Result<()> {
//! let mut batch = BatchBuilder::hidden()
//!     .directory(PathBuf::from("instances/vanilla"))
//!     .build()?;
//!
//! batch.add(
//!     "https://libraries.minecraft.net/org/lwjgl/lwjgl/2.9.0/lwjgl-2.9.0.jar",
//!     PathBuf::from("libraries/lwjgl-2.9.0.jar"),
//!     Some("4f8bd3ff9fef4f8d2e4ff3fd5a0e6f4d"),
//! )?;
//! let manifest = batch.add("https://example.com/version.json", Destination::Memory, None)?;
//!
//! let report = batch.start().wait().await?;
//! if report.is_success() {
//!     let json = manifest.take_data().unwrap_or_default();
//!     println!("manifest is {} bytes", json.len());
//! }
//! # Ok(())
//! # }
//! ```

use super::config::BatchConfig;
use super::tally::{BatchOutcome, Tally};
use crate::error::{Error, Result};
use crate::progress::ProgressDisplay;
use crate::transfer::{
    remove_partial, Destination, PartReport, Transfer, TransferContext, TransferEvent,
    TransferHandle,
};

use futures::FutureExt;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of a started batch.
///
/// A batch that still accepts transfers is a [`Batch`]; this state only
/// tracks a [`RunningBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Started; waiting for parts to finish.
    Running,
    /// Every part reached a terminal state.
    Completed(BatchOutcome),
}

/// Final record of a batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Aggregate outcome.
    pub outcome: BatchOutcome,
    /// Number of parts that succeeded.
    pub succeeded: usize,
    /// Number of parts that failed.
    pub failed: usize,
    /// One report per part, ordered by index.
    pub parts: Vec<PartReport>,
}

impl BatchReport {
    /// Return `true` if every part succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome == BatchOutcome::Success
    }

    /// Reports of the parts that failed.
    pub fn failed_parts(&self) -> impl Iterator<Item = &PartReport> {
        self.parts.iter().filter(|p| !p.succeeded())
    }
}

/// A set of transfers run concurrently and reduced to one outcome.
///
/// Created by [`BatchBuilder`](super::BatchBuilder). Transfers can only be
/// added before [`Batch::start`], which consumes the batch.
pub struct Batch {
    config: BatchConfig,
    client: ClientWithMiddleware,
    transfers: Vec<Transfer>,
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("config", &self.config)
            .field("transfers", &self.transfers.len())
            .finish()
    }
}

impl Batch {
    pub(crate) fn new(config: BatchConfig, client: ClientWithMiddleware) -> Self {
        Self {
            config,
            client,
            transfers: Vec::new(),
        }
    }

    /// Gets the batch configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Number of registered transfers.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// Return `true` if no transfer was registered.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Handles of the registered transfers, ordered by index.
    pub fn handles(&self) -> Vec<TransferHandle> {
        self.transfers.iter().map(Transfer::handle).collect()
    }

    /// Register a transfer from a URL string.
    ///
    /// An empty `expected_digest` is the same as `None`.
    pub fn add(
        &mut self,
        url: &str,
        destination: impl Into<Destination>,
        expected_digest: Option<&str>,
    ) -> Result<TransferHandle> {
        let url = Url::parse(url).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", url, e))
        })?;
        Ok(self.add_url(url, destination, expected_digest.map(String::from)))
    }

    /// Register a transfer and return its handle.
    ///
    /// The transfer gets the next index. Relative file destinations are
    /// resolved against the configured directory.
    pub fn add_url(
        &mut self,
        url: Url,
        destination: impl Into<Destination>,
        expected_digest: Option<String>,
    ) -> TransferHandle {
        let destination = match destination.into() {
            Destination::File(path) => Destination::File(self.config.resolve(path)),
            Destination::Memory => Destination::Memory,
        };
        let index = self.transfers.len();
        debug!("Adding part {}: {} -> {:?}", index, url, destination);

        let transfer = Transfer::new(index, url, destination, expected_digest);
        let handle = transfer.handle();
        self.transfers.push(transfer);
        handle
    }

    /// Start every transfer.
    ///
    /// Does not block; must be called from within a tokio runtime.
    pub fn start(self) -> RunningBatch {
        let Batch {
            config,
            client,
            transfers,
        } = self;

        info!("Download job started with {} parts", transfers.len());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handles: Vec<TransferHandle> = transfers.iter().map(Transfer::handle).collect();
        let state = Arc::new(Mutex::new(BatchState::Running));

        let collector = Collector {
            tally: Tally::new(handles.len()),
            handles: handles.clone(),
            display: ProgressDisplay::new(config.style_options.clone(), handles.len()),
            config,
            state: state.clone(),
        };
        let collector = tokio::spawn(collector.run(events_rx));

        for transfer in transfers {
            let ctx = TransferContext {
                client: client.clone(),
                events: events_tx.clone(),
                cancel: cancel_rx.clone(),
            };
            tokio::spawn(supervise(transfer, ctx));
        }

        RunningBatch {
            handles,
            cancel: cancel_tx,
            state,
            collector,
        }
    }
}

/// Run a transfer and make sure a panic still produces a terminal event.
async fn supervise(transfer: Transfer, ctx: TransferContext) {
    let handle = transfer.handle();
    let events = ctx.events.clone();

    if AssertUnwindSafe(transfer.run(ctx))
        .catch_unwind()
        .await
        .is_err()
    {
        warn!("Transfer {} of {} panicked", handle.index(), handle.url());
        if handle.shared.request_sent() {
            if let Some(path) = handle.destination().path() {
                remove_partial(path).await;
            }
        }
        let outcome = Err(Error::Internal("transfer task panicked".into()));
        if handle.shared.finish(&outcome, None) {
            let _ = events.send(TransferEvent::Finished {
                index: handle.index(),
                succeeded: false,
            });
        }
    }
}

/// Single consumer of the transfer events of a batch.
struct Collector {
    tally: Tally,
    handles: Vec<TransferHandle>,
    display: ProgressDisplay,
    config: BatchConfig,
    state: Arc<Mutex<BatchState>>,
}

impl Collector {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<TransferEvent>) -> BatchReport {
        let mut outcome = self.tally.check();

        while outcome.is_none() {
            match events.recv().await {
                Some(TransferEvent::Progress {
                    index,
                    received,
                    total,
                }) => {
                    self.display.progress(index, received, total);
                    if let Some(ref callback) = self.config.on_progress {
                        callback(index, received, total);
                    }
                }
                Some(TransferEvent::Finished { index, succeeded }) => {
                    outcome = self.part_finished(index, succeeded);
                }
                None => {
                    // Every transfer task is gone; whatever did not report failed.
                    for index in self.tally.pending() {
                        warn!("Part {} ended without reporting", index);
                        let lost = Err(Error::Internal("transfer ended without reporting".into()));
                        self.handles[index].shared.finish(&lost, None);
                        outcome = self.part_finished(index, false);
                    }
                    if outcome.is_none() {
                        outcome = self.tally.check();
                    }
                    break;
                }
            }
        }

        let outcome = outcome.unwrap_or(BatchOutcome::Failure);
        self.complete(outcome)
    }

    fn part_finished(&mut self, index: usize, succeeded: bool) -> Option<BatchOutcome> {
        let Some(handle) = self.handles.get(index) else {
            warn!("Ignoring outcome for unknown part {}", index);
            return None;
        };
        if self.tally.is_reported(index) {
            warn!("Ignoring duplicate outcome for part {}", index);
            return None;
        }
        let report = handle.shared.report();

        let outcome = self.tally.record(index, succeeded);
        self.display.finish_part(index);
        if let Some(ref callback) = self.config.on_part_complete {
            callback(&report);
        }
        outcome
    }

    fn complete(self, outcome: BatchOutcome) -> BatchReport {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = BatchState::Completed(outcome);
        self.display.finish();

        let report = BatchReport {
            outcome,
            succeeded: self.tally.succeeded(),
            failed: self.tally.failed(),
            parts: self.handles.iter().map(|h| h.shared.report()).collect(),
        };

        match outcome {
            BatchOutcome::Success => info!("Download job succeeded"),
            BatchOutcome::Failure => info!(
                "Download job failed: {} of {} parts failed",
                report.failed,
                report.parts.len()
            ),
        }

        if let Some(ref callback) = self.config.on_complete {
            callback(&report);
        }
        report
    }
}

/// A started batch.
///
/// Dropping it does not stop the transfers; use [`RunningBatch::cancel`].
pub struct RunningBatch {
    handles: Vec<TransferHandle>,
    cancel: watch::Sender<bool>,
    state: Arc<Mutex<BatchState>>,
    collector: JoinHandle<BatchReport>,
}

impl fmt::Debug for RunningBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningBatch")
            .field("parts", &self.handles.len())
            .field("state", &self.state())
            .finish()
    }
}

impl RunningBatch {
    /// Handles of the transfers, ordered by index.
    pub fn handles(&self) -> &[TransferHandle] {
        &self.handles
    }

    /// Current batch state.
    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return `true` once the job-level outcome was emitted.
    pub fn is_finished(&self) -> bool {
        matches!(self.state(), BatchState::Completed(_))
    }

    /// Ask every running transfer to abort.
    ///
    /// Aborted transfers fail and still count toward completion.
    pub fn cancel(&self) {
        info!("Cancelling download job");
        self.cancel.send_replace(true);
    }

    /// Wait for the job-level outcome.
    pub async fn wait(self) -> Result<BatchReport> {
        self.collector
            .await
            .map_err(|e| Error::Internal(format!("download job collector failed: {}", e)))
    }
}
