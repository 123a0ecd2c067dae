//! Shared view of a transfer owned by a batch.
//!
//! The batch owns its transfers; callers only get a [`TransferHandle`]. The
//! handle reads the live state of the transfer and lets callers attach
//! progress observers before the batch starts.

use super::state::{Completion, Destination, PartReport, TransferState};
use crate::error::Error;

use reqwest::Url;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Observer called on every received chunk with `(bytes_received, bytes_total)`.
pub type ProgressObserver = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

#[derive(Debug)]
struct Status {
    state: TransferState,
    bytes_received: u64,
    bytes_total: Option<u64>,
    completion: Option<Completion>,
    error: Option<String>,
    cancelled: bool,
    request_sent: bool,
    data: Option<Vec<u8>>,
}

pub(crate) struct Shared {
    index: usize,
    url: Url,
    destination: Destination,
    status: Mutex<Status>,
    observers: Mutex<Option<Vec<ProgressObserver>>>,
}

impl Shared {
    pub(crate) fn new(index: usize, url: Url, destination: Destination) -> Self {
        Self {
            index,
            url,
            destination,
            status: Mutex::new(Status {
                state: TransferState::NotStarted,
                bytes_received: 0,
                bytes_total: None,
                completion: None,
                error: None,
                cancelled: false,
                request_sent: false,
                data: None,
            }),
            observers: Mutex::new(Some(Vec::new())),
        }
    }

    pub(crate) fn destination(&self) -> &Destination {
        &self.destination
    }

    fn status(&self) -> MutexGuard<'_, Status> {
        // A poisoned lock only means an observer panicked; the status itself
        // is always left consistent.
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand the registered observers over to the running transfer.
    ///
    /// Observers attached afterwards are rejected.
    pub(crate) fn take_observers(&self) -> Vec<ProgressObserver> {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .unwrap_or_default()
    }

    pub(crate) fn begin(&self) -> bool {
        let mut status = self.status();
        if !status.state.can_advance_to(TransferState::InProgress) {
            return false;
        }
        status.state = TransferState::InProgress;
        true
    }

    /// Note that the request went out. From then on a failure must remove
    /// the destination file.
    pub(crate) fn mark_request_sent(&self) {
        self.status().request_sent = true;
    }

    pub(crate) fn request_sent(&self) -> bool {
        self.status().request_sent
    }

    /// Record a progress update. Ignored once the transfer is terminal.
    pub(crate) fn record_progress(&self, received: u64, total: Option<u64>) -> bool {
        let mut status = self.status();
        if status.state.is_terminal() {
            return false;
        }
        status.bytes_received = received;
        status.bytes_total = total;
        true
    }

    /// Move to the terminal state matching `outcome`.
    ///
    /// Returns `false`, and changes nothing, if the transfer is already
    /// terminal.
    pub(crate) fn finish(
        &self,
        outcome: &Result<Completion, Error>,
        data: Option<Vec<u8>>,
    ) -> bool {
        let mut status = self.status();
        let next = match outcome {
            Ok(_) => TransferState::Succeeded,
            Err(_) => TransferState::Failed,
        };
        if !status.state.can_advance_to(next) {
            return false;
        }
        status.state = next;
        match outcome {
            Ok(completion) => {
                status.completion = Some(*completion);
                status.data = data;
            }
            Err(e) => {
                status.error = Some(format_error(e));
                status.cancelled = e.is_cancelled();
            }
        }
        true
    }

    pub(crate) fn report(&self) -> PartReport {
        let status = self.status();
        PartReport {
            index: self.index,
            url: self.url.clone(),
            state: status.state,
            completion: status.completion,
            bytes_received: status.bytes_received,
            error: status.error.clone(),
            cancelled: status.cancelled,
        }
    }
}

/// Render an error with its whole source chain.
fn format_error(error: &Error) -> String {
    let mut msg = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// Handle to a transfer registered in a batch.
///
/// Handles are cheap to clone and stay valid after the batch completes.
#[derive(Clone)]
pub struct TransferHandle {
    pub(crate) shared: Arc<Shared>,
}

impl fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferHandle")
            .field("index", &self.shared.index)
            .field("url", &self.shared.url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

impl TransferHandle {
    /// Position of the transfer within its batch.
    pub fn index(&self) -> usize {
        self.shared.index
    }

    /// Requested resource.
    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    /// Where the payload is stored.
    pub fn destination(&self) -> &Destination {
        self.shared.destination()
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        self.shared.status().state
    }

    /// Bytes received so far.
    pub fn bytes_received(&self) -> u64 {
        self.shared.status().bytes_received
    }

    /// Expected size, `None` while indeterminate.
    pub fn bytes_total(&self) -> Option<u64> {
        self.shared.status().bytes_total
    }

    /// How the transfer succeeded, if it did.
    pub fn completion(&self) -> Option<Completion> {
        self.shared.status().completion
    }

    /// Failure reason, if the transfer failed.
    pub fn error(&self) -> Option<String> {
        self.shared.status().error.clone()
    }

    /// Take the in-memory payload.
    ///
    /// Only set for [`Destination::Memory`] transfers that succeeded.
    pub fn take_data(&self) -> Option<Vec<u8>> {
        self.shared.status().data.take()
    }

    /// Attach an observer called on every received chunk.
    ///
    /// Observers must be attached before the batch starts; later ones are
    /// dropped.
    pub fn on_progress<F>(&self, observer: F)
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        let mut observers = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match observers.as_mut() {
            Some(list) => list.push(Box::new(observer)),
            None => warn!(
                "Ignoring progress observer for part {}: transfer already started",
                self.shared.index
            ),
        }
    }
}
