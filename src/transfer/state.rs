//! Transfer states and per-part reports.

use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the payload of a transfer ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Persist the payload to this file, creating parent directories.
    File(PathBuf),
    /// Keep the payload in an in-memory buffer.
    Memory,
}

impl Destination {
    /// Return the file path when persisting to disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::File(path) => Some(path),
            Destination::Memory => None,
        }
    }

    /// Return `true` when the payload is persisted to a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Destination::File(_))
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        // An empty path means "no destination".
        if path.as_os_str().is_empty() {
            Destination::Memory
        } else {
            Destination::File(path)
        }
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Destination::from(path.to_path_buf())
    }
}

/// Lifecycle of a single transfer.
///
/// States only move forward; a transfer enters a terminal state at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Registered but not started yet.
    NotStarted,
    /// Started, waiting for or receiving data.
    InProgress,
    /// Terminal: the content is in place.
    Succeeded,
    /// Terminal: the transfer failed.
    Failed,
}

impl TransferState {
    /// Return `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Succeeded | TransferState::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            TransferState::NotStarted => 0,
            TransferState::InProgress => 1,
            TransferState::Succeeded | TransferState::Failed => 2,
        }
    }

    /// Return `true` if moving from `self` to `next` respects the lifecycle.
    pub fn can_advance_to(self, next: TransferState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferState::NotStarted => "not started",
            TransferState::InProgress => "in progress",
            TransferState::Succeeded => "succeeded",
            TransferState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a successful transfer reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The destination already held content with the expected digest.
    /// No request was issued.
    Skipped,
    /// The server answered `304 Not Modified`; the destination was kept.
    NotModified,
    /// The body was received and stored.
    Downloaded,
}

/// Final record of one part of a batch.
#[derive(Debug, Clone)]
pub struct PartReport {
    /// Position of the transfer within its batch.
    pub index: usize,
    /// Requested resource.
    pub url: Url,
    /// Terminal state (`Succeeded` or `Failed`).
    pub state: TransferState,
    /// Set when the transfer succeeded.
    pub completion: Option<Completion>,
    /// Bytes received over the network.
    pub bytes_received: u64,
    /// Failure reason, when the transfer failed.
    pub error: Option<String>,
    /// Whether the failure was caused by cancellation.
    pub cancelled: bool,
}

impl PartReport {
    /// Return `true` if the part succeeded.
    pub fn succeeded(&self) -> bool {
        self.state == TransferState::Succeeded
    }
}
