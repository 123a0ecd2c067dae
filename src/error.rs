//! Error handling for the dljob library.
//!
//! Every way a transfer can fail is one variant of [`Error`]. A failed
//! transfer keeps its typed reason on its part report, while the batch only
//! exposes the aggregate success or failure.

use reqwest::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when running download jobs.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Used when a transfer task dies without reporting, or when the job's
    /// event queue closes early.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The parent directories of a destination could not be created.
    ///
    /// No request is issued when this happens.
    #[error("Cannot create directory {path:?}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination file could not be opened for writing.
    #[error("Cannot open {path:?} for writing")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A received chunk could not be written to the destination file.
    #[error("Cannot write to {path:?}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O Error.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Network-layer failure while sending the request or reading the body.
    #[error("Transport error")]
    Transport {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server answered with a status that is neither a success nor
    /// `304 Not Modified`.
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(StatusCode),

    /// The job was cancelled while the transfer was still running.
    #[error("Transfer cancelled")]
    Cancelled,

    /// Error from the Reqwest library.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

impl Error {
    /// Returns `true` if the transfer ended because its job was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for operations that can fail with a dljob error.
pub type Result<T> = std::result::Result<T, Error>;
