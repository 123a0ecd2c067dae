//! dljob runs download jobs: many HTTP(S) transfers started at once and
//! reduced to a single success or failure.
//!
//! Each transfer fetches one URL into a file or an in-memory buffer. When
//! the destination file already holds content with the expected MD5 the
//! transfer succeeds without touching the network; otherwise the digest of
//! the local file is sent as an `If-None-Match` freshness token. Bodies are
//! streamed to disk, and failed transfers never leave partial files behind.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dljob::{BatchBuilder, Destination};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> dljob::Result<()> {
//! let mut batch = BatchBuilder::new()
//!     .directory(PathBuf::from("instances/vanilla"))
//!     .build()?;
//! batch.add(
//!     "https://libraries.minecraft.net/net/java/jinput/jinput/2.0.5/jinput-2.0.5.jar",
//!     PathBuf::from("libraries/jinput-2.0.5.jar"),
//!     None,
//! )?;
//! let index = batch.add("https://example.com/index.json", Destination::Memory, None)?;
//!
//! let report = batch.start().wait().await?;
//! println!("{:?}: {} ok, {} failed", report.outcome, report.succeeded, report.failed);
//! let _json = index.take_data();
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`transfer`] - single-resource fetches, digests and handles
//! - [`batch`] - the job: builder, configuration, tally and collector
//! - [`error`] - centralized error handling with the `Error` enum
//! - [`http`] - HTTP client setup
//! - [`progress`] - progress bar styling and display

pub mod batch;
pub mod error;
pub mod http;
pub mod progress;
pub mod transfer;

pub use batch::{Batch, BatchBuilder, BatchOutcome, BatchReport, BatchState, RunningBatch};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use transfer::{Completion, Destination, PartReport, TransferHandle, TransferState};
