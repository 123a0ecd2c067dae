//! Batches: many transfers run concurrently and reduced to one outcome.
//!
//! # Overview
//!
//! - `batch` - [`Batch`], [`RunningBatch`] and the event collector
//! - `builder` - [`BatchBuilder`] for configuring a batch
//! - `config` - [`BatchConfig`] and callback types
//! - `tally` - [`Tally`], the exactly-once completion counter
//!
//! # Examples
//!
//! ```rust,no_run
//! use dljob::batch::{BatchBuilder, BatchOutcome};
//! use std::path::PathBuf;
//!
//! # async fn example() -> dljob::Result<()> {
//! let mut batch = BatchBuilder::new()
//!     .on_complete(|report| println!("job finished: {:?}", report.outcome))
//!     .build()?;
//! batch.add("https://example.com/a.jar", PathBuf::from("libs/a.jar"), None)?;
//!
//! let running = batch.start();
//! let report = running.wait().await?;
//! assert_eq!(report.succeeded + report.failed, 1);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod builder;
pub mod config;
pub mod tally;

pub use batch::{Batch, BatchReport, BatchState, RunningBatch};
pub use builder::BatchBuilder;
pub use config::{BatchConfig, CompleteCallback, PartCallback, ProgressCallback};
pub use tally::{BatchOutcome, Tally};
