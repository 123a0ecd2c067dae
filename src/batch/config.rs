//! Configuration structures and callback types for batches.
//!
//! # Examples
//!
//! ```rust
//! use dljob::batch::{CompleteCallback, BatchOutcome};
//!
//! let callback: CompleteCallback = Box::new(|report| match report.outcome {
//!     BatchOutcome::Success => println!("all {} parts done", report.parts.len()),
//!     BatchOutcome::Failure => println!("{} parts failed", report.failed),
//! });
//! ```

use super::batch::BatchReport;
use crate::progress::StyleOptions;
use crate::transfer::PartReport;

use reqwest::header::HeaderMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Callback for progress of a part: `(index, bytes_received, bytes_total)`.
pub type ProgressCallback = Box<dyn Fn(usize, u64, Option<u64>) + Send + Sync>;

/// Callback for the terminal outcome of each part.
pub type PartCallback = Box<dyn Fn(&PartReport) + Send + Sync>;

/// Callback for the job-level outcome. Called exactly once per batch.
pub type CompleteCallback = Box<dyn Fn(&BatchReport) + Send + Sync>;

/// Configuration structure for a batch.
#[derive(Clone, Default)]
pub struct BatchConfig {
    /// Base directory for relative destination paths.
    pub directory: Option<PathBuf>,
    /// Progress bar style options.
    pub style_options: StyleOptions,
    /// Custom HTTP headers sent with every request.
    pub headers: Option<HeaderMap>,
    /// Optional proxy.
    pub proxy: Option<reqwest::Proxy>,
    /// Called on every received chunk of every part.
    pub on_progress: Option<Arc<ProgressCallback>>,
    /// Called when a part reaches its terminal state.
    pub on_part_complete: Option<Arc<PartCallback>>,
    /// Called once when the whole batch completes.
    pub on_complete: Option<Arc<CompleteCallback>>,
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("directory", &self.directory)
            .field("style_options", &self.style_options)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_part_complete", &self.on_part_complete.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl BatchConfig {
    /// Resolve a destination path against the base directory.
    pub(crate) fn resolve(&self, path: PathBuf) -> PathBuf {
        match &self.directory {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}
