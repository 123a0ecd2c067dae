//! Transfers: one network fetch of a single resource.
//!
//! This module provides the per-resource side of the engine. A transfer
//! fetches one URL into a file or an in-memory buffer, can skip the request
//! when the destination already holds the expected content, and reports
//! progress and exactly one terminal outcome to its batch.
//!
//! # Overview
//!
//! - `transfer` - the state machine that checks, requests and streams
//! - [`handle`] - [`TransferHandle`], the caller's view of a transfer
//! - [`state`] - [`TransferState`], [`Destination`], [`Completion`] and [`PartReport`]
//! - [`digest`] - MD5 helpers used for skipping and freshness tokens
//!
//! Transfers are created through [`Batch::add`](crate::batch::Batch::add).

pub mod digest;
pub mod handle;
pub mod state;
pub(crate) mod transfer;

pub use digest::{bytes_md5, file_md5, is_md5_hex};
pub use handle::{ProgressObserver, TransferHandle};
pub use state::{Completion, Destination, PartReport, TransferState};
pub(crate) use transfer::{remove_partial, Transfer, TransferContext, TransferEvent};
