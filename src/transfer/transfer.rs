//! Fetching a single resource.
//!
//! A [`Transfer`] fetches one URL into one [`Destination`]. When the
//! destination file already exists its MD5 is computed first: a match with
//! the expected digest ends the transfer without any request, and a mismatch
//! makes the local digest the `If-None-Match` token of the request.
//!
//! The body is streamed chunk by chunk. Files are opened lazily on the first
//! chunk and removed again if the transfer fails after the request was sent,
//! so a failed transfer never leaves a partial file behind.

use super::digest::{digests_match, file_md5};
use super::handle::{ProgressObserver, Shared, TransferHandle};
use super::state::{Completion, Destination};
use crate::error::{Error, Result};

use futures::StreamExt;
use reqwest::{header::IF_NONE_MATCH, StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Notification sent by a running transfer to its batch.
///
/// For a given transfer, progress events keep the order in which bytes were
/// received and `Finished` is always the last event.
#[derive(Debug, Clone)]
pub(crate) enum TransferEvent {
    Progress {
        index: usize,
        received: u64,
        total: Option<u64>,
    },
    Finished {
        index: usize,
        succeeded: bool,
    },
}

/// Everything a transfer needs from its batch while running.
#[derive(Clone)]
pub(crate) struct TransferContext {
    pub(crate) client: ClientWithMiddleware,
    pub(crate) events: mpsc::UnboundedSender<TransferEvent>,
    pub(crate) cancel: watch::Receiver<bool>,
}

/// One network fetch of a single resource.
pub(crate) struct Transfer {
    shared: Arc<Shared>,
    /// Digest sent as freshness token. Replaced by the local digest when an
    /// existing destination does not match.
    expected_digest: Option<String>,
    check_digest: bool,
}

impl Transfer {
    /// Record the inputs. No I/O happens here.
    pub(crate) fn new(
        index: usize,
        url: Url,
        destination: Destination,
        expected_digest: Option<String>,
    ) -> Self {
        let expected_digest = expected_digest.filter(|d| !d.is_empty());
        Self {
            shared: Arc::new(Shared::new(index, url, destination)),
            check_digest: expected_digest.is_some(),
            expected_digest,
        }
    }

    pub(crate) fn handle(&self) -> TransferHandle {
        TransferHandle {
            shared: self.shared.clone(),
        }
    }

    pub(crate) fn check_digest(&self) -> bool {
        self.check_digest
    }

    pub(crate) fn persist_to_file(&self) -> bool {
        self.shared.destination().is_file()
    }

    /// Run the transfer to its terminal state and report it to the batch.
    ///
    /// Exactly one `Finished` event is sent, whichever path ends the transfer.
    pub(crate) async fn run(mut self, ctx: TransferContext) {
        let handle = self.handle();
        let index = handle.index();
        let mut cancel = ctx.cancel.clone();

        let sink = ProgressSink {
            index,
            shared: self.shared.clone(),
            observers: self.shared.take_observers(),
            events: ctx.events.clone(),
        };
        self.shared.begin();

        let outcome = tokio::select! {
            res = self.fetch(&ctx.client, &sink) => res,
            _ = cancelled(&mut cancel) => Err(Error::Cancelled),
        };

        let (outcome, data) = match outcome {
            Ok((completion, data)) => (Ok(completion), data),
            Err(e) => (Err(e), None),
        };

        if let Err(e) = &outcome {
            warn!("Transfer {} of {} failed: {}", index, handle.url(), e);
            if self.shared.request_sent() {
                if let Some(path) = handle.destination().path() {
                    remove_partial(path).await;
                }
            }
        }

        if self.shared.finish(&outcome, data) {
            let _ = ctx.events.send(TransferEvent::Finished {
                index,
                succeeded: outcome.is_ok(),
            });
        }
    }

    /// Perform the transfer. Returns the in-memory payload for
    /// [`Destination::Memory`].
    async fn fetch(
        &mut self,
        client: &ClientWithMiddleware,
        sink: &ProgressSink,
    ) -> Result<(Completion, Option<Vec<u8>>)> {
        let handle = self.handle();
        let destination = handle.destination().clone();

        if let Destination::File(path) = &destination {
            if self.existing_matches(path).await {
                info!("Skipping {}: digest match", handle.url());
                return Ok((Completion::Skipped, None));
            }

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                debug!("Creating destination directory {:?}", parent);
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        debug!("Downloading {}", handle.url());
        let mut req = client.get(handle.url().clone());
        if let Some(digest) = self.expected_digest.as_deref() {
            req = req.header(IF_NONE_MATCH, digest);
        }

        self.shared.mark_request_sent();
        let res = req.send().await?;

        let status = res.status();
        if status == StatusCode::NOT_MODIFIED {
            info!("{} not modified, keeping local copy", handle.url());
            let data = match destination {
                Destination::Memory => Some(Vec::new()),
                Destination::File(_) => None,
            };
            return Ok((Completion::NotModified, data));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        let total = res.content_length();
        let mut received: u64 = 0;
        let mut buffer = Vec::new();
        let mut file: Option<File> = None;

        let mut stream = res.bytes_stream();
        while let Some(item) = stream.next().await {
            let chunk = item.map_err(|e| Error::Transport { source: e.into() })?;
            received += chunk.len() as u64;

            match &destination {
                Destination::Memory => buffer.extend_from_slice(&chunk),
                Destination::File(path) => {
                    if file.is_none() {
                        file = Some(open_destination(path).await?);
                    }
                    if let Some(f) = file.as_mut() {
                        f.write_all(&chunk)
                            .await
                            .map_err(|source| Error::FileWrite {
                                path: path.clone(),
                                source,
                            })?;
                    }
                }
            }

            sink.emit(received, total);
        }

        match destination {
            Destination::Memory => Ok((Completion::Downloaded, Some(buffer))),
            Destination::File(path) => {
                // An empty body still replaces whatever was there.
                let mut f = match file {
                    Some(f) => f,
                    None => open_destination(&path).await?,
                };
                f.flush()
                    .await
                    .map_err(|source| Error::FileWrite { path, source })?;
                Ok((Completion::Downloaded, None))
            }
        }
    }

    /// Check an existing destination against the expected digest.
    ///
    /// On a mismatch the local digest replaces the expected one and is only
    /// used as the freshness token; the new content is not verified against
    /// it afterwards.
    async fn existing_matches(&mut self, path: &Path) -> bool {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return false;
        }

        let local = match file_md5(path).await {
            Ok(local) => local,
            Err(e) => {
                warn!("Cannot hash existing file {:?}: {}", path, e);
                return false;
            }
        };

        let matches = self.check_digest
            && self
                .expected_digest
                .as_deref()
                .is_some_and(|expected| digests_match(&local, expected));
        if !matches {
            debug!("Existing file {:?} has digest {}", path, local);
            self.expected_digest = Some(local);
        }
        matches
    }
}

/// Delivers progress to the handle, its observers and the batch.
struct ProgressSink {
    index: usize,
    shared: Arc<Shared>,
    observers: Vec<ProgressObserver>,
    events: mpsc::UnboundedSender<TransferEvent>,
}

impl ProgressSink {
    fn emit(&self, received: u64, total: Option<u64>) {
        if !self.shared.record_progress(received, total) {
            return;
        }
        for observer in &self.observers {
            observer(received, total);
        }
        let _ = self.events.send(TransferEvent::Progress {
            index: self.index,
            received,
            total,
        });
    }
}

async fn open_destination(path: &Path) -> Result<File> {
    debug!("Creating destination file {:?}", path);
    File::create(path).await.map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => (),
        Err(e) => warn!("Cannot remove {:?}: {}", path, e),
    }
}

/// Resolve once the batch asks for cancellation.
///
/// Never resolves if the cancel signal can no longer be sent.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
