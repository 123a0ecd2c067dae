//! Builder pattern implementation for creating [`Batch`] instances.
//!
//! # Examples
//!
//! ```rust
//! use dljob::batch::BatchBuilder;
//! use reqwest::header::{HeaderValue, USER_AGENT};
//! use std::path::PathBuf;
//!
//! # fn example() -> dljob::Result<()> {
//! let batch = BatchBuilder::hidden()
//!     .directory(PathBuf::from("instances/vanilla"))
//!     .header(USER_AGENT, HeaderValue::from_static("launcher/1.0"))
//!     .on_part_complete(|part| {
//!         if let Some(reason) = &part.error {
//!             println!("{} failed: {}", part.url, reason);
//!         }
//!     })
//!     .build()?;
//! assert!(batch.is_empty());
//! # Ok(())
//! # }
//! ```

use super::{batch::Batch, batch::BatchReport, config::BatchConfig};
use crate::error::Result;
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::{ProgressBarOpts, StyleOptions};
use crate::transfer::PartReport;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{path::PathBuf, sync::Arc};

/// A builder used to create a [`Batch`].
#[derive(Default)]
pub struct BatchBuilder {
    config: BatchConfig,
}

impl BatchBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        BatchBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = BatchBuilder::default();
        builder.config.style_options =
            StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
        builder
    }

    /// Sets the directory relative destinations are resolved against.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = Some(directory);
        self
    }

    /// Set the progress bar style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Route every request through a proxy.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Set callback for progress of every part.
    ///
    /// Called on every received chunk with `(index, bytes_received, bytes_total)`.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, u64, Option<u64>) + Send + Sync + 'static,
    {
        self.config.on_progress = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Set callback for when each part reaches its terminal state.
    pub fn on_part_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PartReport) + Send + Sync + 'static,
    {
        self.config.on_part_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Set callback for when the whole batch completes.
    ///
    /// The callback is called exactly once, after every part finished.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BatchReport) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Batch`] with the specified options.
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn build(self) -> Result<Batch> {
        let client = create_http_client(HttpClientConfig {
            proxy: self.config.proxy.clone(),
            headers: self.config.headers.clone(),
        })?;
        Ok(Batch::new(self.config, client))
    }
}
