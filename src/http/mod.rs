//! HTTP client used by transfers.
//!
//! - [`client`] - client creation and middleware configuration

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
