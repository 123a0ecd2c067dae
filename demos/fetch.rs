//! Fetch a few game libraries and a manifest in a single job.
//!
//! Run with `RUST_LOG=dljob=debug` to see the transfers being traced.

use color_eyre::{eyre::eyre, Result};
use dljob::{BatchBuilder, Destination};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut batch = BatchBuilder::new()
        .directory(PathBuf::from("downloads"))
        .on_part_complete(|part| {
            if let Some(reason) = &part.error {
                eprintln!("{} failed: {}", part.url, reason);
            }
        })
        .build()?;

    for i in 1..=8 {
        let url = format!("https://httpbin.org/bytes/131072?seed={}", i);
        batch.add(&url, PathBuf::from(format!("libraries/part-{}.bin", i)), None)?;
    }
    let manifest = batch.add("https://httpbin.org/json", Destination::Memory, None)?;

    let report = batch.start().wait().await?;
    if !report.is_success() {
        return Err(eyre!("{} of {} parts failed", report.failed, report.parts.len()));
    }

    let json = manifest.take_data().unwrap_or_default();
    println!(
        "\nDownload complete! {} parts, manifest is {} bytes.",
        report.succeeded,
        json.len()
    );

    Ok(())
}
