#![allow(dead_code)]

use dljob::progress::{ProgressBarOpts, StyleOptions};
use dljob::{Batch, BatchBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// Common test constants
pub const TEST_USER_AGENT: &str = "dljob-test-agent";
pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
pub const HELLO_MD5: &str = "65a8e27d8879283831b664bd8b7f0ad4";

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a file with the given content, creating parent directories
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Creates content for hash verification
pub fn create_hello_world_content() -> Vec<u8> {
    b"Hello, World!".to_vec()
}

/// Creates a batch without progress bars
pub fn create_hidden_batch() -> Batch {
    init_tracing();
    BatchBuilder::hidden().build().expect("Failed to build batch")
}

/// Creates a batch without progress bars rooted at `dir`
pub fn create_hidden_batch_in(dir: &Path) -> Batch {
    init_tracing();
    BatchBuilder::hidden()
        .directory(dir.to_path_buf())
        .build()
        .expect("Failed to build batch")
}

/// Returns the URL of a local port nothing listens on
pub async fn refused_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    format!("http://{}{}", addr, path)
}

/// Serves one response announcing `announced` bytes but sending only `body`,
/// then closes the connection.
pub async fn spawn_truncating_server(body: Vec<u8>, announced: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\ncontent-type: application/octet-stream\r\n\r\n",
                announced
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.flush().await;
        }
    });

    format!("http://{}/truncated.jar", addr)
}

/// Asserts that a file exists with the expected content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).unwrap_or_else(|e| panic!("Cannot read {:?}: {}", path, e));
    assert_eq!(content, expected, "Content mismatch at path: {:?}", path);
}

/// Asserts that no file exists at the given path
pub fn assert_file_absent(path: &Path) {
    assert!(!path.exists(), "File should not exist at path: {:?}", path);
}

// === Progress Bar Helpers ===

/// Creates default test progress bar options
pub fn create_test_progress_opts() -> ProgressBarOpts {
    ProgressBarOpts::new(None, None, true, false)
}

/// Creates disabled style options for testing
pub fn create_disabled_style_options() -> StyleOptions {
    StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
}
