//! Tests for single transfers: digest skipping, freshness tokens, streaming
//! to disk or memory, and cleanup after failures.

use dljob::transfer::bytes_md5;
use dljob::{Completion, Destination, TransferState};

use httpmock::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod common;
use common::helpers::*;

#[tokio::test]
async fn test_matching_digest_skips_network() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/lwjgl.jar");
            then.status(200).body("new content");
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "libs/lwjgl.jar", &create_hello_world_content());

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(&server.url("/lwjgl.jar"), path.clone(), Some(HELLO_MD5))
        .unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_eq!(handle.state(), TransferState::Succeeded);
    assert_eq!(handle.completion(), Some(Completion::Skipped));
    assert_eq!(handle.bytes_received(), 0);
    assert_eq!(mock.hits_async().await, 0);
    assert_file_content(&path, &create_hello_world_content());
}

#[tokio::test]
async fn test_digest_match_ignores_case() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/lwjgl.jar");
            then.status(200).body("new content");
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "lwjgl.jar", &create_hello_world_content());

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(
            &server.url("/lwjgl.jar"),
            path,
            Some(&HELLO_MD5.to_uppercase()),
        )
        .unwrap();
    batch.start().wait().await.unwrap();

    assert_eq!(handle.completion(), Some(Completion::Skipped));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_mismatching_digest_downloads_with_local_token() {
    let old = b"stale library".to_vec();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/lwjgl.jar")
                .header("if-none-match", bytes_md5(&old));
            then.status(200).body(create_hello_world_content());
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "libs/lwjgl.jar", &old);

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(&server.url("/lwjgl.jar"), path.clone(), Some(EMPTY_MD5))
        .unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_eq!(handle.completion(), Some(Completion::Downloaded));
    assert_eq!(mock.hits_async().await, 1);
    // The new content replaces the old one even though its digest is not
    // the expected one: only the local digest is used, as freshness token.
    assert_file_content(&path, &create_hello_world_content());
}

#[tokio::test]
async fn test_not_modified_keeps_local_file() {
    let old = b"already current".to_vec();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/asset.bin")
                .header("if-none-match", bytes_md5(&old));
            then.status(304);
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "asset.bin", &old);

    let mut batch = create_hidden_batch();
    let handle = batch.add(&server.url("/asset.bin"), path.clone(), None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_eq!(handle.completion(), Some(Completion::NotModified));
    assert_eq!(mock.hits_async().await, 1);
    assert_file_content(&path, &old);
}

#[tokio::test]
async fn test_missing_file_creates_parent_directories() {
    let content = create_test_content(4096);
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/natives/lwjgl-natives.jar")
                .header_missing("if-none-match");
            then.status(200).body(&content);
        })
        .await;

    let dir = create_temp_dir();
    let path = dir.path().join("natives/linux/lwjgl-natives.jar");

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(&server.url("/natives/lwjgl-natives.jar"), path.clone(), None)
        .unwrap();
    batch.start().wait().await.unwrap();

    assert_eq!(handle.state(), TransferState::Succeeded);
    assert_eq!(handle.bytes_received(), content.len() as u64);
    assert_eq!(handle.bytes_total(), Some(content.len() as u64));
    assert_eq!(mock.hits_async().await, 1);
    assert_file_content(&path, &content);
}

#[tokio::test]
async fn test_relative_destination_uses_directory() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/a.jar");
            then.status(200).body("jar");
        })
        .await;

    let dir = create_temp_dir();
    let mut batch = create_hidden_batch_in(dir.path());
    let handle = batch
        .add(&server.url("/a.jar"), PathBuf::from("libraries/a.jar"), None)
        .unwrap();
    assert_eq!(
        handle.destination(),
        &Destination::File(dir.path().join("libraries/a.jar"))
    );

    batch.start().wait().await.unwrap();
    assert_file_content(&dir.path().join("libraries/a.jar"), b"jar");
}

#[tokio::test]
async fn test_memory_destination_keeps_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/versions/1.5.2.json");
            then.status(200).body(r#"{"id":"1.5.2"}"#);
        })
        .await;

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(
            &server.url("/versions/1.5.2.json"),
            Destination::Memory,
            None,
        )
        .unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_eq!(handle.take_data().as_deref(), Some(br#"{"id":"1.5.2"}"#.as_slice()));
    // The payload can only be taken once.
    assert!(handle.take_data().is_none());
}

#[tokio::test]
async fn test_memory_destination_not_modified_yields_empty_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/versions/1.5.2.json")
                .header("if-none-match", HELLO_MD5);
            then.status(304);
        })
        .await;

    let mut batch = create_hidden_batch();
    let handle = batch
        .add(
            &server.url("/versions/1.5.2.json"),
            Destination::Memory,
            Some(HELLO_MD5),
        )
        .unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(handle.completion(), Some(Completion::NotModified));
    assert_eq!(handle.take_data(), Some(Vec::new()));
}

#[tokio::test]
async fn test_empty_body_truncates_destination() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/empty");
            then.status(200);
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "empty", b"leftover");

    let mut batch = create_hidden_batch();
    batch.add(&server.url("/empty"), path.clone(), None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(report.is_success());
    assert_file_content(&path, b"");
}

#[tokio::test]
async fn test_http_error_removes_destination() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone.jar");
            then.status(404);
        })
        .await;

    let dir = create_temp_dir();
    let path = create_temp_file(dir.path(), "gone.jar", b"stale");

    let mut batch = create_hidden_batch();
    let handle = batch.add(&server.url("/gone.jar"), path.clone(), None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(handle.state(), TransferState::Failed);
    assert!(handle.error().unwrap().contains("404"));
    assert_file_absent(&path);
}

#[tokio::test]
async fn test_truncated_body_leaves_no_partial_file() {
    let url = spawn_truncating_server(create_test_content(10), 100_000).await;

    let dir = create_temp_dir();
    let path = dir.path().join("libs/truncated.jar");

    let mut batch = create_hidden_batch();
    let handle = batch.add(&url, path.clone(), None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(handle.state(), TransferState::Failed);
    assert!(handle.error().unwrap().contains("Transport"));
    assert_file_absent(&path);
}

#[tokio::test]
async fn test_connection_refused_fails() {
    let url = refused_url("/lwjgl.jar").await;

    let dir = create_temp_dir();
    let path = dir.path().join("lwjgl.jar");

    let mut batch = create_hidden_batch();
    let handle = batch.add(&url, path.clone(), None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(handle.state(), TransferState::Failed);
    assert_file_absent(&path);
}

#[tokio::test]
async fn test_directory_failure_skips_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/a.jar");
            then.status(200).body("jar");
        })
        .await;

    let dir = create_temp_dir();
    // A regular file where a directory is needed.
    create_temp_file(dir.path(), "blocker", b"not a directory");
    let path = dir.path().join("blocker/libs/a.jar");

    let mut batch = create_hidden_batch();
    let handle = batch.add(&server.url("/a.jar"), path, None).unwrap();
    let report = batch.start().wait().await.unwrap();

    assert!(!report.is_success());
    assert!(handle.error().unwrap().contains("Cannot create directory"));
    assert_eq!(mock.hits_async().await, 0);
    assert_file_content(&dir.path().join("blocker"), b"not a directory");
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let content = create_test_content(512 * 1024);
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/assets/big.bin");
            then.status(200).body(&content);
        })
        .await;

    let dir = create_temp_dir();
    let mut batch = create_hidden_batch();
    let handle = batch
        .add(
            &server.url("/assets/big.bin"),
            dir.path().join("big.bin"),
            None,
        )
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    handle.on_progress(move |received, total| {
        seen_clone.lock().unwrap().push((received, total));
    });

    batch.start().wait().await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(seen
        .iter()
        .all(|(_, total)| *total == Some(content.len() as u64)));
    assert_eq!(seen.last().unwrap().0, content.len() as u64);
}
