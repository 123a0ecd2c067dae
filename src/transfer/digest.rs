//! MD5 digests used to skip redundant transfers.
//!
//! A digest is the lowercase hexadecimal MD5 of a file's content. It serves
//! two purposes: if the destination already holds content with the expected
//! digest the transfer is skipped, and otherwise the digest of the local file
//! is sent to the server as an `If-None-Match` freshness token.
//!
//! # Examples
//!
//! ```rust
//! use dljob::transfer::digest::{bytes_md5, digests_match, is_md5_hex};
//!
//! let digest = bytes_md5(b"");
//! assert_eq!(digest, "d41d8cd98f00b204e9800998ecf8427e");
//! assert!(is_md5_hex(&digest));
//! assert!(digests_match(&digest, "D41D8CD98F00B204E9800998ECF8427E"));
//! ```

use crate::error::Result;

use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the lowercase hexadecimal MD5 of a byte slice.
pub fn bytes_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the MD5 of a whole file, reading it in chunks.
pub async fn file_md5(path: &Path) -> Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Return `true` if the string looks like an MD5 digest (32 hex characters).
pub fn is_md5_hex(digest: &str) -> bool {
    digest.len() == 32 && digest.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compare two hex digests, ignoring case.
pub fn digests_match(computed: &str, expected: &str) -> bool {
    computed.eq_ignore_ascii_case(expected)
}
