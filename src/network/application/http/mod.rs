//! HTTP/1.1 building blocks for embedded systems.
//!
//! This module provides the pieces the IPFS client assembles its requests and
//! reads its responses with. It focuses on predictable memory usage: request
//! heads are built into fixed-capacity strings, and responses are consumed
//! through a small window, one line at a time.
//!
//! # Features
//!
//! - Request head builder with percent-encoded query parameters
//! - `multipart/form-data` framing with exact `Content-Length` computation
//! - Line-oriented response reader for streamed, newline-delimited bodies
//! - Status line and framing header parsing
//!
//! Chunked transfer decoding, redirects and keep-alive are deliberately not
//! supported.
//!
//! ```rust
//! use libipfs::network::application::http::response::parse_status_line;
//!
//! assert_eq!(parse_status_line("HTTP/1.1 200 OK"), Some(200));
//! ```

/// Request head construction and query encoding.
pub mod request;

/// Response head parsing and line-oriented body reading.
pub mod response;

/// `multipart/form-data` framing.
pub mod multipart;

/// Finds the first occurrence of a slice in another slice and returns its starting position.
pub(crate) fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
