//! IPFS HTTP RPC client for embedded systems
//!
//! This module talks to the `/api/v0` control API of an IPFS node (Kubo and
//! compatible implementations). It lets a device upload text or file
//! payloads, fetch objects by CID and run management commands, while keeping
//! every buffer at a fixed, compile-time size.
//!
//! # Request lifecycle
//!
//! Every operation is self-contained: the client obtains a connection
//! (reusing an attached one only if it still reports being connected), writes
//! one request, parses the response and closes the connection before
//! returning, on success and failure alike.
//!
//! # Errors
//!
//! Operations return `Result<T, Error>`. Node-side failures carry the node's
//! error envelope inline in [`Error::Node`]; the same envelope is also kept
//! by the client and available from [`Client::last_error`] until the next
//! operation starts.

#![deny(unsafe_code)]

use crate::network::error::Error as NetworkError;
use heapless::String;

pub mod client;
pub mod request;
pub mod response;
pub mod source;

pub use client::{Client, Options};
pub use request::Command;
pub use source::{ContentKind, FileSource, Payload, Upload};

/// Path prefix of the node's RPC API.
pub const API_PATH: &str = "/api/v0";
/// Default RPC API port of an IPFS node.
pub const DEFAULT_API_PORT: u16 = 5001;

/// Maximum length of the node host name.
pub const MAX_HOST_LEN: usize = 64;
/// Maximum length of file names, submitted and returned.
pub const MAX_NAME_LEN: usize = 255;
/// Maximum length of a returned content identifier.
pub const MAX_HASH_LEN: usize = 64;
/// Maximum length of the `Type` field of a node error.
pub const MAX_ERROR_TYPE_LEN: usize = 32;
/// Maximum length of the `Message` field of a node error.
pub const MAX_MESSAGE_LEN: usize = 255;
/// Capacity of the string returned by [`Client::cat`].
pub const CAT_CAPACITY: usize = 2048;
/// Capacity of a request head, including the multipart opening section.
pub const REQUEST_CAPACITY: usize = 1536;
/// Capacity used to buffer an error response body.
pub const ERROR_BODY_CAPACITY: usize = 512;

/// Host and port of the node's RPC API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    host: String<MAX_HOST_LEN>,
    port: u16,
}

impl NodeEndpoint {
    /// Create an endpoint. Host names longer than [`MAX_HOST_LEN`] are truncated.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: truncated(host),
            port,
        }
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Description of an object the node accepted through `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedObject {
    /// Name the node recorded for the object.
    pub name: String<MAX_NAME_LEN>,
    /// Content identifier of the object.
    pub hash: String<MAX_HASH_LEN>,
    /// Size reported by the node, in bytes.
    pub size: u32,
}

/// Structured error returned by the node, e.g. `{"Code":0,"Type":"error","Message":"..."}`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Node error code.
    pub code: i32,
    /// Node error type, usually `"error"`.
    pub error_type: String<MAX_ERROR_TYPE_LEN>,
    /// Human readable message.
    pub message: String<MAX_MESSAGE_LEN>,
}

impl ErrorEnvelope {
    /// Create an envelope, truncating fields that exceed their capacity.
    pub fn new(code: i32, error_type: &str, message: &str) -> Self {
        Self {
            code,
            error_type: truncated(error_type),
            message: truncated(message),
        }
    }

    /// Whether this is the zeroed "no error" envelope.
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.error_type.is_empty() && self.message.is_empty()
    }

    /// Reset to the zeroed state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Errors returned by IPFS client operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Connecting, writing or reading failed, or a read timed out.
    Transport(NetworkError),
    /// The response could not be decoded into the expected shape.
    InvalidResponse,
    /// The node answered with a structured error.
    Node(ErrorEnvelope),
    /// A request or response did not fit the fixed buffers.
    BufferOverflow,
    /// The upload source failed or delivered fewer bytes than its size.
    SourceRead,
    /// No multipart boundary could be found that is absent from the upload.
    BoundaryCollision,
}

impl From<NetworkError> for Error {
    fn from(error: NetworkError) -> Self {
        Error::Transport(error)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorEnvelope {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ErrorEnvelope {{ code: {=i32}, type: {=str}, message: {=str} }}",
            self.code,
            self.error_type.as_str(),
            self.message.as_str()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Transport(e) => defmt::write!(f, "Transport({})", e),
            Error::InvalidResponse => defmt::write!(f, "InvalidResponse"),
            Error::Node(envelope) => defmt::write!(f, "Node({})", envelope),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::SourceRead => defmt::write!(f, "SourceRead"),
            Error::BoundaryCollision => defmt::write!(f, "BoundaryCollision"),
        }
    }
}

/// Copy `value` into a bounded string, cutting it at the last character
/// boundary that fits.
pub fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut end = value.len().min(N);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Cannot fail: `end` never exceeds the capacity.
    let _ = out.push_str(&value[..end]);
    out
}
