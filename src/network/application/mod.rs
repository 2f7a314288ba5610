//! # Application Layer Protocols
//!
//! Application layer (OSI Layer 7) protocols built on the core network traits.
//!
//! ## Available Protocols
//!
//! - **[`http`]**: HTTP/1.1 request building and line-oriented response reading
//! - **[`ipfs`]**: client for the `/api/v0` RPC API of an IPFS node
//!
//! ## Design Principles
//!
//! - **Connection Agnostic**: Work with any type implementing [`Connection`](crate::network::Connection)
//! - **No-std Compatible**: Designed for embedded systems without heap allocation
//! - **Resource Conscious**: Use fixed-size buffers and minimal memory

/// HTTP/1.1 building blocks.
///
/// Request heads, `multipart/form-data` framing and response reading, all on
/// fixed-capacity buffers.
pub mod http;

/// IPFS RPC client.
///
/// Uploads text and file payloads, fetches objects by CID and runs
/// management commands against an IPFS node.
pub mod ipfs;
