//! # libipfs - IPFS client for embedded devices
//!
//! A small client for the HTTP RPC API (`/api/v0`) of an IPFS node, designed
//! for microcontrollers and other `no_std` targets. Every buffer has a fixed,
//! compile-time capacity and no heap allocation takes place.
//!
//! ## Features
//!
//! - **add**: upload in-memory text or a file read through [`FileSource`](network::application::ipfs::FileSource)
//!   as a `multipart/form-data` request, streamed without buffering the payload
//! - **cat**: fetch an object by CID, optionally capped to a maximum length
//! - **files/cp**: copy objects into the node's mutable file system
//! - **Generic commands**: any bodyless RPC command with arguments and options
//! - **Node errors**: the node's `{"Message","Code","Type"}` envelope is
//!   surfaced through the error type and kept as the client's last error
//!
//! ## Usage
//!
//! The application supplies the transport by implementing the traits in
//! [`network`] over its TCP stack:
//!
//! ```rust,no_run
//! use libipfs::network::application::ipfs::{Client, NodeEndpoint};
//! # use libipfs::network::{Close, Connect, Connection, Read, Write};
//! # struct Tcp;
//! # impl Read for Tcp {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Tcp {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for Tcp {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Connection for Tcp {
//! #     fn is_connected(&self) -> bool { true }
//! #     fn set_read_timeout(&mut self, _timeout_ms: u32) {}
//! # }
//! # struct Stack;
//! # impl Connect for Stack {
//! #     type Connection = Tcp;
//! #     type Error = ();
//! #     fn connect(&mut self, _host: &str, _port: u16) -> Result<Tcp, ()> { Ok(Tcp) }
//! # }
//!
//! let mut client = Client::new(Stack, NodeEndpoint::new("192.168.1.10", 5001));
//!
//! match client.add_text("reading.txt", "23.5") {
//!     Ok(added) => {
//!         let _cid = added.hash;
//!     }
//!     Err(_) => {
//!         let _node_message = client.last_error().message.as_str();
//!     }
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

/// Network abstraction layer and the protocols built on it.
///
/// Holds the connection traits the application implements, the HTTP/1.1
/// building blocks and the IPFS client.
pub mod network;
