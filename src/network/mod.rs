//! A network abstraction layer for embedded systems
//!
//! The IPFS client never opens sockets itself. Instead it talks to the node
//! through the small set of traits defined here, which the application
//! implements on top of whatever stack the device runs (smoltcp, a modem AT
//! command set, `std::net` on Linux boards, ...).
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// Application layer protocols built on the connection traits
pub mod application;

use error::Error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connect, Connection, Read, Write};
}

pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection.
    ///
    /// `Ok(0)` means the peer closed the stream. Implementations must return
    /// an error once the configured read timeout expires instead of blocking
    /// forever.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {
    /// Whether the stream is still usable.
    fn is_connected(&self) -> bool;

    /// Bound the time a single `read` may wait for data, in milliseconds.
    fn set_read_timeout(&mut self, timeout_ms: u32);
}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection to `host:port`
    fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection, Self::Error>;
}

/// Write the whole buffer, retrying short writes.
///
/// A write that accepts zero bytes is reported as [`Error::WriteError`].
pub fn write_all<W: Write + ?Sized>(writer: &mut W, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => return Err(Error::WriteError),
            Ok(n) => buf = &buf[n.min(buf.len())..],
            Err(_) => return Err(Error::WriteError),
        }
    }
    Ok(())
}
