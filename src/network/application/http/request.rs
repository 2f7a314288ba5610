//! HTTP/1.1 request head construction.
//!
//! Requests are assembled into a fixed-capacity [`heapless::String`] so they
//! can be handed to the connection in a single write. Every value that ends
//! up inside the request target goes through [`QueryValue`], which
//! percent-encodes it, so arguments containing `&`, `=`, spaces or `%`
//! cannot change the meaning of the query string.

use core::fmt::{self, Write};
use heapless::String;

/// Errors raised while assembling a request head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The request did not fit into the fixed request buffer.
    Overflow,
    /// A query parameter was added after the request line was closed.
    QueryAfterHeaders,
}

impl From<fmt::Error> for BuildError {
    fn from(_: fmt::Error) -> Self {
        BuildError::Overflow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Target { has_query: bool },
    Headers,
}

/// Incremental builder for a `POST` request head.
///
/// The request target is written first, query parameters may be appended
/// until the first header is added, and [`RequestBuilder::finish`] writes the
/// blank line that ends the head.
///
/// ```rust
/// use libipfs::network::application::http::request::RequestBuilder;
/// use heapless::String;
///
/// let mut head: String<256> = String::new();
/// let mut request = RequestBuilder::post(&mut head, "/api/v0/cat").unwrap();
/// request.query("arg", "QmHash").unwrap();
/// request.header("Content-Length", 0).unwrap();
/// request.finish().unwrap();
///
/// assert!(head.starts_with("POST /api/v0/cat?arg=QmHash HTTP/1.1\r\n"));
/// assert!(head.ends_with("Content-Length: 0\r\n\r\n"));
/// ```
#[derive(Debug)]
pub struct RequestBuilder<'a, const N: usize> {
    buf: &'a mut String<N>,
    section: Section,
}

impl<'a, const N: usize> RequestBuilder<'a, N> {
    /// Start a `POST` request for `path`, appending to `buf`.
    pub fn post(buf: &'a mut String<N>, path: impl fmt::Display) -> Result<Self, BuildError> {
        write!(buf, "POST {}", path)?;
        Ok(Self {
            buf,
            section: Section::Target { has_query: false },
        })
    }

    /// Append `key=value` to the query string, percent-encoding the value.
    ///
    /// Query parameters can only be added before the first header.
    pub fn query(&mut self, key: &str, value: &str) -> Result<(), BuildError> {
        let Section::Target { has_query } = self.section else {
            return Err(BuildError::QueryAfterHeaders);
        };
        let separator = if has_query { '&' } else { '?' };
        write!(self.buf, "{}{}={}", separator, key, QueryValue(value))?;
        self.section = Section::Target { has_query: true };
        Ok(())
    }

    /// Append a header line.
    pub fn header(&mut self, name: &str, value: impl fmt::Display) -> Result<(), BuildError> {
        self.end_request_line()?;
        write!(self.buf, "{}: {}\r\n", name, value)?;
        Ok(())
    }

    /// Terminate the head with the empty line.
    pub fn finish(mut self) -> Result<(), BuildError> {
        self.end_request_line()?;
        self.buf.push_str("\r\n").map_err(|_| BuildError::Overflow)
    }

    fn end_request_line(&mut self) -> Result<(), BuildError> {
        if let Section::Target { .. } = self.section {
            self.buf.push_str(" HTTP/1.1\r\n").map_err(|_| BuildError::Overflow)?;
            self.section = Section::Headers;
        }
        Ok(())
    }
}

/// Percent-encodes everything except RFC 3986 unreserved characters and `/`.
#[derive(Debug, Clone, Copy)]
pub struct QueryValue<'a>(pub &'a str);

impl fmt::Display for QueryValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0.as_bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                    f.write_char(byte as char)?
                }
                _ => write!(f, "%{:02X}", byte)?,
            }
        }
        Ok(())
    }
}

/// A [`fmt::Write`] sink that only counts the bytes written to it.
///
/// Used to learn the exact length of formatted output before emitting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counter(pub usize);

impl fmt::Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}
