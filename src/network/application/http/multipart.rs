//! `multipart/form-data` framing for single-file uploads.
//!
//! A body produced from a [`Framing`] looks like this:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="file"; filename="<name>"\r\n
//! Content-Type: <type>\r\n
//! \r\n
//! <payload>
//! \r\n--<boundary>--\r\n
//! ```
//!
//! The opening and closing sections are produced by the same routines whether
//! they are being counted or emitted, so [`Framing::content_length`] always
//! agrees with the bytes that actually go out on the wire.

use super::find_slice;
use super::request::Counter;
use core::fmt::{self, Write};
use heapless::String;

/// Capacity of a boundary token.
pub const BOUNDARY_CAPACITY: usize = 40;

const BOUNDARY_PREFIX: &str = "libipfs-";

/// A multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String<BOUNDARY_CAPACITY>);

impl Boundary {
    /// Derive a token from a request `seed` and an `attempt` counter.
    ///
    /// Different attempts give different tokens, which lets the caller move
    /// on to a new candidate when one collides with the content.
    pub fn derive(seed: u32, attempt: u32) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(&attempt.to_le_bytes());

        let mut token = String::new();
        // 8 + 16 hex digits always fit in BOUNDARY_CAPACITY.
        let _ = write!(
            token,
            "{}{:08x}{:08x}",
            BOUNDARY_PREFIX,
            seed,
            hasher.finalize()
        );
        Self(token)
    }

    /// The token without the leading dashes.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the token appears anywhere in `haystack`.
    pub fn occurs_in(&self, haystack: &[u8]) -> bool {
        find_slice(haystack, self.0.as_bytes()).is_some()
    }
}

/// Describes the single file part of an upload.
#[derive(Debug, Clone, Copy)]
pub struct FilePart<'a> {
    /// Form field name.
    pub field: &'a str,
    /// Submitted filename.
    pub filename: &'a str,
    /// Content type of the payload.
    pub content_type: &'a str,
}

/// Opening and closing sections around one file part.
#[derive(Debug, Clone, Copy)]
pub struct Framing<'a> {
    boundary: &'a Boundary,
    part: FilePart<'a>,
}

impl<'a> Framing<'a> {
    /// Frame `part` with `boundary`.
    pub fn new(boundary: &'a Boundary, part: FilePart<'a>) -> Self {
        Self { boundary, part }
    }

    /// Write the opening boundary and the part header.
    pub fn write_opening<W: Write>(&self, w: &mut W) -> fmt::Result {
        write!(w, "--{}\r\n", self.boundary.as_str())?;
        write!(
            w,
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            QuotedParam(self.part.field),
            QuotedParam(self.part.filename)
        )?;
        write!(w, "Content-Type: {}\r\n\r\n", self.part.content_type)
    }

    /// Write the closing boundary.
    pub fn write_closing<W: Write>(&self, w: &mut W) -> fmt::Result {
        write!(w, "\r\n--{}--\r\n", self.boundary.as_str())
    }

    /// Length of the opening boundary plus the part header.
    pub fn opening_len(&self) -> usize {
        let mut counter = Counter::default();
        let _ = self.write_opening(&mut counter);
        counter.0
    }

    /// Length of the closing boundary.
    pub fn closing_len(&self) -> usize {
        let mut counter = Counter::default();
        let _ = self.write_closing(&mut counter);
        counter.0
    }

    /// Exact body length for a payload of `payload_len` bytes.
    pub fn content_length(&self, payload_len: usize) -> usize {
        self.opening_len() + payload_len + self.closing_len()
    }
}

/// Escapes a value placed inside a quoted header parameter.
///
/// `"` and `\` are backslash-escaped as quoted-string pairs, which the
/// node's parameter parser decodes back to the original characters. CR and
/// LF cannot appear in a header and are percent-encoded instead.
#[derive(Debug, Clone, Copy)]
pub struct QuotedParam<'a>(pub &'a str);

impl fmt::Display for QuotedParam<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\r' => f.write_str("%0D")?,
                '\n' => f.write_str("%0A")?,
                _ => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
