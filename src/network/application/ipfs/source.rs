//! Upload payloads.

use super::{MAX_NAME_LEN, truncated};
use heapless::String;

/// Random-access byte source for file uploads.
///
/// The size must be known up front, since it goes into the request's
/// `Content-Length` before any payload byte is sent.
pub trait FileSource {
    /// Error type for reads.
    type Error: core::fmt::Debug;

    /// Total number of bytes in the source.
    fn size(&self) -> u32;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read. Returning fewer bytes than requested
    /// before the end of the source is treated as a failed read.
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl FileSource for &[u8] {
    type Error = core::convert::Infallible;

    fn size(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let start = (offset as usize).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

/// How the node should interpret the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContentKind {
    /// `text/plain`
    Text,
    /// `application/octet-stream`
    Binary,
}

impl ContentKind {
    /// MIME type sent in the part header.
    pub fn content_type(self) -> &'static str {
        match self {
            ContentKind::Text => "text/plain",
            ContentKind::Binary => "application/octet-stream",
        }
    }
}

/// Bytes carried by an upload.
#[derive(Debug)]
pub enum Payload<'a, F: FileSource> {
    /// In-memory text.
    Text(&'a [u8]),
    /// A file read through [`FileSource`].
    File(&'a mut F),
}

impl<F: FileSource> Payload<'_, F> {
    /// Content kind implied by the payload variant.
    pub fn kind(&self) -> ContentKind {
        match self {
            Payload::Text(_) => ContentKind::Text,
            Payload::File(_) => ContentKind::Binary,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(data) => data.len(),
            Payload::File(file) => file.size() as usize,
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single-file upload: submitted filename plus payload.
#[derive(Debug)]
pub struct Upload<'a, F: FileSource> {
    filename: String<MAX_NAME_LEN>,
    payload: Payload<'a, F>,
}

impl<'a, F: FileSource> Upload<'a, F> {
    /// Build an upload. Filenames longer than [`MAX_NAME_LEN`] bytes are truncated.
    pub fn new(filename: &str, payload: Payload<'a, F>) -> Self {
        Self {
            filename: truncated(filename),
            payload,
        }
    }

    /// Upload the contents of `file` as binary data.
    pub fn file(filename: &str, file: &'a mut F) -> Self {
        Self::new(filename, Payload::File(file))
    }

    /// Submitted filename.
    pub fn filename(&self) -> &str {
        self.filename.as_str()
    }

    /// Upload payload.
    pub fn payload(&self) -> &Payload<'a, F> {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Payload<'a, F> {
        &mut self.payload
    }
}

impl<'a> Upload<'a, &'static [u8]> {
    /// Upload `data` as `text/plain`.
    pub fn text(filename: &str, data: &'a str) -> Self {
        Self::new(filename, Payload::Text(data.as_bytes()))
    }
}
