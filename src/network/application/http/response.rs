//! Line-oriented HTTP/1.1 response reading.
//!
//! [`LineReader`] pulls bytes from a connection through a small fixed window
//! and hands them out one line at a time, or as a raw body once the head has
//! been consumed. Nothing here ever buffers more than a single line, which
//! keeps streaming responses usable on devices with a few kilobytes of RAM.

use crate::network::Read;
use crate::network::error::Error;
use heapless::Vec;

/// Capacity of a single buffered line. Longer lines are truncated.
pub const LINE_CAPACITY: usize = 512;

const READ_WINDOW: usize = 128;

/// Status and framing information collected from a response head.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    /// Numeric status from the `HTTP/...` status line, if one was seen.
    pub status: Option<u16>,
    /// Value of the `Content-Length` header.
    pub content_length: Option<usize>,
    /// Whether the body uses `Transfer-Encoding: chunked`.
    pub chunked: bool,
}

impl ResponseHead {
    /// Fold one head line into the collected state.
    pub fn apply(&mut self, line: &str) {
        if line.starts_with("HTTP/") {
            self.status = parse_status_line(line);
            return;
        }

        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("Content-Length") {
            self.content_length = value.parse::<usize>().ok();
        } else if name.eq_ignore_ascii_case("Transfer-Encoding") {
            self.chunked = value
                .split(',')
                .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// Extract the status code from a line such as `HTTP/1.1 200 OK`.
pub fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    parts.next().filter(|version| version.starts_with("HTTP/"))?;
    parts.next()?.parse::<u16>().ok()
}

/// Result of reading a response body into caller storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    /// Number of bytes stored.
    pub len: usize,
    /// The response carried more bytes than the storage could hold.
    pub truncated: bool,
}

/// Buffered line reader over a [`Read`] implementation.
#[derive(Debug)]
pub struct LineReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    window: [u8; READ_WINDOW],
    pos: usize,
    len: usize,
}

impl<'a, R: Read + ?Sized> LineReader<'a, R> {
    /// Wrap a connection.
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            window: [0; READ_WINDOW],
            pos: 0,
            len: 0,
        }
    }

    /// Make sure unread bytes are buffered. Returns `false` at end of stream.
    fn fill(&mut self) -> Result<bool, Error> {
        if self.pos < self.len {
            return Ok(true);
        }
        let n = self
            .inner
            .read(&mut self.window)
            .map_err(|_| Error::ReadError)?;
        self.pos = 0;
        self.len = n.min(READ_WINDOW);
        Ok(self.len > 0)
    }

    /// Read the next line into `line`, without its `\n` or `\r\n` terminator.
    ///
    /// Returns `Ok(None)` when the stream ended before any byte of a new line
    /// arrived. Otherwise returns the full length of the line; if it is larger
    /// than `N`, only the first `N` bytes were kept.
    pub fn read_line<const N: usize>(
        &mut self,
        line: &mut Vec<u8, N>,
    ) -> Result<Option<usize>, Error> {
        line.clear();
        let mut total = 0usize;
        let mut last = None;
        let mut terminated = false;

        while !terminated {
            if !self.fill()? {
                if total == 0 {
                    return Ok(None);
                }
                break;
            }

            let start = self.pos;
            let pending = &self.window[start..self.len];
            let newline = pending.iter().position(|&b| b == b'\n');
            let take = newline.unwrap_or(pending.len());

            let room = N - line.len();
            // Cannot fail: the slice is clamped to the remaining capacity.
            let _ = line.extend_from_slice(&self.window[start..start + take.min(room)]);
            if take > 0 {
                last = Some(self.window[start + take - 1]);
            }
            total += take;
            self.pos = start + take;

            if newline.is_some() {
                self.pos += 1;
                terminated = true;
            }
        }

        if last == Some(b'\r') {
            total -= 1;
            if line.len() > total {
                line.pop();
            }
        }
        Ok(Some(total))
    }

    /// Consume the response head up to and including the blank line.
    ///
    /// Returns `Ok(None)` if the stream ended before the head was complete.
    pub fn read_head(&mut self) -> Result<Option<ResponseHead>, Error> {
        let mut head = ResponseHead::default();
        let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();

        loop {
            if self.read_line(&mut line)?.is_none() {
                return Ok(None);
            }
            if line.is_empty() {
                return Ok(Some(head));
            }
            if let Ok(text) = core::str::from_utf8(&line) {
                head.apply(text);
            }
        }
    }

    /// Read the body into `out`.
    ///
    /// With a known `content_length` exactly that many bytes are expected and
    /// an early end of stream is reported as [`Error::ConnectionClosed`].
    /// Without one the body extends to the end of the stream.
    pub fn read_body(
        &mut self,
        out: &mut [u8],
        content_length: Option<usize>,
    ) -> Result<Body, Error> {
        let target = content_length.unwrap_or(usize::MAX).min(out.len());
        let mut len = 0;

        while len < target {
            if !self.fill()? {
                if content_length.is_some() {
                    return Err(Error::ConnectionClosed);
                }
                return Ok(Body {
                    len,
                    truncated: false,
                });
            }
            let n = (self.len - self.pos).min(target - len);
            out[len..len + n].copy_from_slice(&self.window[self.pos..self.pos + n]);
            self.pos += n;
            len += n;
        }

        let truncated = match content_length {
            Some(expected) => expected > len,
            None => self.fill()?,
        };
        Ok(Body { len, truncated })
    }
}
