//! Request emission for the node's RPC API.
//!
//! `add` requests carry a single `multipart/form-data` part and are streamed
//! head first, then payload, then closing boundary. Every other command is a
//! bodyless `POST` whose arguments travel in the query string.

use super::client::Options;
use super::source::{FileSource, Payload, Upload};
use super::{API_PATH, Error, NodeEndpoint, REQUEST_CAPACITY};
use crate::network::Write;
use crate::network::application::http::find_slice;
use crate::network::application::http::multipart::{BOUNDARY_CAPACITY, Boundary, FilePart, Framing};
use crate::network::application::http::request::{BuildError, RequestBuilder};
use crate::network::error::Error as NetworkError;
use crate::network::write_all;
use heapless::String;

/// Number of boundary candidates tried before giving up.
pub const MAX_BOUNDARY_ATTEMPTS: u32 = 16;

const UPLOAD_CHUNK: usize = 256;
const SCAN_CHUNK: usize = 256;
const CLOSING_CAPACITY: usize = BOUNDARY_CAPACITY + 8;

/// A bodyless RPC command, e.g. `/files/cp` with two arguments.
///
/// ```rust
/// use libipfs::network::application::ipfs::Command;
///
/// let args = ["/ipfs/QmHash", "/backup/file.txt"];
/// let command = Command::new("/files/cp").args(&args);
/// assert_eq!(command.path, "/files/cp");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    /// Command path below `/api/v0`, starting with `/`.
    pub path: &'a str,
    /// Positional arguments, each sent as `arg=<value>`.
    pub args: &'a [&'a str],
    /// Named options, sent as `<key>=<value>` after the arguments.
    pub options: &'a [(&'a str, &'a str)],
}

impl<'a> Command<'a> {
    /// A command without arguments or options.
    pub const fn new(path: &'a str) -> Self {
        Self {
            path,
            args: &[],
            options: &[],
        }
    }

    /// Set the positional arguments.
    pub const fn args(mut self, args: &'a [&'a str]) -> Self {
        self.args = args;
        self
    }

    /// Set the named options.
    pub const fn options(mut self, options: &'a [(&'a str, &'a str)]) -> Self {
        self.options = options;
        self
    }
}

fn overflow(_: BuildError) -> Error {
    Error::BufferOverflow
}

fn common_headers<const N: usize>(
    request: &mut RequestBuilder<'_, N>,
    endpoint: &NodeEndpoint,
    options: &Options,
) -> Result<(), BuildError> {
    request.header(
        "Host",
        format_args!("{}:{}", endpoint.host(), endpoint.port()),
    )?;
    request.header("User-Agent", options.user_agent)?;
    request.header("Connection", "close")
}

/// Build the head of a bodyless command request into `head`.
pub fn command_head<const N: usize>(
    head: &mut String<N>,
    endpoint: &NodeEndpoint,
    options: &Options,
    command: &Command<'_>,
) -> Result<(), Error> {
    let mut request =
        RequestBuilder::post(head, format_args!("{}{}", API_PATH, command.path)).map_err(overflow)?;
    for arg in command.args {
        request.query("arg", arg).map_err(overflow)?;
    }
    for &(key, value) in command.options {
        request.query(key, value).map_err(overflow)?;
    }
    common_headers(&mut request, endpoint, options).map_err(overflow)?;
    request.header("Content-Length", 0).map_err(overflow)?;
    request.finish().map_err(overflow)
}

pub(crate) fn send_command<C: Write + ?Sized>(
    conn: &mut C,
    endpoint: &NodeEndpoint,
    options: &Options,
    command: &Command<'_>,
) -> Result<(), Error> {
    let mut head: String<REQUEST_CAPACITY> = String::new();
    command_head(&mut head, endpoint, options, command)?;
    debug!("POST {}{} ({} bytes)", API_PATH, command.path, head.len());

    write_all(conn, head.as_bytes())?;
    conn.flush().map_err(|_| NetworkError::WriteError)?;
    Ok(())
}

/// Pick a boundary that occurs neither in the filename nor in the payload.
///
/// Candidates are derived from a CRC-32 over the filename and payload size,
/// so the same upload always gets the same boundary.
pub fn choose_boundary<F: FileSource>(upload: &mut Upload<'_, F>) -> Result<Boundary, Error> {
    let seed = {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(upload.filename().as_bytes());
        hasher.update(&(upload.payload().len() as u64).to_le_bytes());
        hasher.finalize()
    };

    for attempt in 0..MAX_BOUNDARY_ATTEMPTS {
        let boundary = Boundary::derive(seed, attempt);
        if boundary.occurs_in(upload.filename().as_bytes()) {
            continue;
        }
        let collides = match upload.payload_mut() {
            Payload::Text(data) => boundary.occurs_in(*data),
            Payload::File(file) => file_contains(&mut **file, boundary.as_str().as_bytes())?,
        };
        if !collides {
            return Ok(boundary);
        }
        debug!("boundary collision on attempt {}", attempt);
    }

    warn!("no collision-free boundary after {} attempts", MAX_BOUNDARY_ATTEMPTS);
    Err(Error::BoundaryCollision)
}

/// Scan `file` for `needle`, carrying a tail across chunks so matches that
/// straddle two reads are found.
fn file_contains<F: FileSource + ?Sized>(file: &mut F, needle: &[u8]) -> Result<bool, Error> {
    let mut window = [0u8; SCAN_CHUNK + BOUNDARY_CAPACITY];
    let keep = needle.len().saturating_sub(1).min(BOUNDARY_CAPACITY);
    let size = file.size();
    let mut carried = 0usize;
    let mut offset = 0u32;

    while offset < size {
        let want = ((size - offset) as usize).min(SCAN_CHUNK);
        let n = file
            .read_at(offset, &mut window[carried..carried + want])
            .map_err(|_| Error::SourceRead)?;
        if n == 0 {
            return Err(Error::SourceRead);
        }
        let filled = carried + n.min(want);
        if find_slice(&window[..filled], needle).is_some() {
            return Ok(true);
        }
        carried = filled.min(keep);
        window.copy_within(filled - carried..filled, 0);
        offset += n.min(want) as u32;
    }
    Ok(false)
}

/// Stream an `add` request: head and opening section, payload, closing section.
///
/// Returns the `Content-Length` that was announced.
pub(crate) fn send_add<C, F>(
    conn: &mut C,
    endpoint: &NodeEndpoint,
    options: &Options,
    upload: &mut Upload<'_, F>,
    boundary: &Boundary,
) -> Result<usize, Error>
where
    C: Write + ?Sized,
    F: FileSource,
{
    let payload_len = upload.payload().len();
    let framing = Framing::new(
        boundary,
        FilePart {
            field: "file",
            filename: upload.filename(),
            content_type: upload.payload().kind().content_type(),
        },
    );
    let content_length = framing.content_length(payload_len);

    let mut head: String<REQUEST_CAPACITY> = String::new();
    let mut request =
        RequestBuilder::post(&mut head, format_args!("{}/add", API_PATH)).map_err(overflow)?;
    common_headers(&mut request, endpoint, options).map_err(overflow)?;
    request
        .header(
            "Content-Type",
            format_args!("multipart/form-data; boundary={}", boundary.as_str()),
        )
        .map_err(overflow)?;
    request
        .header("Content-Length", content_length)
        .map_err(overflow)?;
    request.finish().map_err(overflow)?;
    framing
        .write_opening(&mut head)
        .map_err(|_| Error::BufferOverflow)?;

    let mut closing: String<CLOSING_CAPACITY> = String::new();
    framing
        .write_closing(&mut closing)
        .map_err(|_| Error::BufferOverflow)?;

    debug!(
        "POST {}/add: {} payload bytes, content length {}",
        API_PATH, payload_len, content_length
    );

    write_all(conn, head.as_bytes())?;
    write_payload(conn, upload.payload_mut())?;
    write_all(conn, closing.as_bytes())?;
    conn.flush().map_err(|_| NetworkError::WriteError)?;
    Ok(content_length)
}

fn write_payload<C: Write + ?Sized, F: FileSource>(
    conn: &mut C,
    payload: &mut Payload<'_, F>,
) -> Result<(), Error> {
    match payload {
        Payload::Text(data) => write_all(conn, *data)?,
        Payload::File(file) => {
            let size = file.size();
            let mut chunk = [0u8; UPLOAD_CHUNK];
            let mut offset = 0u32;
            while offset < size {
                let want = ((size - offset) as usize).min(UPLOAD_CHUNK);
                let n = file
                    .read_at(offset, &mut chunk[..want])
                    .map_err(|_| Error::SourceRead)?;
                if n < want {
                    warn!("upload source short read at offset {}", offset);
                    return Err(Error::SourceRead);
                }
                write_all(conn, &chunk[..want])?;
                offset += want as u32;
            }
        }
    }
    Ok(())
}
