//! IPFS client façade.
//!
//! ```rust,ignore
//! use libipfs::network::application::ipfs::{Client, NodeEndpoint};
//!
//! let mut client = Client::new(connector, NodeEndpoint::new("192.168.1.10", 5001));
//! let added = client.add_text("hello.txt", "hello")?;
//! let text = client.cat(added.hash.as_str(), 0)?;
//! ```

use super::request::{Command, choose_boundary, send_add, send_command};
use super::response::{read_add_response, read_command_response};
use super::source::{FileSource, Upload};
use super::{AddedObject, CAT_CAPACITY, Error, ErrorEnvelope, NodeEndpoint, truncated};
use crate::network::error::Error as NetworkError;
use crate::network::{Close, Connect, Connection};
use core::fmt::Write as _;
use heapless::String;

/// Client configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Read timeout applied to every connection before a request is sent.
    pub read_timeout_ms: u32,
    /// `User-Agent` header value.
    pub user_agent: &'static str,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            read_timeout_ms: 5000,
            user_agent: concat!("libipfs/", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// IPFS RPC client.
///
/// `N` opens connections to the node. A connection handed in through
/// [`Client::attach`] is used by the next operation if it still reports
/// being connected; otherwise a fresh one is opened. Either way the
/// connection is closed when the operation returns.
pub struct Client<N: Connect> {
    connector: N,
    endpoint: NodeEndpoint,
    options: Options,
    attached: Option<N::Connection>,
    last_error: ErrorEnvelope,
}

impl<N: Connect> core::fmt::Debug for Client<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .field("attached", &self.attached.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl<N: Connect> Client<N> {
    /// Create a client with default [`Options`].
    pub fn new(connector: N, endpoint: NodeEndpoint) -> Self {
        Self::with_options(connector, endpoint, Options::default())
    }

    /// Create a client with explicit options.
    pub fn with_options(connector: N, endpoint: NodeEndpoint, options: Options) -> Self {
        Self {
            connector,
            endpoint,
            options,
            attached: None,
            last_error: ErrorEnvelope::default(),
        }
    }

    /// Point the client at another node. An attached connection is closed,
    /// since it belongs to the previous node.
    pub fn configure(&mut self, endpoint: NodeEndpoint) {
        self.release_attached();
        self.endpoint = endpoint;
    }

    /// Hand the client an already open connection for the next operation.
    ///
    /// A previously attached connection that was never used is closed.
    pub fn attach(&mut self, connection: N::Connection) {
        self.release_attached();
        self.attached = Some(connection);
    }

    /// Current node endpoint.
    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    /// Current options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Error envelope of the most recent operation, zeroed if it did not
    /// fail with a node error.
    pub fn last_error(&self) -> &ErrorEnvelope {
        &self.last_error
    }

    /// Connector used to open connections.
    pub fn connector(&self) -> &N {
        &self.connector
    }

    /// Mutable access to the connector.
    pub fn connector_mut(&mut self) -> &mut N {
        &mut self.connector
    }

    /// Upload a single file and return what the node recorded for it.
    pub fn add<F: FileSource>(&mut self, mut upload: Upload<'_, F>) -> Result<AddedObject, Error> {
        self.last_error.clear();
        let boundary = choose_boundary(&mut upload)?;
        let added = self.exchange(|conn, endpoint, options| {
            send_add(conn, endpoint, options, &mut upload, &boundary)?;
            read_add_response(conn)
        })?;
        info!("added {} as {}", added.name.as_str(), added.hash.as_str());
        Ok(added)
    }

    /// Upload `data` as a `text/plain` file named `filename`.
    ///
    /// `"` and `\` in `filename` reach the node unchanged. CR and LF are sent
    /// percent-encoded and stored that way.
    pub fn add_text(&mut self, filename: &str, data: &str) -> Result<AddedObject, Error> {
        self.add(Upload::text(filename, data))
    }

    /// Upload the contents of `file` as `application/octet-stream`.
    pub fn add_file<F: FileSource>(
        &mut self,
        filename: &str,
        file: &mut F,
    ) -> Result<AddedObject, Error> {
        self.add(Upload::file(filename, file))
    }

    /// Fetch the object `cid` as text.
    ///
    /// With `max_length > 0` at most that many bytes are requested. Bodies
    /// larger than [`CAT_CAPACITY`] fail with [`Error::BufferOverflow`].
    pub fn cat(&mut self, cid: &str, max_length: usize) -> Result<String<CAT_CAPACITY>, Error> {
        let mut buf = [0u8; CAT_CAPACITY];
        let len = self.cat_into(cid, max_length, &mut buf)?;
        let text = match core::str::from_utf8(&buf[..len]) {
            Ok(text) => text,
            // A length cap may cut a multi-byte character in half.
            Err(e) if max_length > 0 && e.error_len().is_none() => {
                core::str::from_utf8(&buf[..e.valid_up_to()]).map_err(|_| Error::InvalidResponse)?
            }
            Err(_) => return Err(Error::InvalidResponse),
        };
        Ok(truncated(text))
    }

    /// Fetch the object `cid` into `out` and return the number of bytes stored.
    ///
    /// With `max_length > 0` at most `max_length` bytes are requested and
    /// stored. Bodies larger than `out` fail with [`Error::BufferOverflow`].
    pub fn cat_into(&mut self, cid: &str, max_length: usize, out: &mut [u8]) -> Result<usize, Error> {
        self.last_error.clear();
        let mut length: String<20> = String::new();
        // usize has at most 20 decimal digits.
        let _ = write!(length, "{}", max_length);
        let length_option = [("length", length.as_str())];
        let args = [cid];
        let options: &[(&str, &str)] = if max_length > 0 {
            &length_option
        } else {
            &[]
        };
        let command = Command::new("/cat").args(&args).options(options);

        let capped = max_length > 0 && max_length <= out.len();
        let limit = if capped { max_length } else { out.len() };
        let body = self.exchange(|conn, endpoint, options| {
            send_command(conn, endpoint, options, &command)?;
            read_command_response(conn, Some(&mut out[..limit]))
        })?;

        if body.truncated && !capped {
            warn!("cat body exceeds {} bytes", out.len());
            return Err(Error::BufferOverflow);
        }
        Ok(body.len)
    }

    /// Copy `from` (an `/ipfs/...` path or MFS path) to the MFS path `to`.
    pub fn files_cp(&mut self, from: &str, to: &str) -> Result<(), Error> {
        self.last_error.clear();
        let args = [from, to];
        let command = Command::new("/files/cp").args(&args);
        self.exchange(|conn, endpoint, options| {
            send_command(conn, endpoint, options, &command)?;
            read_command_response(conn, None).map(|_| ())
        })
    }

    /// Run any bodyless command and copy its `200` body into `out`.
    ///
    /// Returns the number of bytes stored. Bodies larger than `out` fail with
    /// [`Error::BufferOverflow`].
    pub fn command(&mut self, command: &Command<'_>, out: &mut [u8]) -> Result<usize, Error> {
        self.last_error.clear();
        let body = self.exchange(|conn, endpoint, options| {
            send_command(conn, endpoint, options, command)?;
            read_command_response(conn, Some(out))
        })?;
        if body.truncated {
            return Err(Error::BufferOverflow);
        }
        Ok(body.len)
    }

    fn release_attached(&mut self) {
        if let Some(connection) = self.attached.take() {
            if connection.close().is_err() {
                warn!("failed to close attached connection");
            }
        }
    }

    fn open(&mut self) -> Result<N::Connection, Error> {
        if let Some(connection) = self.attached.take() {
            if connection.is_connected() {
                trace!("reusing attached connection");
                return Ok(connection);
            }
            debug!("attached connection is gone, reconnecting");
            let _ = connection.close();
        }

        if self.endpoint.host().is_empty() {
            return Err(Error::Transport(NetworkError::InvalidAddress));
        }
        debug!(
            "connecting to {}:{}",
            self.endpoint.host(),
            self.endpoint.port()
        );
        self.connector
            .connect(self.endpoint.host(), self.endpoint.port())
            .map_err(|_| {
                warn!(
                    "connection to {}:{} refused",
                    self.endpoint.host(),
                    self.endpoint.port()
                );
                Error::Transport(NetworkError::ConnectionRefused)
            })
    }

    /// Run one request/response exchange on a fresh or attached connection,
    /// closing it afterwards and recording node errors.
    fn exchange<T>(
        &mut self,
        op: impl FnOnce(&mut N::Connection, &NodeEndpoint, &Options) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut connection = self.open()?;
        connection.set_read_timeout(self.options.read_timeout_ms);

        let result = op(&mut connection, &self.endpoint, &self.options);

        if connection.close().is_err() {
            warn!("failed to close connection");
        }
        if let Err(Error::Node(envelope)) = &result {
            self.last_error = envelope.clone();
        }
        result
    }
}
