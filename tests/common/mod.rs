#![allow(dead_code)]

use libipfs::network::application::ipfs::{Client, NodeEndpoint};
use libipfs::network::error::Error;
use libipfs::network::{Close, Connect, Connection, Read, Write};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const HOST: &str = "ipfs.local";
pub const PORT: u16 = 5001;

/// Everything the mock network observed.
#[derive(Debug, Default)]
pub struct Log {
    pub connects: Vec<(String, u16)>,
    /// Bytes written, one entry per connection in creation order.
    pub requests: Vec<Vec<u8>>,
    pub closed: usize,
    pub timeouts: Vec<u32>,
}

/// Scripted behaviour of one connection.
#[derive(Debug, Clone)]
pub struct Script {
    pub response: Vec<u8>,
    /// Maximum bytes returned by one read.
    pub read_step: usize,
    /// Maximum bytes accepted by one write.
    pub write_step: usize,
    /// Keep failing reads with a timeout once the response is exhausted.
    pub hang: bool,
    pub connected: bool,
    /// Fail every write with `WriteError`.
    pub fail_writes: bool,
}

impl Script {
    pub fn new(response: impl Into<Vec<u8>>) -> Self {
        Self {
            response: response.into(),
            read_step: 64,
            write_step: usize::MAX,
            hang: false,
            connected: true,
            fail_writes: false,
        }
    }

    pub fn read_step(mut self, step: usize) -> Self {
        self.read_step = step;
        self
    }

    pub fn write_step(mut self, step: usize) -> Self {
        self.write_step = step;
        self
    }

    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    script: Script,
    pos: usize,
    log: Rc<RefCell<Log>>,
}

impl MockConnection {
    fn new(script: Script, log: Rc<RefCell<Log>>) -> Self {
        let id = {
            let mut log = log.borrow_mut();
            log.requests.push(Vec::new());
            log.requests.len() - 1
        };
        Self {
            id,
            script,
            pos: 0,
            log,
        }
    }
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = self.script.response.len() - self.pos;
        if remaining == 0 {
            return if self.script.hang {
                Err(Error::Timeout)
            } else {
                Ok(0)
            };
        }
        let n = buf.len().min(self.script.read_step).min(remaining);
        buf[..n].copy_from_slice(&self.script.response[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.script.fail_writes {
            return Err(Error::WriteError);
        }
        let n = buf.len().min(self.script.write_step);
        self.log.borrow_mut().requests[self.id].extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.log.borrow_mut().closed += 1;
        Ok(())
    }
}

impl Connection for MockConnection {
    fn is_connected(&self) -> bool {
        self.script.connected
    }

    fn set_read_timeout(&mut self, timeout_ms: u32) {
        self.log.borrow_mut().timeouts.push(timeout_ms);
    }
}

/// Connector handing out scripted connections in order.
#[derive(Debug, Default)]
pub struct MockNetwork {
    scripts: VecDeque<Script>,
    log: Rc<RefCell<Log>>,
    pub refuse: bool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, response: impl Into<Vec<u8>>) -> Self {
        self.scripts.push_back(Script::new(response));
        self
    }

    pub fn respond_with(mut self, script: Script) -> Self {
        self.scripts.push_back(script);
        self
    }

    pub fn log(&self) -> Rc<RefCell<Log>> {
        Rc::clone(&self.log)
    }

    /// A connection opened outside the connector, e.g. for `attach`.
    pub fn detached(&self, script: Script) -> MockConnection {
        MockConnection::new(script, Rc::clone(&self.log))
    }
}

impl Connect for MockNetwork {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection, Self::Error> {
        self.log.borrow_mut().connects.push((host.to_string(), port));
        if self.refuse {
            return Err(Error::ConnectionRefused);
        }
        let script = self.scripts.pop_front().unwrap_or_else(|| Script::new(""));
        Ok(MockConnection::new(script, Rc::clone(&self.log)))
    }
}

pub fn client(network: MockNetwork) -> Client<MockNetwork> {
    Client::new(network, NodeEndpoint::new(HOST, PORT))
}

/// Assemble a raw HTTP response.
pub fn http_response(status_line: &str, headers: &[&str], body: &str) -> Vec<u8> {
    let mut out = format!("{status_line}\r\n");
    for header in headers {
        out.push_str(header);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
    out.into_bytes()
}

/// A `200 OK` response with a `Content-Length` header.
pub fn ok(body: &str) -> Vec<u8> {
    let length = format!("Content-Length: {}", body.len());
    http_response("HTTP/1.1 200 OK", &[&length, "Content-Type: text/plain"], body)
}

/// A `500` response carrying a node error envelope.
pub fn node_error(message_json: &str) -> Vec<u8> {
    let body = format!(r#"{{"Message":"{message_json}","Code":0,"Type":"error"}}"#);
    let length = format!("Content-Length: {}", body.len());
    http_response(
        "HTTP/1.1 500 Internal Server Error",
        &[&length, "Content-Type: application/json"],
        &body,
    )
}

/// A written request split into head text and body bytes.
#[derive(Debug)]
pub struct Captured {
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("request head is not terminated");
        Self {
            head: String::from_utf8(raw[..split + 2].to_vec()).expect("head is not UTF-8"),
            body: raw[split + 4..].to_vec(),
        }
    }

    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }
}

/// The `n`-th request written on the mock network.
pub fn request(log: &Rc<RefCell<Log>>, n: usize) -> Captured {
    Captured::parse(&log.borrow().requests[n])
}
