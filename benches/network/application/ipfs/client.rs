use criterion::{BatchSize, Criterion, Throughput};
use heapless::String;
use libipfs::network::application::ipfs::request::command_head;
use libipfs::network::application::ipfs::{Client, Command, NodeEndpoint, Options};
use libipfs::network::error::Error;
use libipfs::network::{Close, Connect, Connection, Read, Write};
use std::hint::black_box;

const ADD_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n4a\r\n{\"Name\":\"bench.bin\",\"Hash\":\"QmbFMke1KXqnYyBBWxB74N4c5SBnJMVAiMNRcGu6x1AwQH\",\"Size\":\"4096\"}\r\n0\r\n\r\n";

/// Serves a canned response and discards everything written to it.
struct Loopback {
    response: &'static [u8],
    pos: usize,
    written: usize,
}

impl Read for Loopback {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.response.len() - self.pos);
        buf[..n].copy_from_slice(&self.response[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for Loopback {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for Loopback {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        black_box(self.written);
        Ok(())
    }
}

impl Connection for Loopback {
    fn is_connected(&self) -> bool {
        true
    }

    fn set_read_timeout(&mut self, _timeout_ms: u32) {}
}

struct LoopbackNetwork {
    response: &'static [u8],
}

impl Connect for LoopbackNetwork {
    type Connection = Loopback;
    type Error = Error;

    fn connect(&mut self, _host: &str, _port: u16) -> Result<Self::Connection, Self::Error> {
        Ok(Loopback {
            response: self.response,
            pos: 0,
            written: 0,
        })
    }
}

fn setup_client(response: &'static [u8]) -> Client<LoopbackNetwork> {
    Client::new(
        LoopbackNetwork { response },
        NodeEndpoint::new("127.0.0.1", 5001),
    )
}

pub fn bench_add_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_text");
    let payload = "temperature=23.5;humidity=41";
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("add_text", |b| {
        b.iter_batched_ref(
            || setup_client(ADD_RESPONSE),
            |client| {
                client
                    .add_text("reading.txt", black_box(payload))
                    .expect("Failed to add");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_add_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_file");
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("add_file_4k", |b| {
        b.iter_batched_ref(
            || setup_client(ADD_RESPONSE),
            |client| {
                let mut source: &[u8] = &data;
                client
                    .add_file("bench.bin", &mut source)
                    .expect("Failed to add");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_cat(c: &mut Criterion) {
    let mut group = c.benchmark_group("cat");
    let response: &'static [u8] = Box::leak(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n{}",
            "x".repeat(1024)
        )
        .into_bytes()
        .into_boxed_slice(),
    );
    group.throughput(Throughput::Bytes(1024));
    group.bench_function("cat_1k", |b| {
        b.iter_batched_ref(
            || setup_client(response),
            |client| {
                let text = client
                    .cat("QmbFMke1KXqnYyBBWxB74N4c5SBnJMVAiMNRcGu6x1AwQH", 0)
                    .expect("Failed to cat");
                black_box(text);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_command_head(c: &mut Criterion) {
    let endpoint = NodeEndpoint::new("192.168.1.10", 5001);
    let options = Options::default();
    let args = ["/ipfs/QmbFMke1KXqnYyBBWxB74N4c5SBnJMVAiMNRcGu6x1AwQH", "/backup/sensor log.txt"];
    let command = Command::new("/files/cp").args(&args);

    c.bench_function("command_head", |b| {
        b.iter(|| {
            let mut head: String<512> = String::new();
            command_head(&mut head, &endpoint, &options, black_box(&command))
                .expect("Failed to build request");
            black_box(head.len())
        })
    });
}
