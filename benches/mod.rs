use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::ipfs::client::bench_add_text,
    network::application::ipfs::client::bench_add_file,
    network::application::ipfs::client::bench_cat,
    network::application::ipfs::client::bench_command_head
);
criterion_main!(benches);
