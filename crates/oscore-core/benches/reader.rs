//! Parse and dispatch benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oscore_core::{Method, OscServer};
use rosc::{encoder, OscMessage, OscPacket, OscTime, OscType};

fn encoded(addr: &str) -> Vec<u8> {
    encoder::encode(&OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args: vec![
            OscType::Float(440.0),
            OscType::Int(3),
            OscType::Time(OscTime {
                seconds: 3_900_000_000,
                fractional: 1 << 31,
            }),
        ],
    }))
    .unwrap()
}

fn dispatch_literal(c: &mut Criterion) {
    let mut server = OscServer::new(1024);
    server
        .try_add_method(
            "/synth/1/freq",
            Method::new(|msg| {
                black_box(msg.read_float(0));
                black_box(msg.read_timestamp_unchecked(2));
            }),
        )
        .unwrap();

    let bytes = encoded("/synth/1/freq");
    server.buffer_mut()[..bytes.len()].copy_from_slice(&bytes);

    c.bench_function("dispatch_literal", |b| {
        b.iter(|| black_box(server.parse_buffer(bytes.len())))
    });
}

fn dispatch_promoted_pattern(c: &mut Criterion) {
    let mut server = OscServer::new(1024);
    for i in 0..32 {
        server
            .try_add_method(&format!("/bank/{}/[0-9]/freq", i), Method::new(|_| {}))
            .unwrap();
    }
    server
        .try_add_method(
            "/synth/*/freq",
            Method::new(|msg| {
                black_box(msg.read_float(0));
            }),
        )
        .unwrap();

    let bytes = encoded("/synth/7/freq");
    server.buffer_mut()[..bytes.len()].copy_from_slice(&bytes);

    c.bench_function("dispatch_promoted_pattern", |b| {
        b.iter(|| black_box(server.parse_buffer(bytes.len())))
    });
}

criterion_group!(benches, dispatch_literal, dispatch_promoted_pattern);
criterion_main!(benches);
