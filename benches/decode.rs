use std::hint::black_box;
use std::net::SocketAddr;

use criterion::{criterion_group, criterion_main, Criterion};
use netflow9::{fields, Decoder, DecoderConfig};

fn header(count: u16, timestamp: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(20);
    data.extend_from_slice(&9u16.to_be_bytes());
    data.extend_from_slice(&count.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&timestamp.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&1u32.to_be_bytes());
    data
}

fn template_packet() -> Vec<u8> {
    let field_specs: &[(u16, u16)] = &[
        (fields::IPV4_SRC_ADDR, 4),
        (fields::IPV4_DST_ADDR, 4),
        (fields::L4_SRC_PORT, 2),
        (fields::L4_DST_PORT, 2),
        (fields::PROTOCOL, 1),
        (fields::TOS, 1),
        (fields::IN_BYTES, 4),
        (fields::IN_PKTS, 4),
    ];

    let mut data = header(1, 1000);
    data.extend_from_slice(&0u16.to_be_bytes());
    data.extend_from_slice(&((8 + field_specs.len() * 4) as u16).to_be_bytes());
    data.extend_from_slice(&256u16.to_be_bytes());
    data.extend_from_slice(&(field_specs.len() as u16).to_be_bytes());
    for &(field_type, length) in field_specs {
        data.extend_from_slice(&field_type.to_be_bytes());
        data.extend_from_slice(&length.to_be_bytes());
    }
    data
}

fn data_packet(records: usize) -> Vec<u8> {
    const RECORD_LEN: usize = 22;
    let mut data = header(1, 1000);
    data.extend_from_slice(&256u16.to_be_bytes());
    data.extend_from_slice(&((4 + records * RECORD_LEN) as u16).to_be_bytes());
    for i in 0..records {
        data.extend_from_slice(&[10, 0, (i >> 8) as u8, i as u8]);
        data.extend_from_slice(&[192, 168, 1, 1]);
        data.extend_from_slice(&443u16.to_be_bytes());
        data.extend_from_slice(&(i as u16).to_be_bytes());
        data.push(6);
        data.push(0);
        data.extend_from_slice(&1500u32.to_be_bytes());
        data.extend_from_slice(&10u32.to_be_bytes());
    }
    data
}

fn benchmark_decode(c: &mut Criterion) {
    let exporter: SocketAddr = "10.0.0.1:2055".parse().unwrap();
    let mut group = c.benchmark_group("decode");

    group.bench_function("template_flowset", |b| {
        let decoder = Decoder::new(DecoderConfig::default());
        let packet = template_packet();
        b.iter(|| black_box(decoder.decode(black_box(&packet), exporter)).is_ok())
    });

    group.bench_function("data_flowset_30_records", |b| {
        let decoder = Decoder::new(DecoderConfig::default());
        decoder.decode(&template_packet(), exporter).unwrap();
        let packet = data_packet(30);
        b.iter(|| black_box(decoder.decode(black_box(&packet), exporter)).is_ok())
    });

    group.finish();
}

criterion_group!(benches, benchmark_decode);
criterion_main!(benches);
