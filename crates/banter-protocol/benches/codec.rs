//! Codec benchmarks for banter-protocol.

use banter_protocol::{codec, ChatMessage, ServerEvent};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn bench_encode_message(c: &mut Criterion) {
    let event = ServerEvent::message_added(
        ChatMessage::private("alice", "bob").with_text("x".repeat(64)),
    );

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(64));
    group.bench_function("message_64B", |b| {
        b.iter(|| codec::encode(black_box(&event)))
    });
    group.finish();
}

fn bench_decode_message(c: &mut Criterion) {
    let text = format!(
        r#"{{"event":"addMessage","data":{{"from":"alice","to":"bob","text":"{}"}}}}"#,
        "x".repeat(64)
    );

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("message_64B", |b| b.iter(|| codec::decode(black_box(&text))));
    group.finish();
}

fn bench_roundtrip(c: &mut Criterion) {
    let event = ServerEvent::message_added(
        ChatMessage::private("alice", "bob").with_text("x".repeat(256)),
    );

    c.bench_function("roundtrip_256B", |b| {
        b.iter(|| {
            let encoded = codec::encode(black_box(&event)).unwrap();
            serde_json::from_str::<ServerEvent>(black_box(&encoded)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_encode_message,
    bench_decode_message,
    bench_roundtrip
);
criterion_main!(benches);
