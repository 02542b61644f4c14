use std::hint::black_box;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use crate::{
    consts::{
        COMMENT_LINE, EMPTY_LINE, MESSAGE_END_LINE, MESSAGE_LINE, PING_LINE,
        generate_answer_stream,
    },
    event_stream::{
        load_chunks, load_line_aligned_chunks, run_driver, run_event_stream, run_frames_only,
    },
};


/// Single-line framing
fn bench_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    let lines: &[(&str, &[u8])] = &[
        ("message", MESSAGE_LINE),
        ("message_end", MESSAGE_END_LINE),
        ("event_field", PING_LINE),
        ("comment", COMMENT_LINE),
        ("empty_line", EMPTY_LINE),
    ];

    for &(name, line) in lines {
        group.bench_with_input(BenchmarkId::new("chatstream", name), line, |b, input| {
            b.iter(|| {
                let _ = black_box(chatstream::frame::parse_line(black_box(input)));
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");

    for (name, line) in [("message", MESSAGE_LINE), ("message_end", MESSAGE_END_LINE)] {
        // drop "data:" and the LF, same as the frame reader hands over
        let payload = Bytes::copy_from_slice(&line[5..line.len() - 1]);
        group.bench_with_input(BenchmarkId::new("chatstream", name), &payload, |b, input| {
            b.iter(|| {
                let _ = black_box(chatstream::decoder::decode_frame(black_box(input.clone())));
            });
        });
    }

    group.finish();
}

fn bench_event_stream(c: &mut Criterion) {
    let raw = generate_answer_stream(1024);

    let chunks = load_chunks(&raw);
    let line_aligned = load_line_aligned_chunks(&raw);

    let mut group = c.benchmark_group("event_stream");

    for (alignment, chunks) in [("unaligned", &chunks), ("line-aligned", &line_aligned)] {
        group.bench_with_input(
            BenchmarkId::new("frames_only", alignment),
            chunks,
            |b, chunks| {
                b.iter(|| run_frames_only(chunks));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("event_stream", alignment),
            chunks,
            |b, chunks| {
                b.iter(|| run_event_stream(chunks));
            },
        );

        group.bench_with_input(BenchmarkId::new("driver", alignment), chunks, |b, chunks| {
            b.iter(|| run_driver(chunks));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_line, bench_decode, bench_event_stream);
criterion_main!(benches);
