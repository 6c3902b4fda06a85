use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use streamchat::core::accumulator::StreamAccumulator;
use streamchat::core::decoder::ChunkDecoder;

fn make_body(records: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..records {
        body.push_str(&format!(
            "{{\"model\":\"llama3\",\"message\":{{\"role\":\"assistant\",\"content\":\"token{i} \"}},\"done\":false}}\n"
        ));
    }
    body.push_str("{\"done\":true}\n");
    body.into_bytes()
}

fn decode_and_fold(body: &[u8], fragment_size: usize) -> usize {
    let mut decoder = ChunkDecoder::new();
    let mut accumulator = StreamAccumulator::new(None);
    for fragment in body.chunks(fragment_size) {
        for line in decoder.push(fragment) {
            let _ = accumulator.fold_line(&line);
        }
    }
    accumulator.content().len()
}

fn bench_decoder(c: &mut Criterion) {
    let body = make_body(2_000);
    let mut group = c.benchmark_group("decode_and_fold");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for fragment_size in [7_usize, 64, 1_024, 16 * 1_024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(fragment_size),
            &fragment_size,
            |b, &size| b.iter(|| decode_and_fold(&body, size)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_decoder);
criterion_main!(benches);
