use rand::{rngs::StdRng, Rng, SeedableRng};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use satframe::frame::{encode, read_frames, Outcome, ParserContext, MAX_PAYLOAD};

fn frame_stream(num_frames: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0);
    let mut dat = Vec::default();
    for _ in 0..num_frames {
        let payload: Vec<u8> = (0..MAX_PAYLOAD).map(|_| rng.gen()).collect();
        dat.extend(encode(&payload).unwrap().to_bytes());
        dat.extend([0x00, 0x00]);
    }
    dat
}

fn bench_crc(c: &mut Criterion) {
    let data = [0x5au8; 1024];
    let mut group = c.benchmark_group("crc");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("crc16", |b| {
        b.iter(|| satframe::crc::crc16(&data));
    });
}

fn bench_decoder(c: &mut Criterion) {
    let data = frame_stream(1000);
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("push", |b| {
        b.iter(|| {
            let mut ctx = ParserContext::new();
            let mut count = 0;
            for byte in &data {
                if let Outcome::Accepted(_) = ctx.push(*byte) {
                    count += 1;
                }
            }
            assert_eq!(count, 1000);
        });
    });
    group.bench_function("read_frames", |b| {
        b.iter(|| {
            let count = read_frames(&data[..]).map_while(Result::ok).count();
            assert_eq!(count, 1000);
        });
    });
}

criterion_group!(benches, bench_crc, bench_decoder);
criterion_main!(benches);
