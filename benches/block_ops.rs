//! Criterion benchmarks for the per-block kernels.
//!
//! Run with: cargo bench --bench block_ops
//! Compare against scalar: cargo bench --bench block_ops --no-default-features

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use zenblock::{
    disto16x16, mean16x4, quantize, sse16x16, sse4x4, transform_one, Block8x8F, QuantTable,
    BPS, STD_LUMA_QUANT,
};

fn test_block() -> Block8x8F {
    let mut block = Block8x8F::default();
    for (i, v) in block.as_mut_array().iter_mut().enumerate() {
        *v = ((i * 37) % 255) as f32 - 127.0;
    }
    block
}

fn test_plane(seed: usize) -> Vec<u8> {
    (0..BPS * 16).map(|i| ((i * 29 + seed) % 256) as u8).collect()
}

fn bench_block_float(c: &mut Criterion) {
    let mut group = c.benchmark_group("block8x8f");
    group.throughput(Throughput::Elements(64));
    let block = test_block();

    group.bench_function("transpose", |b| b.iter(|| black_box(&block).transpose()));
    group.bench_function("multiply_in_place", |b| {
        let mut work = block;
        b.iter(|| {
            work.multiply_in_place(black_box(1.0001));
            black_box(&work);
        })
    });
    group.bench_function("normalize_and_round", |b| {
        b.iter(|| {
            let mut work = block;
            work.normalize_colors_and_round_in_place(black_box(255.0));
            work
        })
    });
    group.bench_function("round_as_i16_block", |b| {
        b.iter(|| black_box(&block).round_as_i16_block())
    });
    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let block = test_block() * 8.0;
    let table = QuantTable::from_u16(&STD_LUMA_QUANT).unwrap();
    c.bench_function("quantize", |b| {
        b.iter(|| quantize(black_box(&block), black_box(&table)))
    });
}

fn bench_transform(c: &mut Criterion) {
    let coeffs: [i16; 16] = [-176, 12, -3, 0, 29, 5, 0, 1, -7, 0, 0, 0, 2, 0, 0, 0];
    let pred = test_plane(3);
    c.bench_function("transform_one", |b| {
        b.iter(|| {
            let mut dst = [0u8; BPS * 4];
            dst.copy_from_slice(&pred[..BPS * 4]);
            transform_one(black_box(&coeffs), &mut dst, BPS);
            dst
        })
    });
}

fn bench_distortion(c: &mut Criterion) {
    let a = test_plane(0);
    let b = test_plane(7);
    let w: [u16; 16] = [38, 32, 20, 9, 32, 28, 17, 7, 20, 17, 10, 4, 9, 7, 4, 2];

    let mut group = c.benchmark_group("distortion");
    group.bench_function("sse4x4", |bench| {
        bench.iter(|| sse4x4(black_box(&a), black_box(&b), BPS))
    });
    group.bench_function("sse16x16", |bench| {
        bench.iter(|| sse16x16(black_box(&a), black_box(&b), BPS))
    });
    group.bench_function("mean16x4", |bench| {
        bench.iter(|| mean16x4(black_box(&a), BPS))
    });
    group.bench_function("disto16x16", |bench| {
        bench.iter(|| disto16x16(black_box(&a), black_box(&b), BPS, &w))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_block_float,
    bench_quantize,
    bench_transform,
    bench_distortion
);
criterion_main!(benches);
