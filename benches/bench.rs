use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qmap::{Engine, STR, U32};

fn u32_bytes(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Engine::put (U32 -> STR, 16 byte value)", |b| {
        let mut e = Engine::new();
        let hd = e.open(None, None, U32, STR, 0xFFFF, 0);
        let value = [0u8; 16];
        let mut k = 0u32;
        b.iter(|| {
            e.put(hd, Some(black_box(&u32_bytes(k))), black_box(&value));
            k = k.wrapping_add(1);
        })
    });
    c.bench_function("Engine::get (U32 -> STR, 16 byte value)", |b| {
        let mut e = Engine::new();
        let hd = e.open(None, None, U32, STR, 0xFFFF, 0);
        let value = [0u8; 16];
        for k in 0..1000u32 {
            e.put(hd, Some(&u32_bytes(k)), &value);
        }
        b.iter(|| e.get(hd, black_box(&u32_bytes(500))))
    });
    c.bench_function("Engine::del (U32 -> STR, 16 byte value)", |b| {
        let value = [0u8; 16];
        b.iter_batched(
            || {
                let mut e = Engine::new();
                let hd = e.open(None, None, U32, STR, 0xFFFF, 0);
                e.put(hd, Some(&u32_bytes(1)), &value);
                (e, hd)
            },
            |(mut e, hd)| e.del(black_box(hd), black_box(&u32_bytes(1))),
            criterion::BatchSize::SmallInput,
        );
    });
    c.bench_function("HashMap::insert (u32 key, 16 byte value)", |b| {
        let mut hashmap = HashMap::with_capacity(1000);
        let value = [0u8; 16];
        let mut k = 0u32;
        b.iter(|| {
            hashmap.insert(black_box(k), black_box(value));
            k = k.wrapping_add(1);
        })
    });
    c.bench_function("HashMap::get (u32 key, 16 byte value)", |b| {
        let mut hashmap = HashMap::with_capacity(1000);
        let value = [0u8; 16];
        for k in 0..1000u32 {
            hashmap.insert(k, value);
        }
        b.iter(|| hashmap.get(black_box(&500u32)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
