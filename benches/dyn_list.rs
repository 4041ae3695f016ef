//! Benchmarks for DynList growth and the dictionary lookup path.
//!
//! The interesting costs are:
//! - push with doubling growth vs a pre-reserved buffer,
//! - exact (hash) lookup vs pattern-fallback lookup in a dictionary.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dictionary_rs::{Dictionary, DynList, Entry, SearchPolicy, TokenStream};

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("dyn_list/push");

    for n in [1_000usize, 100_000] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("grow_from_empty", n), &n, |b, &n| {
            b.iter(|| {
                let mut list: DynList<u64> = DynList::new();
                for i in 0..n {
                    list.push(i as u64);
                }
                black_box(list)
            })
        });

        group.bench_with_input(BenchmarkId::new("pre_reserved", n), &n, |b, &n| {
            b.iter(|| {
                let mut list: DynList<u64> = DynList::with_capacity(n);
                for i in 0..n {
                    list.push(i as u64);
                }
                black_box(list)
            })
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/lookup");

    let mut dict = Dictionary::new("bench");
    for i in 0..256 {
        let stream = TokenStream::parse("bench", "1").unwrap();
        dict.add(Entry::stream(format!("key{i}"), stream)).unwrap();
    }
    for i in 0..16 {
        let stream = TokenStream::parse("bench", "2").unwrap();
        dict.add(Entry::pattern(format!("group{i}.*"), stream))
            .unwrap();
    }

    group.bench_function("exact_hit", |b| {
        b.iter(|| black_box(dict.find_entry(black_box("key200"), SearchPolicy::LOCAL)))
    });

    group.bench_function("pattern_hit", |b| {
        b.iter(|| black_box(dict.find_entry(black_box("group3extra"), SearchPolicy::LOCAL)))
    });

    group.bench_function("miss", |b| {
        b.iter(|| black_box(dict.find_entry(black_box("absent"), SearchPolicy::LOCAL)))
    });

    group.finish();
}

criterion_group!(benches, bench_push, bench_lookup);
criterion_main!(benches);
