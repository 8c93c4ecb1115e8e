//! Entry store benchmarks
//!
//! - `skiplist/*`: the bare [`SkipList`], 10,000 inserts then 10,000 lookups
//! - `store/*`: both [`EntryStore`] backends through the trait, same load
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench store
//! cargo bench --bench store -- "skiplist"
//! ```

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shardkv::{EntryStore, ShardedStore, SkipList, SkipListStore};

const ENTRIES: u64 = 10_000;

fn keys() -> Vec<Bytes> {
    (0..ENTRIES).map(|i| Bytes::from(i.to_be_bytes().to_vec())).collect()
}

fn skiplist_benchmarks(c: &mut Criterion) {
    let keys = keys();
    let mut group = c.benchmark_group("skiplist");
    group.throughput(Throughput::Elements(ENTRIES));

    for max_level in [4, 8, 12] {
        group.bench_with_input(
            BenchmarkId::new("insert", max_level),
            &max_level,
            |b, &max_level| {
                b.iter(|| {
                    let mut list = SkipList::with_max_level(max_level);
                    for key in &keys {
                        list.insert(key.clone(), key.clone());
                    }
                    black_box(list.len())
                });
            },
        );

        let mut list = SkipList::with_max_level(max_level);
        for key in &keys {
            list.insert(key.clone(), key.clone());
        }
        group.bench_with_input(BenchmarkId::new("get", max_level), &list, |b, list| {
            b.iter(|| {
                for key in &keys {
                    black_box(list.get(key));
                }
            });
        });
    }

    group.finish();
}

fn store_benchmarks(c: &mut Criterion) {
    let keys = keys();
    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(ENTRIES));

    let backends: [(&str, fn() -> Box<dyn EntryStore>); 2] = [
        ("sharded", || Box::new(ShardedStore::new()) as Box<dyn EntryStore>),
        ("skiplist", || Box::new(SkipListStore::new()) as Box<dyn EntryStore>),
    ];

    for (name, make) in backends {
        group.bench_function(BenchmarkId::new("write", name), |b| {
            b.iter(|| {
                let store = make();
                for key in &keys {
                    store.write(key.clone(), key.clone());
                }
                black_box(store.len())
            });
        });

        let store = make();
        for key in &keys {
            store.write(key.clone(), key.clone());
        }
        group.bench_function(BenchmarkId::new("read", name), |b| {
            b.iter(|| {
                for key in &keys {
                    black_box(store.read(key));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, skiplist_benchmarks, store_benchmarks);
criterion_main!(benches);
