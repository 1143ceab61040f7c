use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use eccguard::{encode, fast_repair, scan_file, DamageDescriptor, Metadata, SectionIndex};
use std::hint::black_box;
use std::io::Cursor;

const FILE_SIZE: usize = 8 * 1024 * 1024;

fn sample_data() -> Vec<u8> {
    (0..FILE_SIZE).map(|i| (i.wrapping_mul(2654435761)) as u8).collect()
}

fn protect(data: &[u8], meta: &Metadata) -> (Vec<u8>, Vec<u8>) {
    let (_, ecc, crc) = encode(meta, Cursor::new(data), Vec::new(), Vec::new())
        .expect("encode should succeed");
    (ecc, crc)
}

/// Encode throughput across redundancy levels
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.sample_size(20);

    let data = sample_data();
    for level in [1u16, 2, 4] {
        let meta = Metadata::new(FILE_SIZE as u64, 4096, 10, level);
        group.bench_with_input(BenchmarkId::from_parameter(level), &meta, |b, meta| {
            b.iter(|| {
                encode(
                    black_box(meta),
                    Cursor::new(&data),
                    Vec::new(),
                    Vec::new(),
                )
                .expect("encode should succeed")
            })
        });
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.sample_size(20);

    let data = sample_data();
    let meta = Metadata::new(FILE_SIZE as u64, 4096, 10, 1);
    let (ecc, crc) = protect(&data, &meta);

    group.bench_function("clean", |b| {
        b.iter(|| {
            scan_file(
                None,
                Cursor::new(&data),
                Cursor::new(&ecc),
                Cursor::new(&crc),
            )
            .expect("scan should succeed")
        })
    });
    group.finish();
}

/// Repair with one damaged block in every tenth section
fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.sample_size(20);

    let data = sample_data();
    let meta = Metadata::new(FILE_SIZE as u64, 4096, 10, 1);
    let (ecc, _) = protect(&data, &meta);
    let damages: Vec<DamageDescriptor> = (0..meta.num_sections())
        .step_by(10)
        .map(|s| DamageDescriptor {
            section: SectionIndex::new(s),
            data_damage: vec![s % 10],
            ecc_damage: vec![],
        })
        .collect();

    group.bench_function("sparse_damage", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(FILE_SIZE);
            fast_repair(
                None,
                &mut out,
                Cursor::new(&data),
                Cursor::new(&ecc),
                black_box(&damages),
            )
            .expect("repair should succeed");
            out
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_scan, bench_repair);
criterion_main!(benches);
