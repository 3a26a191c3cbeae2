use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gpmf_core::{
    codec::decode_scaled,
    metadata::{resolve_scale, resolve_units},
    test_support::{device, nest, string, GpsStreamBuilder},
    GpsFix, RecordCursor, Scope, SearchMode,
};
use gpmf_types::{keys, TimeWindow};

/// Секунда данных HERO5: несколько потоков и 18 выборок GPS5.
fn payload() -> Vec<u8> {
    let mut gps = GpsStreamBuilder::new()
        .timestamp("170101120000.000")
        .fix(3)
        .precision(152)
        .units(&["deg", "deg", "m", "m/s", "m/s"])
        .scale(&[10_000_000, 10_000_000, 1000, 1000, 100]);
    for i in 0..18 {
        gps = gps.sample([451_234_567 + i, -735_678_901, 52_123, 1_250, 130]);
    }

    let filler: Vec<Vec<u8>> = (0..8)
        .map(|i| nest(b"STRM", &[string(b"STNM", &format!("Stream {i}"))]))
        .chain(std::iter::once(gps.build()))
        .collect();

    device(&filler)
}

fn bench_traversal(c: &mut Criterion) {
    let buf = payload();
    let mut group = c.benchmark_group("traversal");
    group.throughput(Throughput::Bytes(buf.len() as u64));

    group.bench_function("find_gps5", |b| {
        b.iter(|| {
            let mut cursor = RecordCursor::new(black_box(&buf)).unwrap();
            let mut found = 0;
            while cursor
                .find_next(keys::STRM, Scope::Recurse, SearchMode::Tolerant)
                .is_found()
            {
                if cursor
                    .find_next(keys::GPS5, Scope::Recurse, SearchMode::Tolerant)
                    .is_found()
                {
                    found += 1;
                }
            }
            black_box(found)
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let buf = payload();
    let mut cursor = RecordCursor::new(&buf).unwrap();
    assert!(cursor
        .find_next(keys::GPS5, Scope::Recurse, SearchMode::Strict)
        .is_found());

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements((cursor.repeat() * 5) as u64));

    group.bench_function("gps5_scaled", |b| {
        let scale = resolve_scale(&cursor).unwrap();
        b.iter(|| black_box(decode_scaled(black_box(&cursor), &scale, &[]).unwrap()));
    });

    group.bench_function("gps5_metadata", |b| {
        let window = TimeWindow::new(0.0, 1.0);
        b.iter(|| {
            let units = resolve_units(black_box(&cursor));
            let fix = GpsFix::resolve(&cursor, &window).unwrap();
            black_box((units, fix))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_traversal, bench_decode);
criterion_main!(benches);
