use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use bundlekit_core::{
    encoder::BundleBuilder,
    scanner::{count_markers, find_next_marker},
    FormatVersion,
};

fn make_stream(version: FormatVersion, num_sections: usize, payload_len: usize) -> Vec<u8> {
    let mut builder = BundleBuilder::new(version);
    for i in 0..num_sections {
        builder = builder.section((i % 8) as u8, 1, vec![b'x'; payload_len]);
    }
    let mut stream = builder.build().unwrap().to_vec();
    // Erased flash at the end, as left by an interrupted dump
    stream.extend_from_slice(&vec![0xFFu8; 4096]);
    stream
}

fn bench_scanner(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    for version in [FormatVersion::V1, FormatVersion::V2] {
        for &payload_len in &[16usize, 256, 4096] {
            let stream = make_stream(version, 500, payload_len);
            let marker = version.marker();
            group.throughput(Throughput::Bytes(stream.len() as u64));

            group.bench_with_input(
                BenchmarkId::new(format!("find_next_marker/{:?}", version), payload_len),
                &stream,
                |b, data| {
                    b.iter(|| {
                        // Erased tail holds no marker, so the whole window is searched
                        let res = find_next_marker(data, data.len() - 4096, marker);
                        criterion::black_box(res);
                    });
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("count_markers/{:?}", version), payload_len),
                &stream,
                |b, data| {
                    b.iter(|| {
                        let res = count_markers(data, marker);
                        criterion::black_box(res);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_scanner);
criterion_main!(benches);
