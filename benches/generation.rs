//! Benchmarks for frame generation and dataset writing

use canfuzz::{DatasetWriter, FrameGenerator, GeneratorConfig, SignalKind, SignalTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("generate_10000_frames", |b| {
        b.iter(|| {
            let config = GeneratorConfig::new().with_targets(8_700, 1_300).with_seed(42);
            for frame in FrameGenerator::new(config).unwrap() {
                black_box(frame);
            }
        })
    });

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    let table = SignalTable::vehicle();
    let mut rng = StdRng::seed_from_u64(1);

    for signal in table.iter() {
        let name = match signal.kind {
            SignalKind::Toggle => format!("toggle_{}", signal.name),
            SignalKind::Fluctuate { .. } => format!("fluctuate_{}", signal.name),
        };
        group.bench_function(name, |b| {
            b.iter(|| black_box(canfuzz::signal::sample(&signal.kind, &mut rng)))
        });
    }

    group.finish();
}

fn bench_writing(c: &mut Criterion) {
    let mut group = c.benchmark_group("writing");
    group.throughput(Throughput::Elements(10_000));

    let config = GeneratorConfig::new().with_targets(8_700, 1_300).with_seed(42);
    let frames: Vec<_> = FrameGenerator::new(config).unwrap().collect();

    group.bench_function("write_10000_rows", |b| {
        b.iter(|| {
            let mut writer = DatasetWriter::from_writer(Vec::with_capacity(1 << 20));
            for frame in &frames {
                writer.write_frame(frame).unwrap();
            }
            black_box(writer.into_inner().unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_generation, bench_sampling, bench_writing);
criterion_main!(benches);
