#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use pagcodec::graph::{Color, Composition, CompositionRef, Layer, LayerContent, Mask, Point, TrackMatteType};
use pagcodec::{Codec, File, PerformanceData};
use std::hint::black_box;

/// `count` nested compositions of `layers` solids each, all embedded by one main composition.
fn generate_file(count: usize, layers: u32) -> pagcodec::Result<File> {
    let mut compositions: Vec<Composition> = (0..count)
        .map(|i| {
            let layers = (1..=layers)
                .map(|id| {
                    let mut layer = Layer::new(
                        id,
                        LayerContent::Solid {
                            color: Color::new(id as u8, 0, 0),
                            width: 64,
                            height: 64,
                        },
                    );
                    layer.duration = 60;
                    layer.start_time = i64::from(id % 10);
                    layer.masks = vec![Mask::new(id, vec![Point::new(0.0, 0.0); 8])];
                    if id % 2 == 0 {
                        layer.track_matte_type = TrackMatteType::Alpha;
                    }
                    layer
                })
                .collect();
            Composition::vector(i as u32 + 10, 64, 64, 60, 30.0, layers)
        })
        .collect();

    let main_layers = (0..count)
        .map(|i| {
            let mut layer = Layer::new(
                i as u32 + 1,
                LayerContent::PreCompose {
                    composition: Some(CompositionRef::new(i)),
                    composition_start_time: 0,
                },
            );
            layer.duration = 60;
            layer
        })
        .collect();
    compositions.push(Composition::vector(1, 64, 64, 60, 30.0, main_layers));
    Codec::make_file(compositions, Vec::new())
}

// --- BENCHMARKS ---

fn bench_codec(c: &mut Criterion) {
    let Ok(file) = generate_file(50, 100) else {
        return;
    };
    let performance = PerformanceData {
        rendering_time: 1000,
        ..Default::default()
    };
    let Ok(bytes) = Codec::encode_with_performance(&file, &performance) else {
        return;
    };

    println!("Encoded size: {} bytes", bytes.len());

    let mut group = c.benchmark_group("Codec");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| Codec::encode(black_box(&file)))
    });

    group.bench_function("decode", |b| {
        b.iter(|| Codec::decode(black_box(&bytes), "bench.pag"))
    });

    // Skips every composition body by length.
    group.bench_function("read_performance_data", |b| {
        b.iter(|| Codec::read_performance_data(black_box(&bytes)))
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
