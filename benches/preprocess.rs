use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qr_cascade::{DecodeOptions, PixelBuffer, PipelineBuilder};

fn opaque(width: u32, height: u32) -> PixelBuffer {
    let raw = (0..width * height)
        .flat_map(|i| {
            let v = ((i * 37) % 256) as u8;
            [v, v, v, 255]
        })
        .collect();
    PixelBuffer::new(width, height, raw).unwrap()
}

fn transparent(width: u32, height: u32) -> PixelBuffer {
    let raw = (0..width * height)
        .flat_map(|i| if i % 3 == 0 { [0, 0, 0, 255] } else { [0, 0, 0, 0] })
        .collect();
    PixelBuffer::new(width, height, raw).unwrap()
}

fn bench_default_budget(c: &mut Criterion) {
    let image = opaque(640, 480);
    let builder = PipelineBuilder::new(&DecodeOptions::default());
    c.bench_function("passes_default_640x480", |b| {
        b.iter(|| builder.build(black_box(&image)))
    });
}

fn bench_aggressive_budget(c: &mut Criterion) {
    let image = opaque(640, 480);
    let builder = PipelineBuilder::new(&DecodeOptions::default().aggressive(true));
    c.bench_function("passes_aggressive_640x480", |b| {
        b.iter(|| builder.build(black_box(&image)))
    });
}

fn bench_transparent_source(c: &mut Criterion) {
    let image = transparent(640, 480);
    let builder = PipelineBuilder::new(&DecodeOptions::default().aggressive(true));
    c.bench_function("passes_transparent_aggressive_640x480", |b| {
        b.iter(|| builder.build(black_box(&image)))
    });
}

criterion_group!(
    benches,
    bench_default_budget,
    bench_aggressive_budget,
    bench_transparent_source
);
criterion_main!(benches);
