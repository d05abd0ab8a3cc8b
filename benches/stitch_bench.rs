use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use stitchshot::compose;
use stitchshot::geometry::PageMetrics;

// Compositing cost for a typical long page: 1280x720 viewport, ~4000px of
// content, six captures.
fn bench_stitch(c: &mut Criterion) {
    let metrics = PageMetrics::from_raw(720, 4000, 1, None, 65500);
    let slices: Vec<RgbaImage> = (0..metrics.captures())
        .map(|i| RgbaImage::from_pixel(1280, 720, Rgba([i as u8, 0, 0, 255])))
        .collect();

    c.bench_function("stitch_4000px_page", |b| {
        b.iter(|| compose::stitch(&slices, &metrics).unwrap())
    });
}

fn bench_encode(c: &mut Criterion) {
    let metrics = PageMetrics::from_raw(720, 2160, 1, None, 65500);
    let slices: Vec<RgbaImage> = (0..metrics.captures())
        .map(|i| RgbaImage::from_pixel(1280, 720, Rgba([i as u8, 64, 0, 255])))
        .collect();
    let canvas = compose::stitch(&slices, &metrics).unwrap();

    c.bench_function("encode_2160px_canvas", |b| {
        b.iter(|| compose::encode_png(&canvas).unwrap())
    });
}

criterion_group!(benches, bench_stitch, bench_encode);
criterion_main!(benches);
