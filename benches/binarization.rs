use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::GrayImage;
use rust_qr_stream::tools::{GridLayout, Lighting, ModuleGrid, render};
use rust_qr_stream::utils::binarization::{
    adaptive_mean_binarize, otsu_binarize, threshold_binarize,
};

fn flat(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, image::Luma([128]))
}

fn glare_grid() -> GrayImage {
    render(
        &ModuleGrid::new(21, 0x5EED),
        GridLayout::default(),
        Lighting::Gradient {
            left: 255,
            right: 120,
            contrast: 60,
        },
    )
}

fn bench_otsu_binarize_small(c: &mut Criterion) {
    let gray = flat(100, 100);
    c.bench_function("otsu_binarize_100x100", |b| {
        b.iter(|| otsu_binarize(black_box(&gray), black_box(50)))
    });
}

fn bench_otsu_binarize_medium(c: &mut Criterion) {
    let gray = flat(640, 480);
    c.bench_function("otsu_binarize_640x480", |b| {
        b.iter(|| otsu_binarize(black_box(&gray), black_box(50)))
    });
}

fn bench_otsu_binarize_large(c: &mut Criterion) {
    let gray = flat(1920, 1080);
    c.bench_function("otsu_binarize_1920x1080", |b| {
        b.iter(|| otsu_binarize(black_box(&gray), black_box(50)))
    });
}

fn bench_adaptive_binarize_medium(c: &mut Criterion) {
    let gray = flat(640, 480);
    c.bench_function("adaptive_mean_binarize_640x480", |b| {
        b.iter(|| adaptive_mean_binarize(black_box(&gray), black_box(55), black_box(3)))
    });
}

fn bench_adaptive_binarize_glare(c: &mut Criterion) {
    let gray = glare_grid();
    c.bench_function("adaptive_mean_binarize_glare_grid", |b| {
        b.iter(|| adaptive_mean_binarize(black_box(&gray), black_box(55), black_box(3)))
    });
}

fn bench_threshold_binarize_medium(c: &mut Criterion) {
    let gray = flat(640, 480);
    c.bench_function("threshold_binarize_640x480", |b| {
        b.iter(|| threshold_binarize(black_box(&gray), black_box(128)))
    });
}

criterion_group!(
    benches,
    bench_otsu_binarize_small,
    bench_otsu_binarize_medium,
    bench_otsu_binarize_large,
    bench_adaptive_binarize_medium,
    bench_adaptive_binarize_glare,
    bench_threshold_binarize_medium
);
criterion_main!(benches);
