use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::GrayImage;
use rust_qr_stream::brightness::BrightnessGate;
use rust_qr_stream::tools::{GridLayout, GridReader, Lighting, ModuleGrid, render};
use rust_qr_stream::{Cascade, CascadeConfig, Engines};

fn cascade_for(grid: &ModuleGrid) -> Cascade {
    let reader = GridReader::new(grid.clone(), GridLayout::default(), "bench");
    Cascade::new(&CascadeConfig::default(), Engines::new(reader))
}

fn run_once(cascade: &mut Cascade, gate: &BrightnessGate, gray: &GrayImage) {
    let decision = gate.analyze(gray);
    black_box(cascade.run(gray, decision.brightness, || true));
}

fn bench_well_lit_primary(c: &mut Criterion) {
    let grid = ModuleGrid::new(21, 0x5EED);
    let gray = render(
        &grid,
        GridLayout::default(),
        Lighting::Uniform {
            light: 230,
            contrast: 210,
        },
    );
    let mut cascade = cascade_for(&grid);
    let gate = BrightnessGate::default();
    c.bench_function("cascade_well_lit_primary", |b| {
        b.iter(|| run_once(&mut cascade, &gate, black_box(&gray)))
    });
}

fn bench_glare_adaptive(c: &mut Criterion) {
    let grid = ModuleGrid::new(21, 0x5EED);
    let gray = render(
        &grid,
        GridLayout::default(),
        Lighting::Gradient {
            left: 255,
            right: 120,
            contrast: 60,
        },
    );
    let mut cascade = cascade_for(&grid);
    let gate = BrightnessGate::default();
    c.bench_function("cascade_glare_adaptive", |b| {
        b.iter(|| run_once(&mut cascade, &gate, black_box(&gray)))
    });
}

fn bench_blank_exhaustion(c: &mut Criterion) {
    let grid = ModuleGrid::new(21, 0x5EED);
    let gray = GrayImage::from_pixel(640, 480, image::Luma([150]));
    let mut cascade = cascade_for(&grid);
    let gate = BrightnessGate::default();
    c.bench_function("cascade_blank_640x480_exhausted", |b| {
        b.iter(|| run_once(&mut cascade, &gate, black_box(&gray)))
    });
}

criterion_group!(
    benches,
    bench_well_lit_primary,
    bench_glare_adaptive,
    bench_blank_exhaustion
);
criterion_main!(benches);
