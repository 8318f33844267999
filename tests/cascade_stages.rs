//! Integration tests for the decode cascade
//!
//! Frames come from the synthetic grid renderer; the reference GridReader
//! stands in for a real matrix decoder. Each scenario is built so exactly
//! one stage can succeed.

use image::GrayImage;
use rust_qr_stream::brightness::BrightnessGate;
use rust_qr_stream::models::{EngineResult, Point, Symbol, SymbolKind};
use rust_qr_stream::tools::{GridLayout, GridReader, Lighting, ModuleGrid, render};
use rust_qr_stream::{
    Cascade, CascadeConfig, CascadeRun, DecodeOutcome, EngineError, Engines, MatrixDecoder,
    StageKind,
};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

const SEED: u64 = 0x5EED;

fn grid() -> ModuleGrid {
    ModuleGrid::new(21, SEED)
}

fn well_lit() -> GrayImage {
    render(
        &grid(),
        GridLayout::default(),
        Lighting::Uniform {
            light: 230,
            contrast: 210,
        },
    )
}

/// Bright on the left, dim on the right, low contrast throughout
fn glare() -> GrayImage {
    render(
        &grid(),
        GridLayout::default(),
        Lighting::Gradient {
            left: 255,
            right: 120,
            contrast: 60,
        },
    )
}

fn reader() -> GridReader {
    GridReader::new(grid(), GridLayout::default(), "https://example.org/ticket/42")
}

fn never_decodes(_: &GrayImage) -> Result<EngineResult, EngineError> {
    Ok(EngineResult::not_found())
}

fn run(cascade: &mut Cascade, gray: &GrayImage) -> CascadeRun {
    let decision = BrightnessGate::default().analyze(gray);
    assert!(decision.proceed, "test frame should pass the gate");
    cascade.run(gray, decision.brightness, || true)
}

#[test]
fn test_well_lit_grid_decodes_at_primary() {
    init_logging();
    let mut cascade = Cascade::new(&CascadeConfig::default(), Engines::new(reader()));
    let result = run(&mut cascade, &well_lit());

    assert_eq!(result.decided_by, Some(StageKind::Primary));
    assert_eq!(result.visited, vec![StageKind::Primary]);
    match result.outcome {
        DecodeOutcome::Success { text, points, .. } => {
            assert_eq!(text, "https://example.org/ticket/42");
            // finder centers, mapped back through the clockwise turn
            assert_eq!(
                points,
                vec![
                    Point::new(59.5, 59.5),
                    Point::new(171.5, 59.5),
                    Point::new(59.5, 171.5),
                ]
            );
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn test_glare_grid_decodes_only_at_adaptive() {
    init_logging();
    let gray = glare();
    let mut strict = reader();

    // the plain clockwise view is not readable under glare
    let primary_view = image::imageops::rotate90(&gray);
    assert!(!strict.decode(&primary_view).unwrap().is_valid());

    let mut cascade = Cascade::new(&CascadeConfig::default(), Engines::new(strict));
    let result = run(&mut cascade, &gray);

    assert_eq!(result.decided_by, Some(StageKind::Adaptive));
    assert_eq!(
        result.visited,
        vec![StageKind::Primary, StageKind::Threshold, StageKind::Adaptive]
    );
    assert!(result.outcome.is_success());
}

#[test]
fn test_stage_inputs_follow_fixed_order() {
    let seen: Arc<Mutex<Vec<(u32, u32)>>> = Arc::default();
    let record = Arc::clone(&seen);
    let decoder = move |img: &GrayImage| -> Result<EngineResult, EngineError> {
        record.lock().unwrap().push(img.dimensions());
        Ok(EngineResult::not_found())
    };

    // non-square so every quarter turn shows up in the dimensions
    let gray = GrayImage::from_pixel(40, 30, image::Luma([150]));
    let mut cascade = Cascade::new(
        &CascadeConfig::default(),
        Engines::new(decoder).without_locator(),
    );
    let result = run(&mut cascade, &gray);

    assert_eq!(result.outcome, DecodeOutcome::NotFound);
    assert_eq!(result.visited.len(), 5);
    assert_eq!(*seen.lock().unwrap(), vec![(30, 40), (40, 30), (30, 40)]);
}

#[test]
fn test_secondary_engine_rescues_unreadable_frame() {
    init_logging();
    let engines = Engines::new(never_decodes).with_scanner(
        |luma: &[u8], width: u32, height: u32| -> Result<Vec<Symbol>, EngineError> {
            assert_eq!(luma.len(), (width * height) as usize);
            Ok(vec![
                Symbol::new(SymbolKind::Ean8, "96385074"),
                Symbol::new(SymbolKind::QrCode, "from-scanner"),
            ])
        },
    );
    let mut cascade = Cascade::new(&CascadeConfig::default(), engines);
    let result = run(&mut cascade, &well_lit());

    assert_eq!(result.decided_by, Some(StageKind::SecondaryEngine));
    assert_eq!(result.outcome.text(), Some("from-scanner"));
}

#[test]
fn test_heuristic_reports_finder_region() {
    init_logging();
    let mut cascade = Cascade::new(&CascadeConfig::default(), Engines::new(never_decodes));
    let result = run(&mut cascade, &well_lit());

    assert_eq!(result.decided_by, Some(StageKind::Heuristic));
    // finder centers at 60 and 172, padded by 3.5 modules of 8 px
    assert_eq!(
        result.outcome,
        DecodeOutcome::NotFoundWithGeometry {
            points: vec![
                Point::new(32.0, 32.0),
                Point::new(200.0, 32.0),
                Point::new(32.0, 200.0),
            ],
        }
    );
}

#[test]
fn test_blank_frame_exhausts_silently() {
    let mut cascade = Cascade::new(&CascadeConfig::default(), Engines::new(reader()));
    let blank = GrayImage::from_pixel(232, 232, image::Luma([180]));
    let result = run(&mut cascade, &blank);

    assert_eq!(result.outcome, DecodeOutcome::NotFound);
    assert_eq!(result.decided_by, None);
    assert!(!result.cancelled);
}

#[test]
fn test_engine_faults_are_contained() {
    init_logging();
    let mut calls = 0;
    let flaky = move |_: &GrayImage| -> Result<EngineResult, EngineError> {
        calls += 1;
        match calls {
            1 => Err(EngineError::fault("camera buffer recycled")),
            2 => panic!("decoder crashed"),
            _ => Ok(EngineResult::not_found()),
        }
    };
    let engines = Engines::new(flaky).with_scanner(
        |_: &[u8], _: u32, _: u32| -> Result<Vec<Symbol>, EngineError> { panic!("scanner crashed") },
    );
    let mut cascade = Cascade::new(&CascadeConfig::default(), engines);
    let result = run(&mut cascade, &well_lit());

    // every engine stage failed one way or another; the locator still runs
    assert_eq!(result.visited.len(), 5);
    assert_eq!(result.decided_by, Some(StageKind::Heuristic));
}

#[test]
fn test_repeated_runs_agree() {
    let mut cascade = Cascade::new(&CascadeConfig::default(), Engines::new(reader()));
    let gray = glare();
    let first = run(&mut cascade, &gray);
    let second = run(&mut cascade, &gray);
    assert_eq!(first, second);
}
