//! The five cascade stages.
//!
//! The three matrix stages each try one orientation and one enhancement of
//! the gray baseline. The last two fall back to other engines.

use super::StageKind;
use crate::brightness::BrightnessState;
use crate::engine::{Engines, guarded};
use crate::error::EngineError;
use crate::models::{BarcodeFormat, DecodeOutcome, SymbolKind};
use crate::utils::binarization::{adaptive_mean_binarize, otsu_binarize};
use crate::utils::transform::{Rotation, adjust_brightness};
use image::GrayImage;
use std::fmt;
use tracing::{trace, warn};

/// What every stage sees: the cropped gray baseline and its brightness
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    /// Un-rotated, un-enhanced gray image
    pub gray: &'a GrayImage,
    /// Brightness measured by the gate
    pub brightness: BrightnessState,
}

/// Result of one stage; dropped before the next stage runs
#[derive(Debug, Clone)]
pub struct CascadeAttempt {
    /// Stage that produced this attempt
    pub stage: StageKind,
    /// Image handed to the engine, when the stage derived one
    pub enhanced: Option<GrayImage>,
    /// What the stage concluded
    pub outcome: DecodeOutcome,
}

/// One enhancement + decode attempt
pub trait Stage: Send {
    /// Which stage this is
    fn kind(&self) -> StageKind;

    /// Run against `input` using the shared engines. Must not panic on
    /// engine failure; faults are reported as `NotFound`.
    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt;
}

/// Rotate 90 degrees clockwise, decode as is
#[derive(Debug, Clone, Default)]
pub struct PrimaryStage;

impl Stage for PrimaryStage {
    fn kind(&self) -> StageKind {
        StageKind::Primary
    }

    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt {
        let rotation = Rotation::Clockwise90;
        let enhanced = rotation.apply(input.gray);
        decode_matrix(self.kind(), engines, enhanced, rotation, input.gray)
    }
}

/// Rotate 180 degrees, lift dim frames, Otsu-binarize
#[derive(Debug, Clone)]
pub struct ThresholdStage {
    /// Boost applies when brightness is below this
    pub boost_below: f64,
    /// Exposure boost for dim frames
    pub boost_amount: i32,
    /// Level used when the histogram has a single intensity
    pub fallback_level: u8,
}

impl Stage for ThresholdStage {
    fn kind(&self) -> StageKind {
        StageKind::Threshold
    }

    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt {
        let rotation = Rotation::Half;
        let mut rotated = rotation.apply(input.gray);
        if input.brightness.mean < self.boost_below {
            rotated = adjust_brightness(&rotated, self.boost_amount);
        }
        let enhanced = otsu_binarize(&rotated, self.fallback_level);
        decode_matrix(self.kind(), engines, enhanced, rotation, input.gray)
    }
}

/// Rotate 90 degrees counter-clockwise, darken, local mean threshold
#[derive(Debug, Clone)]
pub struct AdaptiveStage {
    /// Exposure reduction, subtracted from every pixel
    pub darken_amount: i32,
    /// Odd window size in pixels
    pub block_size: u32,
    /// Subtracted from the local mean before comparing
    pub offset: i32,
}

impl Stage for AdaptiveStage {
    fn kind(&self) -> StageKind {
        StageKind::Adaptive
    }

    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt {
        let rotation = Rotation::CounterClockwise90;
        let rotated = rotation.apply(input.gray);
        let darkened = adjust_brightness(&rotated, -self.darken_amount);
        let enhanced = adaptive_mean_binarize(&darkened, self.block_size, self.offset);
        decode_matrix(self.kind(), engines, enhanced, rotation, input.gray)
    }
}

/// Hand the raw luma to the secondary scanner, accept QR symbols only
#[derive(Debug, Clone, Default)]
pub struct SecondaryEngineStage;

impl Stage for SecondaryEngineStage {
    fn kind(&self) -> StageKind {
        StageKind::SecondaryEngine
    }

    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt {
        let kind = self.kind();
        let Some(scanner) = engines.scanner.as_mut() else {
            trace!(stage = %kind, "no secondary scanner configured");
            return CascadeAttempt::not_found(kind);
        };

        let (width, height) = input.gray.dimensions();
        let luma = input.gray.as_raw();
        let symbols = demote(kind, guarded(|| scanner.scan(luma, width, height)));

        let outcome = symbols
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.kind == SymbolKind::QrCode && !s.text.is_empty())
            .map(|s| DecodeOutcome::Success {
                text: s.text,
                format: BarcodeFormat::QrCode,
                points: Vec::new(),
            })
            .unwrap_or(DecodeOutcome::NotFound);

        CascadeAttempt {
            stage: kind,
            enhanced: None,
            outcome,
        }
    }
}

/// Locate a code-shaped region without decoding it
#[derive(Debug, Clone, Default)]
pub struct HeuristicStage;

impl Stage for HeuristicStage {
    fn kind(&self) -> StageKind {
        StageKind::Heuristic
    }

    fn attempt(&mut self, input: &StageInput<'_>, engines: &mut Engines) -> CascadeAttempt {
        let kind = self.kind();
        let Some(locator) = engines.locator.as_mut() else {
            return CascadeAttempt::not_found(kind);
        };

        let region = demote(kind, guarded(|| locator.locate(input.gray))).flatten();
        let outcome = match region {
            Some(rect) if !rect.is_empty() => DecodeOutcome::NotFoundWithGeometry {
                points: vec![rect.top_left(), rect.top_right(), rect.bottom_left()],
            },
            _ => {
                trace!(stage = %kind, "no code-shaped region");
                DecodeOutcome::NotFound
            }
        };

        CascadeAttempt {
            stage: kind,
            enhanced: None,
            outcome,
        }
    }
}

impl CascadeAttempt {
    fn not_found(stage: StageKind) -> Self {
        Self {
            stage,
            enhanced: None,
            outcome: DecodeOutcome::NotFound,
        }
    }
}

/// Feed `enhanced` to the matrix decoder and map its points back onto `gray`
fn decode_matrix(
    stage: StageKind,
    engines: &mut Engines,
    enhanced: GrayImage,
    rotation: Rotation,
    gray: &GrayImage,
) -> CascadeAttempt {
    let outcome = read_matrix(stage, engines, &enhanced, rotation, gray.dimensions());
    CascadeAttempt {
        stage,
        enhanced: Some(enhanced),
        outcome,
    }
}

/// One guarded matrix decode of `image`, which is `base` (`width x height`)
/// turned by `rotation`. Points come back in `base` coordinates.
pub(crate) fn read_matrix(
    label: impl fmt::Display,
    engines: &mut Engines,
    image: &GrayImage,
    rotation: Rotation,
    (width, height): (u32, u32),
) -> DecodeOutcome {
    let matrix = &mut engines.matrix;
    let Some(result) = demote(label, guarded(|| matrix.decode(image))) else {
        return DecodeOutcome::NotFound;
    };
    if !result.is_valid() {
        return DecodeOutcome::NotFound;
    }

    let points = result
        .points
        .iter()
        .map(|&p| rotation.unmap_point(p, width, height))
        .collect();
    match (result.text, result.format) {
        (Some(text), Some(format)) => DecodeOutcome::Success {
            text,
            format,
            points,
        },
        _ => DecodeOutcome::NotFound,
    }
}

/// Log an engine fault and treat it as a miss
fn demote<T>(stage: impl fmt::Display, result: Result<T, EngineError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(stage = %stage, %error, "engine fault, treating stage as not found");
            None
        }
    }
}
