//! Luminance pre-filter deciding whether a frame is worth decoding

use crate::config::BrightnessConfig;
use image::GrayImage;

/// Mean luminance of one frame. Recomputed per frame, never smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrightnessState {
    /// Mean pixel value in `0.0..=255.0`
    pub mean: f64,
}

/// Verdict of [`BrightnessGate::analyze`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// Measured brightness
    pub brightness: BrightnessState,
    /// Reported to the sink as the darkness notice
    pub is_dark: bool,
    /// Whether the cascade should run
    pub proceed: bool,
}

/// Two-threshold brightness gate
#[derive(Debug, Clone)]
pub struct BrightnessGate {
    dark_threshold: f64,
    abandon_threshold: f64,
}

impl BrightnessGate {
    /// Build a gate from configuration
    pub fn new(config: &BrightnessConfig) -> Self {
        Self {
            dark_threshold: config.dark_threshold,
            abandon_threshold: config.abandon_threshold,
        }
    }

    /// Measure `image` and decide whether it reaches the cascade
    pub fn analyze(&self, image: &GrayImage) -> GateDecision {
        let brightness = BrightnessState {
            mean: mean_luminance(image),
        };
        GateDecision {
            brightness,
            is_dark: brightness.mean < self.dark_threshold,
            proceed: brightness.mean >= self.abandon_threshold,
        }
    }
}

impl Default for BrightnessGate {
    fn default() -> Self {
        Self::new(&BrightnessConfig::default())
    }
}

/// Mean pixel value; 0 for an empty image
pub fn mean_luminance(image: &GrayImage) -> f64 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&p| p as u64).sum();
    sum as f64 / raw.len() as f64
}
