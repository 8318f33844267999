//! Utility functions for image processing
//!
//! This module provides the pixel-level helpers the scheduler and cascade use:
//! - Grayscale conversion (NV21/RGB/RGBA frames to cropped luminance)
//! - Binarization (Otsu, global and adaptive mean thresholding)
//! - Transforms (rotation with point unmapping, brightness offsets)

pub mod binarization;
pub mod grayscale;
pub mod transform;
