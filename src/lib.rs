//! rust_qr_stream - live camera frame scheduling for QR/barcode scanning
//!
//! Frames arrive from a camera callback at whatever rate the sensor runs.
//! A [`Scheduler`] admits at most one of them at a time into a single decode
//! worker, which measures brightness and then walks a staged decode cascade:
//!
//! 1. Primary: rotate 90 degrees clockwise and decode as is
//! 2. Threshold: rotate 180 degrees, lift dim frames, Otsu-binarize
//! 3. Adaptive: rotate 90 degrees counter-clockwise, darken, local mean threshold
//! 4. Secondary engine: hand the raw luma to another scanner (QR only)
//! 5. Heuristic: locate finder patterns without decoding
//!
//! Decoding itself is delegated to the engines in [`Engines`]; this crate
//! owns the admission policy, the enhancements and the fallback order.
//!
//! ```no_run
//! use rust_qr_stream::{ChannelSink, EngineError, Engines, ScanConfig, Scheduler};
//! use rust_qr_stream::models::EngineResult;
//!
//! let decoder = |_: &image::GrayImage| -> Result<EngineResult, EngineError> {
//!     Ok(EngineResult::not_found())
//! };
//! let (sink, events) = ChannelSink::new();
//! let scheduler = Scheduler::new(ScanConfig::default(), Engines::new(decoder), sink);
//! scheduler.start().unwrap();
//! // camera callback: scheduler.submit_nv21(&buf, 0, 0, 0, 0, 640, 480)
//! # drop(events);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Luminance pre-filter
pub mod brightness;
/// Staged enhancement + decode chain
pub mod cascade;
/// TOML/env configuration
pub mod config;
mod debug;
/// Finder-pattern region location
pub mod detector;
/// External engine seams and fault containment
pub mod engine;
/// Error types
pub mod error;
/// Core data structures (Frame, DecodeOutcome, Point, Rect, etc.)
pub mod models;
/// Frame intake and the decode worker
pub mod scheduler;
/// Synthetic frames and a reference decoder
pub mod tools;
/// Utility functions (grayscale, binarization, transforms)
pub mod utils;

pub use brightness::{BrightnessGate, BrightnessState, GateDecision};
pub use cascade::{Cascade, CascadeRun, StageKind};
pub use config::{BrightnessConfig, CascadeConfig, ConfigError, ScanConfig};
pub use engine::{Engines, MatrixDecoder, RegionLocator, SymbolScanner};
pub use error::{EngineError, FrameError, SchedulerError};
pub use models::{DecodeOutcome, Frame, PixelFormat};
pub use scheduler::{Admission, ChannelSink, ResultSink, Scheduler, SchedulerState, SinkEvent};
