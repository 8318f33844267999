//! Ordered fallback chain of enhancement + decode attempts.
//!
//! Stages run in a fixed order and the chain stops at the first terminal
//! outcome. Only one frame is ever in the cascade at a time.

/// Individual stage implementations
pub mod stages;

use crate::brightness::BrightnessState;
use crate::config::CascadeConfig;
use crate::engine::Engines;
use crate::models::DecodeOutcome;
use crate::utils::transform::Rotation;
use image::GrayImage;
use stages::{
    AdaptiveStage, HeuristicStage, PrimaryStage, SecondaryEngineStage, Stage, StageInput,
    ThresholdStage,
};
use std::fmt;
use tracing::debug;

/// Identifies a cascade stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Rotated 90 degrees clockwise, no enhancement
    Primary,
    /// Rotated 180 degrees, optional boost, Otsu threshold
    Threshold,
    /// Rotated 90 degrees counter-clockwise, darkened, adaptive threshold
    Adaptive,
    /// Secondary scan engine, QR symbols only
    SecondaryEngine,
    /// Region locator, geometry only
    Heuristic,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Primary => "primary",
            StageKind::Threshold => "threshold",
            StageKind::Adaptive => "adaptive",
            StageKind::SecondaryEngine => "secondary_engine",
            StageKind::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

/// Summary of one cascade run
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeRun {
    /// Terminal outcome, or `NotFound` after exhaustion or cancellation
    pub outcome: DecodeOutcome,
    /// Stage that produced the terminal outcome
    pub decided_by: Option<StageKind>,
    /// Stages that ran, in order
    pub visited: Vec<StageKind>,
    /// The run was stopped before every stage had a chance
    pub cancelled: bool,
}

/// The decode cascade and the engines it owns
pub struct Cascade {
    stages: Vec<Box<dyn Stage>>,
    engines: Engines,
    runs: u64,
}

impl Cascade {
    /// The default five-stage chain
    pub fn new(config: &CascadeConfig, engines: Engines) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(PrimaryStage),
            Box::new(ThresholdStage {
                boost_below: config.boost_below,
                boost_amount: config.boost_amount,
                fallback_level: config.threshold_base,
            }),
            Box::new(AdaptiveStage {
                darken_amount: config.darken_amount,
                block_size: config.adaptive_block_size,
                offset: config.adaptive_offset,
            }),
            Box::new(SecondaryEngineStage),
            Box::new(HeuristicStage),
        ];
        Self::with_stages(stages, engines)
    }

    /// A custom chain, run in the given order
    pub fn with_stages(stages: Vec<Box<dyn Stage>>, engines: Engines) -> Self {
        Self {
            stages,
            engines,
            runs: 0,
        }
    }

    /// Stage order of this chain
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Decode a still image with the matrix engine alone: one attempt, no
    /// rotation, no enhancement, no fallback stages
    pub fn read_still(&mut self, gray: &GrayImage) -> DecodeOutcome {
        let outcome = stages::read_matrix(
            "still",
            &mut self.engines,
            gray,
            Rotation::None,
            gray.dimensions(),
        );
        if let DecodeOutcome::Success { format, .. } = &outcome {
            debug!(%format, "still image decoded");
        }
        outcome
    }

    /// Run the chain over one gray frame.
    ///
    /// `keep_going` is polled before every stage; once it returns false the
    /// run ends with `cancelled` set and a `NotFound` outcome.
    pub fn run(
        &mut self,
        gray: &GrayImage,
        brightness: BrightnessState,
        mut keep_going: impl FnMut() -> bool,
    ) -> CascadeRun {
        self.runs += 1;
        let input = StageInput { gray, brightness };
        let mut visited = Vec::with_capacity(self.stages.len());

        for stage in self.stages.iter_mut() {
            if !keep_going() {
                debug!(visited = visited.len(), "cascade cancelled");
                return CascadeRun {
                    outcome: DecodeOutcome::NotFound,
                    decided_by: None,
                    visited,
                    cancelled: true,
                };
            }

            let kind = stage.kind();
            debug!(stage = %kind, "running stage");
            let attempt = stage.attempt(&input, &mut self.engines);
            visited.push(kind);

            if let Some(enhanced) = &attempt.enhanced {
                crate::debug::dump_stage_image(&format!("run{:06}_{kind}", self.runs), enhanced);
            }

            if attempt.outcome.is_terminal() {
                if let DecodeOutcome::Success { format, .. } = &attempt.outcome {
                    debug!(stage = %kind, %format, "decoded");
                }
                return CascadeRun {
                    outcome: attempt.outcome,
                    decided_by: Some(kind),
                    visited,
                    cancelled: false,
                };
            }
        }

        CascadeRun {
            outcome: DecodeOutcome::NotFound,
            decided_by: None,
            visited,
            cancelled: false,
        }
    }
}
