//! Frame intake and the single decode worker.
//!
//! Producers call [`Scheduler::submit`] from any thread. A frame that arrives
//! while the worker is busy is dropped on the spot; a frame that arrives while
//! the worker is idle replaces whatever was waiting. At most one frame is in
//! the cascade and at most one is waiting.

/// Single-slot frame storage
pub mod buffer;
/// Result delivery
pub mod sink;

pub use buffer::{BufferPut, FrameBuffer};
pub use sink::{ChannelSink, ResultSink, SinkEvent};

use crate::brightness::BrightnessGate;
use crate::cascade::Cascade;
use crate::config::ScanConfig;
use crate::engine::{Engines, panic_message};
use crate::error::{FrameError, SchedulerError};
use crate::models::{CropRect, DecodeOutcome, Frame, PixelFormat};
use crate::utils::grayscale::frame_to_gray;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

const WORKER_NAME: &str = "qr-stream-worker";

/// Lifecycle of the decode worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for a frame
    Idle,
    /// A frame is in the pipeline; new frames are dropped
    Processing,
    /// Not accepting frames
    Stopped,
}

/// Verdict for one submitted frame. Producers are never blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Queued into an empty slot
    Stored,
    /// Queued, discarding an older waiting frame
    Replaced,
    /// Dropped because a frame is being processed
    DroppedBusy,
    /// Dropped because the scheduler is stopped
    DroppedStopped,
}

impl Admission {
    /// True when the frame will be processed (unless replaced first)
    pub fn is_queued(self) -> bool {
        matches!(self, Admission::Stored | Admission::Replaced)
    }
}

struct Intake {
    state: SchedulerState,
    buffer: FrameBuffer,
}

/// Everything the worker needs to turn a frame into notices
struct Pipeline {
    gate: BrightnessGate,
    cascade: Cascade,
    sink: Box<dyn ResultSink>,
    report_exhaustion: bool,
}

struct Shared {
    intake: Mutex<Intake>,
    frame_ready: Condvar,
    pipeline: Mutex<Pipeline>,
}

/// Admission policy plus one long-lived decode worker.
///
/// `Scheduler` is `Send + Sync`; share it behind an `Arc` between camera
/// callbacks and lifecycle code.
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// A stopped scheduler; call [`start`](Self::start) to begin decoding
    pub fn new(config: ScanConfig, engines: Engines, sink: impl ResultSink + 'static) -> Self {
        let pipeline = Pipeline {
            gate: BrightnessGate::new(&config.brightness),
            cascade: Cascade::new(&config.cascade, engines),
            sink: Box::new(sink),
            report_exhaustion: config.cascade.report_exhaustion,
        };
        let mut buffer = FrameBuffer::new();
        buffer.set_enabled(false);

        Self {
            shared: Arc::new(Shared {
                intake: Mutex::new(Intake {
                    state: SchedulerState::Stopped,
                    buffer,
                }),
                frame_ready: Condvar::new(),
                pipeline: Mutex::new(pipeline),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the worker and begin accepting frames.
    ///
    /// After a [`stop`](Self::stop) the previous worker is joined first. If
    /// it is still inside an engine call, `start` blocks until that call
    /// returns, so a hung engine blocks the caller here too.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut worker = lock(&self.worker);
        if lock(&self.shared.intake).state != SchedulerState::Stopped {
            return Err(SchedulerError::AlreadyRunning);
        }

        // a previous worker may still be finishing its last engine call
        if let Some(previous) = worker.take() {
            join_worker(previous);
        }

        {
            let mut intake = lock(&self.shared.intake);
            intake.state = SchedulerState::Idle;
            intake.buffer.set_enabled(true);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || worker_loop(shared));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!("decode worker started");
                Ok(())
            }
            Err(e) => {
                let mut intake = lock(&self.shared.intake);
                intake.state = SchedulerState::Stopped;
                intake.buffer.set_enabled(false);
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Offer a frame. Never blocks on the worker.
    pub fn submit(&self, frame: Frame) -> Admission {
        let admission = {
            let mut intake = lock(&self.shared.intake);
            match intake.state {
                SchedulerState::Processing => Admission::DroppedBusy,
                SchedulerState::Stopped => Admission::DroppedStopped,
                SchedulerState::Idle => match intake.buffer.submit(frame) {
                    BufferPut::Stored => Admission::Stored,
                    BufferPut::Replaced => Admission::Replaced,
                    // intake is only disabled while stopped
                    BufferPut::Disabled => Admission::DroppedStopped,
                },
            }
        };

        if admission.is_queued() {
            self.shared.frame_ready.notify_one();
        } else {
            trace!(?admission, "frame dropped");
        }
        admission
    }

    /// Raw camera ingress for NV21 buffers.
    ///
    /// Only the luma plane is read. A zero `crop_width` or `crop_height`
    /// means the whole frame. The buffer is copied only if the frame can be
    /// admitted.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_nv21(
        &self,
        pixels: &[u8],
        crop_left: u32,
        crop_top: u32,
        crop_width: u32,
        crop_height: u32,
        source_width: u32,
        source_height: u32,
    ) -> Result<Admission, FrameError> {
        match self.state() {
            SchedulerState::Processing => {
                trace!("nv21 frame dropped while busy");
                return Ok(Admission::DroppedBusy);
            }
            SchedulerState::Stopped => return Ok(Admission::DroppedStopped),
            SchedulerState::Idle => {}
        }

        let mut frame = Frame::copy_from(pixels, PixelFormat::Nv21, source_width, source_height)?;
        if crop_width != 0 && crop_height != 0 {
            frame = frame.with_crop(CropRect::new(crop_left, crop_top, crop_width, crop_height))?;
        }
        Ok(self.submit(frame))
    }

    /// Stop accepting frames and discard the waiting one.
    ///
    /// An engine call already in flight is not interrupted; the cascade
    /// notices the stop before its next stage and reports nothing.
    pub fn stop(&self) {
        let was = {
            let mut intake = lock(&self.shared.intake);
            let was = intake.state;
            intake.state = SchedulerState::Stopped;
            intake.buffer.set_enabled(false);
            was
        };
        self.shared.frame_ready.notify_all();
        if was != SchedulerState::Stopped {
            info!(previous = ?was, "scheduler stopped");
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        lock(&self.shared.intake).state
    }

    /// Decode one still frame on the calling thread.
    ///
    /// Bypasses the frame buffer, the admission policy and the brightness
    /// gate. The frame's crop and color reduction run as for camera frames,
    /// then the matrix engine gets a single attempt with no rotation or
    /// enhancement. Works in any state; waits for the worker's current frame
    /// since both use the same engines. Nothing is sent to the sink.
    pub fn read_frame(&self, frame: &Frame) -> DecodeOutcome {
        let gray = frame_to_gray(frame);
        lock(&self.shared.pipeline).cascade.read_still(&gray)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            join_worker(handle);
        }
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("decode worker exited with a panic");
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let frame = {
            let mut intake = lock(&shared.intake);
            loop {
                if intake.state == SchedulerState::Stopped {
                    info!("decode worker exiting");
                    return;
                }
                if let Some(frame) = intake.buffer.take() {
                    intake.state = SchedulerState::Processing;
                    break frame;
                }
                intake = shared
                    .frame_ready
                    .wait(intake)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        shared.process(frame);

        let mut intake = lock(&shared.intake);
        if intake.state == SchedulerState::Processing {
            intake.state = SchedulerState::Idle;
        }
    }
}

impl Shared {
    fn keep_going(&self) -> bool {
        lock(&self.intake).state != SchedulerState::Stopped
    }

    fn process(&self, frame: Frame) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut pipeline = lock(&self.pipeline);
            pipeline.handle(frame, || self.keep_going());
        }));
        if let Err(payload) = result {
            error!(panic = %panic_message(payload.as_ref()), "frame pipeline panicked");
        }
    }
}

impl Pipeline {
    fn handle(&mut self, frame: Frame, keep_going: impl FnMut() -> bool) {
        let gray = frame_to_gray(&frame);
        drop(frame);

        let decision = self.gate.analyze(&gray);
        debug!(
            mean = decision.brightness.mean,
            is_dark = decision.is_dark,
            proceed = decision.proceed,
            "brightness gate"
        );
        self.sink.on_brightness(decision.is_dark);
        if !decision.proceed {
            return;
        }

        let run = self.cascade.run(&gray, decision.brightness, keep_going);
        if run.cancelled {
            return;
        }
        match run.outcome {
            DecodeOutcome::NotFound if !self.report_exhaustion => {
                trace!(stages = run.visited.len(), "cascade exhausted");
            }
            outcome => self.sink.on_result(outcome),
        }
    }
}
