//! Error types shared across the crate

/// Errors raised while building a [`Frame`](crate::models::Frame) from
/// caller-supplied pixels.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Source width or height is zero
    #[error("frame has zero width or height")]
    ZeroDimension,
    /// Pixel buffer is shorter than the format requires
    #[error("pixel buffer too short: got {got} bytes, expected at least {expected}")]
    BufferTooShort {
        /// Bytes supplied
        got: usize,
        /// Bytes required
        expected: usize,
    },
    /// Crop origin outside the source, or crop with zero size
    #[error(
        "crop {left},{top} {width}x{height} does not fit a {source_width}x{source_height} frame"
    )]
    #[allow(missing_docs)]
    CropOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },
}

/// Fault reported by, or caught around, an external decode engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine returned an error
    #[error("engine fault: {0}")]
    Fault(String),
    /// The engine panicked; the panic was contained
    #[error("engine panicked: {0}")]
    Panicked(String),
}

impl EngineError {
    /// Convenience constructor for engine implementations
    pub fn fault(msg: impl Into<String>) -> Self {
        EngineError::Fault(msg.into())
    }
}

/// Errors from scheduler lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// `start` was called while a worker is already running
    #[error("scheduler is already running")]
    AlreadyRunning,
    /// The worker thread could not be spawned
    #[error("failed to spawn decode worker: {0}")]
    Spawn(#[from] std::io::Error),
}
