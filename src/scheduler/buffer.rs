//! Single-slot, most-recent-wins frame storage

use crate::models::Frame;

/// What happened to a frame handed to [`FrameBuffer::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPut {
    /// Slot was empty
    Stored,
    /// An older waiting frame was discarded
    Replaced,
    /// Buffer is disabled; the frame was dropped
    Disabled,
}

/// Holds at most one pending frame. Never blocks, never decodes.
#[derive(Debug)]
pub struct FrameBuffer {
    slot: Option<Frame>,
    enabled: bool,
}

impl FrameBuffer {
    /// An enabled, empty buffer
    pub fn new() -> Self {
        Self {
            slot: None,
            enabled: true,
        }
    }

    /// Store `frame`, overwriting whatever is waiting
    pub fn submit(&mut self, frame: Frame) -> BufferPut {
        if !self.enabled {
            return BufferPut::Disabled;
        }
        match self.slot.replace(frame) {
            Some(_) => BufferPut::Replaced,
            None => BufferPut::Stored,
        }
    }

    /// Remove and return the waiting frame
    pub fn take(&mut self) -> Option<Frame> {
        self.slot.take()
    }

    /// Enable or disable intake; disabling also discards the waiting frame
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.slot = None;
        }
    }

    /// Discard the waiting frame
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// True when no frame is waiting
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Whether submissions are accepted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
