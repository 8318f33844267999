//! Where the worker delivers per-frame notices

use crate::models::DecodeOutcome;
use std::sync::mpsc::{self, Receiver, Sender};

/// Host callbacks, invoked from the worker thread only
pub trait ResultSink: Send {
    /// Once per processed frame, before any result
    fn on_brightness(&self, is_dark: bool);
    /// Terminal outcome of a frame that went through the cascade
    fn on_result(&self, outcome: DecodeOutcome);
}

/// One delivered notice, as seen by [`ChannelSink`] receivers
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Darkness notice
    Brightness(bool),
    /// Decode outcome
    Result(DecodeOutcome),
}

/// Forwards every notice over a `std::sync::mpsc` channel.
///
/// A dropped receiver is not an error; notices are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<SinkEvent>,
}

impl ChannelSink {
    /// Sink plus the receiving end
    pub fn new() -> (Self, Receiver<SinkEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn on_brightness(&self, is_dark: bool) {
        let _ = self.tx.send(SinkEvent::Brightness(is_dark));
    }

    fn on_result(&self, outcome: DecodeOutcome) {
        let _ = self.tx.send(SinkEvent::Result(outcome));
    }
}
