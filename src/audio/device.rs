//! Capture backend abstraction
//!
//! An `AudioDevice` only knows how to ask for access and push mono f32
//! chunks into a channel. Buffering, timing and packaging live in
//! `CaptureSession`.

use crate::Result;
use crossbeam_channel::Sender;

/// Proof that microphone access was granted
///
/// Only `CaptureSession::request_permission` can mint one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureGrant {
    _private: (),
}

impl CaptureGrant {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// A source of microphone audio
pub trait AudioDevice {
    /// Ask for access to the device
    ///
    /// Fails with `PermissionDenied` when access is refused.
    fn request_permission(&mut self) -> Result<()>;

    /// Acquire the stream and start pushing mono chunks into `sink`
    ///
    /// Fails with `DeviceUnavailable` when the stream cannot be acquired.
    fn open(&mut self, sink: Sender<Vec<f32>>) -> Result<()>;

    /// Release the stream; chunks already sent stay in the channel
    fn close(&mut self);

    /// Sample rate of the chunks pushed by `open`
    fn sample_rate(&self) -> u32;
}
