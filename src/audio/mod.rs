//! Microphone capture: device backends, the capture lifecycle and WAV packaging

pub mod capture;
pub mod device;
#[cfg(feature = "audio-io")]
pub mod input;
pub mod wav;

pub use capture::{AudioArtifact, CaptureSession, CaptureStats, Recording};
pub use device::{AudioDevice, CaptureGrant};
#[cfg(feature = "audio-io")]
pub use input::MicrophoneDevice;
pub use wav::{audio_format_tag, encode_wav, WAV_CONTENT_TYPE};
