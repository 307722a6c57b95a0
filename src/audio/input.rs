use super::device::AudioDevice;
use crate::{OratorError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The system default microphone
pub struct MicrophoneDevice {
    device: Option<Device>,
    config: Option<StreamConfig>,
    stream: Option<Stream>,
    is_recording: Arc<Mutex<bool>>,
}

impl MicrophoneDevice {
    /// Create a handle; the device is resolved on `request_permission`
    pub fn new() -> Self {
        Self {
            device: None,
            config: None,
            stream: None,
            is_recording: Arc::new(Mutex::new(false)),
        }
    }

    /// Get the number of channels the device records
    pub fn channels(&self) -> u16 {
        self.config.as_ref().map(|c| c.channels).unwrap_or(1)
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        *self.is_recording.lock()
    }
}

impl Default for MicrophoneDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for MicrophoneDevice {
    fn request_permission(&mut self) -> Result<()> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| OratorError::PermissionDenied("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| {
                OratorError::PermissionDenied(format!("Failed to get input config: {}", e))
            })?
            .into();

        self.device = Some(device);
        self.config = Some(config);
        Ok(())
    }

    fn open(&mut self, sink: Sender<Vec<f32>>) -> Result<()> {
        if *self.is_recording.lock() {
            warn!("Already recording");
            return Ok(());
        }

        let (Some(device), Some(config)) = (self.device.as_ref(), self.config.as_ref()) else {
            return Err(OratorError::DeviceUnavailable(
                "Input device was not initialized".into(),
            ));
        };

        let channels = config.channels as usize;
        let is_recording = Arc::clone(&self.is_recording);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_recording.lock() {
                        return;
                    }

                    // Convert to mono if necessary
                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if let Err(e) = sink.try_send(samples) {
                        debug!("Failed to send audio data: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                OratorError::DeviceUnavailable(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            OratorError::DeviceUnavailable(format!("Failed to start input stream: {}", e))
        })?;

        *self.is_recording.lock() = true;
        self.stream = Some(stream);

        info!("Started audio recording");
        Ok(())
    }

    fn close(&mut self) {
        *self.is_recording.lock() = false;

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped audio recording");
        }
    }

    fn sample_rate(&self) -> u32 {
        self.config.as_ref().map(|c| c.sample_rate.0).unwrap_or(16000)
    }
}

impl Drop for MicrophoneDevice {
    fn drop(&mut self) {
        self.close();
    }
}
