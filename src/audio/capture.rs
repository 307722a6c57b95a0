use super::device::{AudioDevice, CaptureGrant};
use super::wav::{encode_wav, WAV_CONTENT_TYPE};
use crate::{OratorError, Result};
use crossbeam_channel::{unbounded, Receiver};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A finalized recording payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl AudioArtifact {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a completed capture
#[derive(Clone, Debug)]
pub struct Recording {
    pub artifact: AudioArtifact,
    /// Wall-clock time between `start()` and `stop()`
    pub elapsed: Duration,
    /// Length of the captured audio itself
    pub audio_duration: Duration,
}

impl Recording {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Counters for checking that every start was matched by a stop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub starts: u64,
    pub stops: u64,
}

struct ActiveCapture {
    started_at: Instant,
    chunks: Receiver<Vec<f32>>,
}

/// Capture lifecycle over an `AudioDevice`
///
/// At most one capture is active at a time.
pub struct CaptureSession<D: AudioDevice> {
    device: D,
    grant: Option<CaptureGrant>,
    active: Option<ActiveCapture>,
    stats: CaptureStats,
}

impl<D: AudioDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            grant: None,
            active: None,
            stats: CaptureStats::default(),
        }
    }

    /// Ask the device for access and remember the grant
    pub fn request_permission(&mut self) -> Result<CaptureGrant> {
        if let Some(grant) = self.grant {
            return Ok(grant);
        }

        match self.device.request_permission() {
            Ok(()) => {
                info!("Microphone access granted");
                let grant = CaptureGrant::new();
                self.grant = Some(grant);
                Ok(grant)
            }
            Err(e) => {
                warn!("Microphone access refused: {}", e);
                Err(match e {
                    OratorError::PermissionDenied(_) => e,
                    other => OratorError::PermissionDenied(other.to_string()),
                })
            }
        }
    }

    pub fn grant(&self) -> Option<CaptureGrant> {
        self.grant
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Start capturing
    pub fn start(&mut self) -> Result<()> {
        if self.grant.is_none() {
            return Err(OratorError::PermissionDenied(
                "microphone access has not been granted".into(),
            ));
        }

        if self.active.is_some() {
            warn!("Capture already active, ignoring start");
            return Ok(());
        }

        let (tx, rx) = unbounded();
        self.device.open(tx).map_err(|e| match e {
            OratorError::DeviceUnavailable(_) | OratorError::PermissionDenied(_) => e,
            other => OratorError::DeviceUnavailable(other.to_string()),
        })?;

        self.active = Some(ActiveCapture {
            started_at: Instant::now(),
            chunks: rx,
        });
        self.stats.starts += 1;
        debug!("Capture started");
        Ok(())
    }

    /// Stop capturing and package everything buffered since `start()`
    ///
    /// Returns `Ok(None)` when no capture was active.
    pub fn stop(&mut self) -> Result<Option<Recording>> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };

        self.device.close();
        self.stats.stops += 1;
        let elapsed = active.started_at.elapsed();

        let samples: Vec<f32> = active.chunks.try_iter().flatten().collect();
        let sample_rate = self.device.sample_rate();
        let audio_duration = if sample_rate > 0 {
            Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64)
        } else {
            Duration::ZERO
        };

        let bytes = encode_wav(&samples, sample_rate, 1)?;
        debug!(
            "Capture stopped after {}ms with {} samples",
            elapsed.as_millis(),
            samples.len()
        );

        Ok(Some(Recording {
            artifact: AudioArtifact::new(bytes, WAV_CONTENT_TYPE),
            elapsed,
            audio_duration,
        }))
    }

    /// Stop without packaging, used when a session is thrown away
    pub fn discard(&mut self) {
        if self.active.take().is_some() {
            self.device.close();
            self.stats.stops += 1;
            debug!("Capture discarded");
        }
    }
}
