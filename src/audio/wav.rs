use crate::{OratorError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Content type of the artifacts produced by `encode_wav`
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Encode audio samples into an in-memory WAV file
///
/// # Arguments
/// * `samples` - Audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            OratorError::AudioProcessingError(format!("Failed to create WAV writer: {}", e))
        })?;

        // Convert f32 samples to i16
        for &sample in samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(sample_i16).map_err(|e| {
                OratorError::AudioProcessingError(format!("Failed to write sample: {}", e))
            })?;
        }

        writer.finalize().map_err(|e| {
            OratorError::AudioProcessingError(format!("Failed to finalize WAV data: {}", e))
        })?;
    }

    let bytes = cursor.into_inner();
    debug!("Encoded {} samples into {} WAV bytes", samples.len(), bytes.len());
    Ok(bytes)
}

/// Map a MIME type to the short format tag the analysis service expects
pub fn audio_format_tag(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" | "audio/webm;codecs=opus" => "webm",
        "audio/mp4" => "m4a",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        _ => "webm",
    }
}
