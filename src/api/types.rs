//! Request and response bodies exchanged with the analysis service

use crate::audio::AudioArtifact;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard response envelope: `{ "data": ..., "error": "..." }`
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where a word had to be woven into a continuous speech
#[derive(Clone, Debug, PartialEq)]
pub struct WordPlacement {
    pub word: String,
    /// Milliseconds since the session started when the word was shown
    pub timestamp_ms: u64,
    /// Seconds of audio captured for this word
    pub audio_duration_secs: f64,
}

/// One recorded response to upload
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub session_id: String,
    pub prompt: String,
    pub prompt_index: usize,
    pub artifact: AudioArtifact,
    pub response_time_ms: u64,
    pub settings: Map<String, Value>,
    pub word: Option<WordPlacement>,
}

/// Wire form of an `UploadRequest`
#[derive(Debug, Serialize)]
pub(crate) struct UploadPayload<'a> {
    pub session_id: &'a str,
    pub prompt: &'a str,
    pub prompt_index: usize,
    pub audio_data: String,
    pub audio_format: &'static str,
    pub timestamp: String,
    pub response_time: u64,
    pub game_settings: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_to_integrate: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<f64>,
}

/// Server acknowledgment of an upload
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Counters sent when a session is completed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionSummary {
    Prompts {
        total_prompts: usize,
        completed_prompts: usize,
    },
    Transitions {
        total_transitions: usize,
        successful_transitions: usize,
    },
    Words {
        total_words: usize,
        integrated_words: usize,
    },
}

/// Partial session record kept by the server
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub prompts: Vec<RecoveredStep>,
}

impl SessionRecord {
    /// Steps the server managed to transcribe
    pub fn transcribed(&self) -> impl Iterator<Item = &RecoveredStep> {
        self.prompts.iter().filter(|step| step.transcription.is_some())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecoveredStep {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub analysis: Option<RecoveredAnalysis>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecoveredAnalysis {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Health check answer
#[derive(Clone, Debug, Deserialize)]
pub struct HealthStatus {
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_serializes_flat() {
        let summary = SessionSummary::Prompts {
            total_prompts: 10,
            completed_prompts: 7,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"total_prompts": 10, "completed_prompts": 7})
        );

        let summary = SessionSummary::Transitions {
            total_transitions: 4,
            successful_transitions: 3,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"total_transitions": 4, "successful_transitions": 3})
        );
    }

    #[test]
    fn test_upload_payload_omits_word_fields() {
        let settings = Map::new();
        let payload = UploadPayload {
            session_id: "session_1",
            prompt: "Time is like ___",
            prompt_index: 2,
            audio_data: "AAAA".to_string(),
            audio_format: "wav",
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            response_time: 5000,
            game_settings: &settings,
            word_to_integrate: None,
            word_timestamp: None,
            audio_duration: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["prompt_index"], 2);
        assert_eq!(value["response_time"], 5000);
        assert!(value.get("word_to_integrate").is_none());
        assert!(value.get("audio_duration").is_none());
    }

    #[test]
    fn test_session_record_tolerates_missing_fields() {
        let envelope: Envelope<SessionRecord> = serde_json::from_value(json!({
            "data": {
                "prompts": [
                    {"prompt": "Trust is like ___", "transcription": "a bridge"},
                    {"prompt": "Change is like ___"}
                ]
            }
        }))
        .unwrap();

        let record = envelope.data.unwrap();
        assert_eq!(record.prompts.len(), 2);
        assert_eq!(record.transcribed().count(), 1);
        assert!(record.prompts[0].analysis.is_none());
    }

    #[test]
    fn test_envelope_error_only() {
        let envelope: Envelope<Value> =
            serde_json::from_value(json!({"error": "Session not found"})).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("Session not found"));
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus =
            serde_json::from_value(json!({"status": "healthy", "version": "1.2"})).unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.details["version"], "1.2");
    }
}
