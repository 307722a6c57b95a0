use super::types::{
    Envelope, HealthStatus, SessionRecord, SessionSummary, UploadAck, UploadPayload,
    UploadRequest,
};
use super::AnalysisService;
use crate::audio::audio_format_tag;
use crate::config::ServiceConfig;
use crate::{OratorError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

/// HTTP implementation of `AnalysisService`
#[derive(Clone, Debug)]
pub struct HttpAnalysisClient {
    http: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate().map_err(OratorError::ConfigError)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| OratorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body
    ///
    /// Non-2xx answers become `TransportError` carrying the server's
    /// `error` field, or `fallback` when there is none.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OratorError::TransportError(format!("request timed out: {}", e))
            } else {
                OratorError::TransportError(format!("network unreachable: {}", e))
            }
        })?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        decode_body(status, body, fallback)
    }
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: Value, fallback: &str) -> Result<T> {
    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string());
        debug!("Analysis service answered {}: {}", status, message);
        return Err(OratorError::TransportError(message));
    }

    serde_json::from_value(body).map_err(|e| OratorError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn upload_recording(&self, request: UploadRequest) -> Result<UploadAck> {
        let payload = UploadPayload {
            session_id: &request.session_id,
            prompt: &request.prompt,
            prompt_index: request.prompt_index,
            audio_data: BASE64.encode(&request.artifact.bytes),
            audio_format: audio_format_tag(&request.artifact.content_type),
            timestamp: Utc::now().to_rfc3339(),
            response_time: request.response_time_ms,
            game_settings: &request.settings,
            word_to_integrate: request.word.as_ref().map(|w| w.word.as_str()),
            word_timestamp: request.word.as_ref().map(|w| w.timestamp_ms),
            audio_duration: request.word.as_ref().map(|w| w.audio_duration_secs),
        };

        // Any 2xx counts as an acknowledgment, even with an unexpected body
        let result = self
            .send::<Value>(
                self.http.post(self.url("/api/voice/upload")).json(&payload),
                "Upload failed",
            )
            .await
            .map(|body| serde_json::from_value::<UploadAck>(body).unwrap_or_default());

        match &result {
            Ok(_) => info!(
                "Uploaded {} bytes for prompt {} of {}",
                request.artifact.len(),
                request.prompt_index,
                request.session_id
            ),
            Err(e) => error!("Voice upload error: {}", e),
        }
        result
    }

    async fn complete_session(&self, session_id: &str, summary: &SessionSummary) -> Result<Value> {
        let envelope: Envelope<Value> = self
            .send(
                self.http
                    .post(self.url(&format!("/api/session/{}/complete", session_id)))
                    .json(summary),
                "Session completion failed",
            )
            .await
            .inspect_err(|e| error!("Session completion error: {}", e))?;

        match envelope.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(OratorError::TransportError(
                "No data received from server".into(),
            )),
        }
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionRecord> {
        let envelope: Envelope<SessionRecord> = self
            .send(
                self.http.get(self.url(&format!("/api/session/{}", session_id))),
                "Failed to get session",
            )
            .await
            .inspect_err(|e| error!("Get session error: {}", e))?;

        envelope
            .data
            .ok_or_else(|| OratorError::TransportError("No data received from server".into()))
    }

    async fn list_sessions(&self) -> Result<Value> {
        let envelope: Envelope<Value> = self
            .send(self.http.get(self.url("/api/sessions")), "Failed to list sessions")
            .await
            .inspect_err(|e| error!("List sessions error: {}", e))?;

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        self.send(self.http.get(self.url("/health")), "Health check failed")
            .await
            .inspect_err(|e| error!("Health check error: {}", e))
    }
}
