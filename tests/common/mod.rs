//! Scripted stand-ins for the microphone and the analysis service

#![allow(dead_code)]

use async_trait::async_trait;
use crossbeam_channel::Sender;
use orator::api::{
    AnalysisService, HealthStatus, RecoveredAnalysis, RecoveredStep, SessionRecord,
    SessionSummary, UploadAck, UploadRequest, WordPlacement,
};
use orator::audio::AudioDevice;
use orator::game::GameEvent;
use orator::{OratorError, Result};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const SAMPLE_RATE: u32 = 16000;

#[derive(Debug, Default)]
pub struct DeviceState {
    pub refuse_permission: bool,
    /// Zero-based open attempts that fail with `DeviceUnavailable`
    pub failing_opens: HashSet<usize>,
    pub open_attempts: usize,
    pub opens: usize,
    pub closes: usize,
    pub is_open: bool,
}

/// Microphone that pushes one chunk of silence per capture
#[derive(Clone, Default)]
pub struct ScriptedDevice {
    pub state: Arc<Mutex<DeviceState>>,
}

impl ScriptedDevice {
    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
        let device = Self::default();
        device.state.lock().failing_opens = attempts.into_iter().collect();
        device
    }

    pub fn refusing() -> Self {
        let device = Self::default();
        device.state.lock().refuse_permission = true;
        device
    }
}

impl AudioDevice for ScriptedDevice {
    fn request_permission(&mut self) -> Result<()> {
        if self.state.lock().refuse_permission {
            return Err(OratorError::PermissionDenied(
                "user dismissed the prompt".into(),
            ));
        }
        Ok(())
    }

    fn open(&mut self, sink: Sender<Vec<f32>>) -> Result<()> {
        let mut state = self.state.lock();
        let attempt = state.open_attempts;
        state.open_attempts += 1;
        if state.failing_opens.contains(&attempt) {
            return Err(OratorError::DeviceUnavailable("device busy".into()));
        }

        let _ = sink.send(vec![0.0; SAMPLE_RATE as usize / 10]);
        state.opens += 1;
        state.is_open = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.closes += 1;
        state.is_open = false;
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// What the scripted service saw of one upload
#[derive(Clone, Debug)]
pub struct SeenUpload {
    pub session_id: String,
    pub prompt: String,
    pub prompt_index: usize,
    pub response_time_ms: u64,
    pub audio_bytes: usize,
    pub settings: Map<String, Value>,
    pub word: Option<WordPlacement>,
}

#[derive(Debug, Default)]
pub struct ServiceState {
    pub uploads: Vec<SeenUpload>,
    /// Step indices whose upload fails
    pub failing_uploads: HashSet<usize>,
    /// Uploads never resolve
    pub hang_uploads: bool,
    /// Each upload takes this long to resolve
    pub upload_delay: Option<Duration>,
    /// Answers to successive completion requests; empty means failure
    pub completions: VecDeque<Result<Value>>,
    pub completion_calls: Vec<(String, SessionSummary)>,
    /// Record returned by `get_session`; `None` means failure
    pub recovered: Option<SessionRecord>,
    pub session_fetches: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedService {
    pub state: Arc<Mutex<ServiceState>>,
}

impl ScriptedService {
    pub fn completing_with(data: Value) -> Self {
        let service = Self::default();
        service.push_completion(Ok(data));
        service
    }

    pub fn push_completion(&self, answer: Result<Value>) {
        self.state.lock().completions.push_back(answer);
    }

    pub fn set_recovered(&self, record: SessionRecord) {
        self.state.lock().recovered = Some(record);
    }

    pub fn fail_uploads(&self, indices: impl IntoIterator<Item = usize>) {
        self.state.lock().failing_uploads.extend(indices);
    }

    pub fn slow_uploads(&self, delay: Duration) {
        self.state.lock().upload_delay = Some(delay);
    }

    pub fn uploads(&self) -> Vec<SeenUpload> {
        self.state.lock().uploads.clone()
    }

    pub fn completion_calls(&self) -> Vec<(String, SessionSummary)> {
        self.state.lock().completion_calls.clone()
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn upload_recording(&self, request: UploadRequest) -> Result<UploadAck> {
        if self.state.lock().hang_uploads {
            std::future::pending::<()>().await;
        }
        let delay = self.state.lock().upload_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_uploads.contains(&request.prompt_index) {
            return Err(OratorError::TransportError("Upload failed".into()));
        }
        state.uploads.push(SeenUpload {
            session_id: request.session_id,
            prompt: request.prompt,
            prompt_index: request.prompt_index,
            response_time_ms: request.response_time_ms,
            audio_bytes: request.artifact.len(),
            settings: request.settings,
            word: request.word,
        });
        Ok(UploadAck {
            success: Some(true),
            ..Default::default()
        })
    }

    async fn complete_session(&self, session_id: &str, summary: &SessionSummary) -> Result<Value> {
        let mut state = self.state.lock();
        state
            .completion_calls
            .push((session_id.to_string(), summary.clone()));
        state.completions.pop_front().unwrap_or_else(|| {
            Err(OratorError::TransportError(
                "Session completion failed".into(),
            ))
        })
    }

    async fn get_session(&self, _session_id: &str) -> Result<SessionRecord> {
        let mut state = self.state.lock();
        state.session_fetches += 1;
        state
            .recovered
            .clone()
            .ok_or_else(|| OratorError::TransportError("Failed to get session".into()))
    }

    async fn list_sessions(&self) -> Result<Value> {
        Ok(json!([]))
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(serde_json::from_value(json!({"status": "ok"})).expect("valid health body"))
    }
}

/// Completion data of a prompt game as the service would score it
pub fn prompt_results(total: usize, completed: usize) -> Value {
    json!({
        "total_prompts": total,
        "completed_prompts": completed,
        "response_rate": completed as f64 / total as f64 * 100.0,
        "avg_response_time": 4100.0,
        "avg_quality_score": 7.4,
        "score_breakdown": {"creativity": 7.0, "relevance": 8.0, "logic": 7.5, "clarity": 7.1},
        "category_breakdown": {"excellent": 1, "good": completed - 1, "fair": 0, "poor": 0},
        "top_responses": [{
            "prompt": "Time is like ___",
            "response": "a river that never flows backwards",
            "score": 9.1,
            "feedback": "Vivid and coherent"
        }],
        "missed_prompts": []
    })
}

/// A server record with `count` transcribed and analysed steps
pub fn recovered_steps(count: usize) -> SessionRecord {
    SessionRecord {
        prompts: (0..count)
            .map(|i| RecoveredStep {
                prompt: format!("Prompt {}", i),
                transcription: Some(format!("response {}", i)),
                analysis: Some(RecoveredAnalysis {
                    score: Some(6.0),
                    feedback: Some("Solid comparison".into()),
                }),
            })
            .collect(),
    }
}

pub fn drain(events: &mut UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

pub fn phases(events: &[GameEvent]) -> Vec<orator::game::GamePhase> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::PhaseChanged(phase) => Some(*phase),
            _ => None,
        })
        .collect()
}
