//! Session and step bookkeeping owned by the controller

use super::kind::{Cue, GameKind};
use crate::api::SessionSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One unit of an exercise
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Step {
    pub cue: Cue,
    pub responded: bool,
    pub uploaded: bool,
    /// Milliseconds between capture start and stop, once uploaded
    pub response_time_ms: Option<u64>,
    /// Milliseconds after session start when the cue was presented
    pub presented_at_ms: u64,
}

impl Step {
    pub fn new(cue: Cue, presented_at_ms: u64) -> Self {
        Self {
            cue,
            responded: false,
            uploaded: false,
            response_time_ms: None,
            presented_at_ms,
        }
    }

    /// Record a successful upload
    ///
    /// Returns false (and changes nothing) if the step was already answered.
    pub fn mark_uploaded(&mut self, response_time_ms: u64) -> bool {
        if self.response_time_ms.is_some() {
            return false;
        }
        self.responded = true;
        self.uploaded = true;
        self.response_time_ms = Some(response_time_ms);
        true
    }
}

/// One run of a game
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub id: String,
    pub kind: GameKind,
    pub steps: Vec<Step>,
    /// Steps that were begun
    pub attempted: usize,
    /// Steps whose recording was uploaded
    pub completed: usize,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(kind: GameKind, steps: Vec<Step>) -> Self {
        Self {
            id: generate_session_id(),
            kind,
            steps,
            attempted: 0,
            completed: 0,
            started_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn responded(&self) -> usize {
        self.steps.iter().filter(|s| s.responded).count()
    }

    /// Responded steps as a percentage of all steps, unrounded
    pub fn response_rate(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.responded() as f64 / self.steps.len() as f64 * 100.0
    }

    /// Mean of the measured response times, 0 when none was measured
    pub fn average_response_time_ms(&self) -> f64 {
        let measured: Vec<u64> = self
            .steps
            .iter()
            .filter_map(|s| s.response_time_ms)
            .collect();
        if measured.is_empty() {
            return 0.0;
        }
        measured.iter().sum::<u64>() as f64 / measured.len() as f64
    }

    /// Cues of steps that never got a response
    pub fn missed(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter(|s| !s.responded)
            .map(|s| s.cue.to_string())
            .collect()
    }

    /// Counters sent with the completion request
    pub fn summary(&self) -> SessionSummary {
        match self.kind {
            GameKind::RapidFire => SessionSummary::Prompts {
                total_prompts: self.total(),
                completed_prompts: self.completed,
            },
            GameKind::Conductor => SessionSummary::Transitions {
                total_transitions: self.total(),
                successful_transitions: self.completed,
            },
            GameKind::TripleStep => SessionSummary::Words {
                total_words: self.total(),
                integrated_words: self.completed,
            },
        }
    }
}

/// Client-generated session identifier
pub fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..9]
    )
}
