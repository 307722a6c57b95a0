//! Results of a finished session
//!
//! Results are either trusted server output or a fallback synthesized from
//! what the controller tracked locally. The fallback builder is a pure
//! function so it can be tested without any network.

use super::kind::GameKind;
use super::session::Session;
use crate::api::SessionRecord;
use crate::{OratorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Quality score used when no analysis is available
pub const NEUTRAL_SCORE: f64 = 5.0;

const MAX_TOP_RESPONSES: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBreakdown {
    pub creativity: f64,
    pub relevance: f64,
    pub logic: f64,
    pub clarity: f64,
}

impl ScoreBreakdown {
    pub fn neutral() -> Self {
        Self {
            creativity: NEUTRAL_SCORE,
            relevance: NEUTRAL_SCORE,
            logic: NEUTRAL_SCORE,
            clarity: NEUTRAL_SCORE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryBreakdown {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopResponse {
    pub prompt: String,
    pub response: String,
    pub score: f64,
    pub feedback: String,
}

/// Results of a prompt-based game (rapid fire, triple step)
///
/// The two counters are required when decoding server data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptReport {
    #[serde(alias = "total_words")]
    pub total_prompts: usize,
    #[serde(alias = "integrated_words")]
    pub completed_prompts: usize,
    /// Percentage, unrounded
    #[serde(default, alias = "integration_rate")]
    pub response_rate: f64,
    /// Milliseconds
    #[serde(default)]
    pub avg_response_time: f64,
    #[serde(default)]
    pub avg_quality_score: f64,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub category_breakdown: CategoryBreakdown,
    #[serde(default)]
    pub top_responses: Vec<TopResponse>,
    #[serde(default, alias = "missed_words")]
    pub missed_prompts: Vec<String>,
}

impl PromptReport {
    /// Response rate as shown to the user
    pub fn display_response_rate(&self) -> u32 {
        self.response_rate.round().max(0.0) as u32
    }
}

/// Results of the conductor game
///
/// The two counters are required when decoding server data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConductorReport {
    #[serde(default)]
    pub game_type: String,
    #[serde(default)]
    pub topic: String,
    /// Seconds
    #[serde(default)]
    pub duration: u32,
    pub total_transitions: usize,
    pub successful_transitions: usize,
    /// Percentage, unrounded
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub transition_score: f64,
    #[serde(default)]
    pub adaptability_score: f64,
    #[serde(default)]
    pub consistency_score: f64,
    #[serde(default)]
    pub energy_range_score: f64,
    #[serde(default)]
    pub avg_adaptation_speed: f64,
    #[serde(default)]
    pub energy_changes_detected: usize,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub overall_score: f64,
}

impl ConductorReport {
    pub fn display_success_rate(&self) -> u32 {
        self.success_rate.round().max(0.0) as u32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Prompts(PromptReport),
    Conductor(ConductorReport),
}

impl Report {
    /// Interpret the `data` object returned by the completion endpoint
    pub fn from_server(kind: GameKind, data: Value) -> Result<Self> {
        let report = match kind {
            GameKind::RapidFire | GameKind::TripleStep => {
                serde_json::from_value(data).map(Report::Prompts)
            }
            GameKind::Conductor => serde_json::from_value(data).map(Report::Conductor),
        };
        report.map_err(|e| OratorError::InvalidResponse(format!("Malformed results: {}", e)))
    }

    pub fn total(&self) -> usize {
        match self {
            Report::Prompts(r) => r.total_prompts,
            Report::Conductor(r) => r.total_transitions,
        }
    }

    pub fn completed(&self) -> usize {
        match self {
            Report::Prompts(r) => r.completed_prompts,
            Report::Conductor(r) => r.successful_transitions,
        }
    }

    pub fn as_prompts(&self) -> Option<&PromptReport> {
        match self {
            Report::Prompts(r) => Some(r),
            Report::Conductor(_) => None,
        }
    }

    pub fn as_conductor(&self) -> Option<&ConductorReport> {
        match self {
            Report::Conductor(r) => Some(r),
            Report::Prompts(_) => None,
        }
    }
}

/// Outcome of a completed session
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SessionResults {
    /// Scored by the analysis service
    ///
    /// `data` is the server's answer untouched; `report` is a typed view of it.
    Server { data: Value, report: Report },
    /// Synthesized locally because scoring failed
    Fallback { report: Report },
}

impl SessionResults {
    /// Keep the completion data verbatim next to its typed view
    ///
    /// Data that lacks the core counters is rejected so the caller can
    /// fall back instead of showing an empty report.
    pub fn from_server(kind: GameKind, data: Value) -> Result<Self> {
        let report = Report::from_server(kind, data.clone())?;
        Ok(SessionResults::Server { data, report })
    }

    pub fn report(&self) -> &Report {
        match self {
            SessionResults::Server { report, .. } | SessionResults::Fallback { report } => report,
        }
    }

    /// Completion data exactly as the server sent it
    pub fn server_data(&self) -> Option<&Value> {
        match self {
            SessionResults::Server { data, .. } => Some(data),
            SessionResults::Fallback { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SessionResults::Fallback { .. })
    }
}

/// Extra context the fallback needs besides the session itself
#[derive(Clone, Debug, Default)]
pub struct FallbackContext<'a> {
    pub topic: Option<&'a str>,
    pub duration_secs: u32,
}

/// Build best-effort results from local counters and a recovered server record
pub fn fallback_report(
    session: &Session,
    recovered: &SessionRecord,
    context: &FallbackContext<'_>,
) -> Report {
    match session.kind {
        GameKind::RapidFire | GameKind::TripleStep => {
            Report::Prompts(fallback_prompt_report(session, recovered))
        }
        GameKind::Conductor => Report::Conductor(fallback_conductor_report(session, context)),
    }
}

fn fallback_prompt_report(session: &Session, recovered: &SessionRecord) -> PromptReport {
    let total = session.total();
    let transcribed = recovered.transcribed().count().min(total);

    let top_responses = recovered
        .transcribed()
        .filter(|step| step.analysis.is_some())
        .take(MAX_TOP_RESPONSES)
        .map(|step| {
            let analysis = step.analysis.as_ref();
            TopResponse {
                prompt: step.prompt.clone(),
                response: step.transcription.clone().unwrap_or_default(),
                score: analysis.and_then(|a| a.score).unwrap_or(NEUTRAL_SCORE),
                feedback: analysis
                    .and_then(|a| a.feedback.clone())
                    .unwrap_or_else(|| "Analysis not available".to_string()),
            }
        })
        .collect();

    PromptReport {
        total_prompts: total,
        completed_prompts: transcribed,
        response_rate: if total > 0 {
            session.completed as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        avg_response_time: session.average_response_time_ms(),
        avg_quality_score: NEUTRAL_SCORE,
        score_breakdown: ScoreBreakdown::neutral(),
        category_breakdown: CategoryBreakdown {
            fair: transcribed,
            ..Default::default()
        },
        top_responses,
        missed_prompts: session.missed(),
    }
}

fn fallback_conductor_report(session: &Session, context: &FallbackContext<'_>) -> ConductorReport {
    let total = session.total();
    ConductorReport {
        game_type: GameKind::Conductor.as_str().to_string(),
        topic: context.topic.unwrap_or_default().to_string(),
        duration: context.duration_secs,
        total_transitions: total,
        successful_transitions: session.completed,
        success_rate: if total > 0 {
            session.completed as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        transition_score: 6.5,
        adaptability_score: 7.0,
        consistency_score: 6.0,
        energy_range_score: 7.5,
        avg_adaptation_speed: 2.0,
        energy_changes_detected: total,
        feedback: "Unable to analyze vocal patterns. Results based on interaction data."
            .to_string(),
        overall_score: 6.5,
    }
}
