//! Client side of the external analysis service
//!
//! The service transcribes and scores recordings; this crate only uploads
//! them and asks for results. `AnalysisService` is the seam the game
//! controller talks to, `HttpAnalysisClient` the real implementation.

pub mod client;
pub mod types;

pub use client::HttpAnalysisClient;
pub use types::{
    HealthStatus, RecoveredAnalysis, RecoveredStep, SessionRecord, SessionSummary, UploadAck,
    UploadRequest, WordPlacement,
};

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Operations offered by the analysis service
///
/// Implementations never retry on their own; retry policy belongs to the caller.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Upload one recorded response
    async fn upload_recording(&self, request: UploadRequest) -> Result<UploadAck>;

    /// Declare the session finished and fetch its computed results
    ///
    /// Returns the raw `data` object; an answer without data is an error.
    async fn complete_session(&self, session_id: &str, summary: &SessionSummary) -> Result<Value>;

    /// Fetch whatever the server kept about a session
    async fn get_session(&self, session_id: &str) -> Result<SessionRecord>;

    /// List sessions known to the server
    async fn list_sessions(&self) -> Result<Value>;

    /// Health check
    async fn health_check(&self) -> Result<HealthStatus>;
}
