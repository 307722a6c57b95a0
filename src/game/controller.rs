//! Game session controller
//!
//! Owns one session at a time and drives it through
//! `Setup -> Playing -> Processing -> Results | Error`. The controller is the
//! single writer of session state: every mutation goes through `&mut self`,
//! and steps are chained with sequential awaits so a new step never begins
//! before the previous recording was stopped and uploaded.

use super::events::{EventBus, GameEvent};
use super::kind::{Cue, GameKind};
use super::phase::GamePhase;
use super::prompts;
use super::results::{fallback_report, FallbackContext, SessionResults};
use super::session::{Session, Step};
use crate::api::{AnalysisService, SessionSummary, UploadRequest, WordPlacement};
use crate::audio::{AudioDevice, CaptureGrant, CaptureSession, CaptureStats, Recording};
use crate::config::GameConfig;
use crate::timer::Countdown;
use crate::{OratorError, Result};
use serde_json::{json, Map, Value};
use std::future::pending;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of a timer completion delivered to the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepCompletion {
    /// The step was closed; its recording may or may not have been uploaded
    Completed { recorded: bool, uploaded: bool },
    /// Stale, duplicate or concurrent completion; nothing changed
    Ignored,
}

/// Drives one game session at a time
pub struct SessionController<D: AudioDevice, S: AnalysisService> {
    config: GameConfig,
    capture: CaptureSession<D>,
    service: S,
    phase: GamePhase,
    session: Option<Session>,
    results: Option<SessionResults>,
    error: Option<String>,

    /// Countdown of the step in flight
    step_timer: Option<Countdown>,
    active_step: Option<usize>,
    /// Set while a step's stop and upload are being processed
    completing: bool,
    /// When the first step could begin, for cue offsets
    clock: Option<Instant>,

    events: EventBus,
}

impl<D: AudioDevice, S: AnalysisService> SessionController<D, S> {
    pub fn new(config: GameConfig, device: D, service: S) -> Self {
        Self {
            config,
            capture: CaptureSession::new(device),
            service,
            phase: GamePhase::Setup,
            session: None,
            results: None,
            error: None,
            step_timer: None,
            active_step: None,
            completing: false,
            clock: None,
            events: EventBus::new(),
        }
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> UnboundedReceiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn results(&self) -> Option<&SessionResults> {
        self.results.as_ref()
    }

    /// Message shown in the error phase
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn capture(&self) -> &CaptureSession<D> {
        &self.capture
    }

    pub fn capture_stats(&self) -> CaptureStats {
        self.capture.stats()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Countdown of the step in flight, for display
    pub fn step_timer(&self) -> Option<&Countdown> {
        self.step_timer.as_ref()
    }

    pub fn active_step(&self) -> Option<usize> {
        self.active_step
    }

    /// Whether a step completion is being processed
    ///
    /// Only observable from outside after a completion future was dropped
    /// mid-upload; the next call that touches the step loop recovers it.
    pub fn is_completing(&self) -> bool {
        self.completing
    }

    /// Replace the game settings; only allowed during setup
    pub fn set_config(&mut self, config: GameConfig) -> Result<()> {
        if !self.phase.is_setup() {
            return Err(OratorError::invalid_transition("change settings", self.phase));
        }
        self.config = config;
        Ok(())
    }

    /// Change the per-step duration
    ///
    /// During play the countdown of the step in flight restarts with the new
    /// duration. A completion in progress holds `&mut self`, so it can never
    /// be reconfigured halfway.
    pub fn set_step_duration(&mut self, secs: u32) -> Result<()> {
        if secs == 0 {
            return Err(OratorError::ConfigError(
                "Step duration must be positive".into(),
            ));
        }
        self.recover_abandoned_completion();
        if !matches!(self.phase, GamePhase::Setup | GamePhase::Playing) {
            return Err(OratorError::invalid_transition(
                "change the step duration",
                self.phase,
            ));
        }

        match self.config.kind {
            GameKind::RapidFire => self.config.step_secs = secs,
            GameKind::Conductor | GameKind::TripleStep => self.config.cue_interval_secs = secs,
        }

        if self.active_step.is_some() {
            if let Some(timer) = self.step_timer.as_mut() {
                timer.set_duration(secs)?;
                timer.set_active(true);
            }
        }
        debug!("Step duration set to {}s", secs);
        Ok(())
    }

    /// Ask for the microphone grant that `start` requires
    pub async fn request_microphone(&mut self) -> Result<CaptureGrant> {
        self.capture.request_permission()
    }

    /// Setup -> Playing: create a fresh session
    pub fn start(&mut self) -> Result<()> {
        if !self.phase.is_setup() {
            return Err(OratorError::invalid_transition("start a game", self.phase));
        }
        if self.capture.grant().is_none() {
            return Err(OratorError::PermissionDenied(
                "microphone access is required to start a game".into(),
            ));
        }
        self.config.validate().map_err(OratorError::ConfigError)?;

        let session = Session::new(self.config.kind, build_steps(&self.config));
        info!(
            "Starting {} session {} with {} steps",
            self.config.kind,
            session.id,
            session.total()
        );

        self.session = Some(session);
        self.results = None;
        self.error = None;
        self.step_timer = None;
        self.active_step = None;
        self.completing = false;
        self.clock = None;
        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    /// Begin the next step: start its countdown and its capture
    ///
    /// Returns `Ok(None)` once every step was attempted. A capture that fails
    /// to start is logged and the step runs without a recording.
    pub fn begin_step(&mut self) -> Result<Option<usize>> {
        if !self.phase.is_playing() {
            return Err(OratorError::invalid_transition("begin a step", self.phase));
        }
        self.recover_abandoned_completion();
        if self.active_step.is_some() {
            return Err(OratorError::StepInFlight);
        }

        let secs = self.config.step_duration_secs();
        let offset_ms = self.elapsed_ms();
        let Some(session) = self.session.as_mut() else {
            return Err(OratorError::invalid_transition("begin a step", self.phase));
        };

        let index = session.attempted;
        if index >= session.total() {
            return Ok(None);
        }

        let timer = Countdown::started(secs)?;
        session.attempted += 1;
        let step = &mut session.steps[index];
        step.presented_at_ms = offset_ms;
        let cue = step.cue.clone();

        self.step_timer = Some(timer);
        self.active_step = Some(index);

        if let Err(e) = self.capture.start() {
            warn!("Step {}: recording skipped: {}", index + 1, e);
            self.events.emit(GameEvent::CaptureFailed {
                index,
                message: e.to_string(),
            });
        }

        info!("Step {} started: {}", index + 1, cue);
        self.events.emit(GameEvent::StepStarted { index, cue, secs });
        Ok(Some(index))
    }

    /// Handle the countdown of step `index` reaching zero
    ///
    /// Stops the capture, waits for the artifact, and uploads it. Upload
    /// failures are logged and leave the step unresponded.
    ///
    /// Dropping the returned future during the upload abandons the step: it
    /// stays unresponded and the next step can begin.
    pub async fn on_timer_complete(&mut self, index: usize) -> StepCompletion {
        self.recover_abandoned_completion();
        if self.active_step != Some(index) {
            debug!("Ignoring timer completion for step {}", index + 1);
            return StepCompletion::Ignored;
        }
        self.completing = true;
        if let Some(timer) = self.step_timer.as_mut() {
            timer.set_active(false);
        }

        let recording = match self.capture.stop() {
            Ok(recording) => recording,
            Err(e) => {
                warn!("Step {}: failed to finalize recording: {}", index + 1, e);
                self.events.emit(GameEvent::CaptureFailed {
                    index,
                    message: e.to_string(),
                });
                None
            }
        };

        let recorded = recording.is_some();
        let uploaded = match recording {
            Some(recording) => self.upload_step(index, recording).await,
            None => false,
        };

        self.active_step = None;
        self.completing = false;
        debug!(
            "Step {} completed (recorded: {}, uploaded: {})",
            index + 1,
            recorded,
            uploaded
        );
        self.events.emit(GameEvent::StepCompleted {
            index,
            recorded,
            uploaded,
        });
        StepCompletion::Completed { recorded, uploaded }
    }

    /// Play every step, then enter Processing
    ///
    /// Duration games also run a session clock fixed to an absolute instant,
    /// so time spent uploading counts against it. When it runs out the step
    /// in flight is closed early and the game moves on.
    ///
    /// A `play` that was dropped can be called again; it resumes with the
    /// next step and keeps the original session clock.
    pub async fn play(&mut self) -> Result<GamePhase> {
        if !self.phase.is_playing() {
            return Err(OratorError::invalid_transition("play", self.phase));
        }
        self.recover_abandoned_completion();

        let clock = match self.clock {
            Some(clock) => clock,
            None => {
                if !self.config.start_delay.is_zero() {
                    sleep(self.config.start_delay).await;
                }
                *self.clock.insert(Instant::now())
            }
        };

        let deadline_at = self
            .config
            .kind
            .is_continuous()
            .then(|| clock + Duration::from_secs(u64::from(self.config.session_secs)));
        let deadline = session_deadline(deadline_at);
        tokio::pin!(deadline);
        let mut expired = false;

        // A step left running by a dropped `play` is closed first
        if let Some(index) = self.active_step {
            self.on_timer_complete(index).await;
        }

        while !clock_ran_out(deadline_at) {
            let Some(index) = self.begin_step()? else {
                break;
            };
            if let Some(timer) = self.step_timer.as_mut() {
                tokio::select! {
                    biased;
                    _ = &mut deadline => expired = true,
                    _ = timer.run() => {}
                }
            }

            self.on_timer_complete(index).await;
            if expired || clock_ran_out(deadline_at) {
                break;
            }

            if !self.config.settle_delay.is_zero() && self.has_pending_steps() {
                tokio::select! {
                    biased;
                    _ = &mut deadline => expired = true,
                    _ = sleep(self.config.settle_delay) => {}
                }
                if expired {
                    break;
                }
            }
        }

        // Duration games end on the clock, not on the step count
        if deadline_at.is_some() && !expired {
            if !clock_ran_out(deadline_at) {
                (&mut deadline).await;
            }
            expired = true;
        }
        if expired {
            info!("Session time of {}s is up", self.config.session_secs);
            self.events.emit(GameEvent::SessionExpired {
                elapsed_secs: self.config.session_secs,
            });
        }

        let stats = self.capture.stats();
        debug!(
            "Playing finished with {} capture starts and {} stops",
            stats.starts, stats.stops
        );
        self.step_timer = None;
        self.set_phase(GamePhase::Processing);
        Ok(self.phase)
    }

    /// Processing -> Results | Error
    ///
    /// Server results are used verbatim. If completion fails, whatever the
    /// server kept is fetched and combined with local counters into fallback
    /// results; only if that fails too does the session end in Error.
    pub async fn process(&mut self) -> Result<GamePhase> {
        if !self.phase.is_processing() {
            return Err(OratorError::invalid_transition("process results", self.phase));
        }
        let (session_id, summary) = self.session_summary()?;

        let failure = match self.fetch_server_results(&session_id, &summary).await {
            Ok(results) => {
                info!("Session {} scored by the analysis service", session_id);
                self.finish(results);
                return Ok(self.phase);
            }
            Err(e) => e,
        };

        warn!("Session completion failed, recovering partial data: {}", failure);
        match self.service.get_session(&session_id).await {
            Ok(record) => {
                let report = match self.session.as_ref() {
                    Some(session) => {
                        let context = FallbackContext {
                            topic: self.config.topic.as_deref(),
                            duration_secs: self.config.session_secs,
                        };
                        fallback_report(session, &record, &context)
                    }
                    None => {
                        return Err(OratorError::invalid_transition(
                            "process results",
                            self.phase,
                        ))
                    }
                };
                info!(
                    "Using fallback results: {}/{} completed",
                    report.completed(),
                    report.total()
                );
                self.events.emit(GameEvent::FallbackUsed {
                    reason: failure.to_string(),
                });
                self.finish(SessionResults::Fallback { report });
            }
            Err(recovery) => {
                error!("Session recovery failed: {}", recovery);
                self.fail(format!("Failed to process results: {}", failure));
            }
        }
        Ok(self.phase)
    }

    /// Error -> Processing -> Results | Error, re-requesting completion
    pub async fn retry(&mut self) -> Result<GamePhase> {
        if !self.phase.can_retry() {
            return Err(OratorError::invalid_transition("retry", self.phase));
        }
        let (session_id, summary) = self.session_summary()?;

        info!("Retrying completion of session {}", session_id);
        self.error = None;
        self.set_phase(GamePhase::Processing);

        match self.fetch_server_results(&session_id, &summary).await {
            Ok(results) => self.finish(results),
            Err(e) => {
                warn!("Retry failed: {}", e);
                self.fail(format!("Retry failed: {}", e));
            }
        }
        Ok(self.phase)
    }

    /// Results | Error -> Setup, discarding the session
    ///
    /// Settings are kept.
    pub fn reset(&mut self) -> Result<()> {
        if !self.phase.can_reset() {
            return Err(OratorError::invalid_transition("reset", self.phase));
        }

        self.capture.discard();
        self.session = None;
        self.results = None;
        self.error = None;
        self.step_timer = None;
        self.active_step = None;
        self.completing = false;
        self.clock = None;
        info!("Game reset");
        self.set_phase(GamePhase::Setup);
        Ok(())
    }

    /// Start, play and process one full game
    pub async fn run(&mut self) -> Result<GamePhase> {
        self.start()?;
        self.play().await?;
        self.process().await
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            info!("Phase {} -> {}", self.phase, phase);
        }
        self.phase = phase;
        self.events.emit(GameEvent::PhaseChanged(phase));
    }

    fn finish(&mut self, results: SessionResults) {
        self.results = Some(results);
        self.set_phase(GamePhase::Results);
    }

    fn fail(&mut self, message: String) {
        self.error = Some(message.clone());
        self.set_phase(GamePhase::Error);
        self.events.emit(GameEvent::Failed(message));
    }

    /// Clear a completion whose future was dropped mid-upload
    ///
    /// The capture was stopped before the upload began, so only the flags
    /// are left over. The recording itself is lost.
    fn recover_abandoned_completion(&mut self) {
        if !self.completing {
            return;
        }
        let index = self.active_step.take();
        self.completing = false;
        self.step_timer = None;
        self.capture.discard();

        if let Some(index) = index {
            warn!("Step {} completion was abandoned, its upload is lost", index + 1);
            self.events.emit(GameEvent::StepCompleted {
                index,
                recorded: true,
                uploaded: false,
            });
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock
            .map(|clock| clock.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn has_pending_steps(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.attempted < session.total())
    }

    fn session_summary(&self) -> Result<(String, SessionSummary)> {
        self.session
            .as_ref()
            .map(|session| (session.id.clone(), session.summary()))
            .ok_or_else(|| OratorError::invalid_transition("complete a session", "no session"))
    }

    async fn fetch_server_results(
        &self,
        session_id: &str,
        summary: &SessionSummary,
    ) -> Result<SessionResults> {
        let data = self.service.complete_session(session_id, summary).await?;
        SessionResults::from_server(self.config.kind, data)
    }

    async fn upload_step(&mut self, index: usize, recording: Recording) -> bool {
        let Some(request) = self.upload_request(index, &recording) else {
            return false;
        };

        let outcome = match self.service.upload_recording(request).await {
            Ok(ack) if ack.success == Some(false) => Err(OratorError::TransportError(
                ack.message.unwrap_or_else(|| "Upload failed".to_string()),
            )),
            Ok(ack) => Ok(ack),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(_) => {
                let response_time = recording.elapsed_ms();
                if let Some(session) = self.session.as_mut() {
                    if session.steps[index].mark_uploaded(response_time) {
                        session.completed += 1;
                    }
                }
                debug!("Step {} uploaded ({}ms)", index + 1, response_time);
                true
            }
            Err(e) => {
                warn!("Upload failed for step {}: {}", index + 1, e);
                self.events.emit(GameEvent::UploadFailed {
                    index,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn upload_request(&self, index: usize, recording: &Recording) -> Option<UploadRequest> {
        let session = self.session.as_ref()?;
        let step = session.steps.get(index)?;
        let topic = self.config.topic.clone().unwrap_or_default();

        let mut settings = Map::new();
        let mut word = None;
        let prompt = match &step.cue {
            Cue::Prompt(prompt) => {
                settings.insert("timer_duration".into(), json!(self.config.step_secs));
                settings.insert("total_prompts".into(), json!(session.total()));
                prompt.clone()
            }
            Cue::Energy(level) => {
                settings.insert("game_type".into(), json!(GameKind::Conductor.as_str()));
                settings.insert("duration".into(), json!(self.config.session_secs));
                settings.insert("target_energy".into(), json!(level));
                settings.insert("topic".into(), Value::String(topic.clone()));
                format!(
                    "Energy level {} ({}): {}",
                    level,
                    prompts::energy_label(*level),
                    topic
                )
            }
            Cue::Word(target) => {
                settings.insert("game_type".into(), json!(GameKind::TripleStep.as_str()));
                settings.insert("topic".into(), Value::String(topic.clone()));
                settings.insert("word_frequency".into(), json!(self.config.cue_interval_secs));
                settings.insert("difficulty".into(), json!(self.config.difficulty.as_str()));
                word = Some(WordPlacement {
                    word: target.clone(),
                    timestamp_ms: step.presented_at_ms,
                    audio_duration_secs: recording.audio_duration.as_secs_f64(),
                });
                topic
            }
        };

        Some(UploadRequest {
            session_id: session.id.clone(),
            prompt,
            prompt_index: index,
            artifact: recording.artifact.clone(),
            response_time_ms: recording.elapsed_ms(),
            settings,
            word,
        })
    }
}

/// Resolves at the end of a duration game, never for discrete games
async fn session_deadline(deadline_at: Option<Instant>) {
    match deadline_at {
        Some(at) => sleep_until(at).await,
        None => pending::<()>().await,
    }
}

fn clock_ran_out(deadline_at: Option<Instant>) -> bool {
    deadline_at.is_some_and(|at| Instant::now() >= at)
}

/// Number of cues a duration game presents
fn cue_count(config: &GameConfig) -> usize {
    config.session_secs.div_ceil(config.cue_interval_secs.max(1)) as usize
}

fn build_steps(config: &GameConfig) -> Vec<Step> {
    let mut rng = rand::thread_rng();
    let cues: Vec<Cue> = match config.kind {
        GameKind::RapidFire => prompts::shuffled_prompts(&mut rng, config.prompt_count)
            .into_iter()
            .map(Cue::Prompt)
            .collect(),
        GameKind::Conductor => (0..cue_count(config))
            .map(|_| Cue::Energy(prompts::random_energy(&mut rng)))
            .collect(),
        GameKind::TripleStep => (0..cue_count(config))
            .map(|_| Cue::Word(prompts::random_word(&mut rng, config.difficulty)))
            .collect(),
    };
    cues.into_iter().map(|cue| Step::new(cue, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Difficulty;

    #[test]
    fn test_cue_count_rounds_up() {
        let config = GameConfig::conductor("Building Confidence");
        assert_eq!(cue_count(&config), 23);

        let config = GameConfig::triple_step("Health and Wellness", Difficulty::Easy);
        assert_eq!(cue_count(&config), 4);

        let config = config.with_session_secs(20).with_cue_interval_secs(8);
        assert_eq!(cue_count(&config), 3);
    }

    #[test]
    fn test_rapid_fire_steps_are_prompts() {
        let steps = build_steps(&GameConfig::rapid_fire().with_prompt_count(7));
        assert_eq!(steps.len(), 7);
        assert!(steps
            .iter()
            .all(|step| matches!(step.cue, Cue::Prompt(_)) && !step.responded));
    }

    #[test]
    fn test_conductor_steps_are_energy_targets() {
        let steps = build_steps(&GameConfig::conductor("The Digital Revolution"));
        assert!(steps
            .iter()
            .all(|step| matches!(step.cue, Cue::Energy(level) if (1..=9).contains(&level))));
    }
}
