//! Configuration for the analysis service and the games
//!
//! Values come from defaults, builder methods, and (for the runner binary)
//! environment variables.

use crate::game::prompts::ANALOGY_PROMPTS;
use crate::game::{Difficulty, GameKind};
use std::time::Duration;

/// Environment variable holding the analysis service base URL
pub const API_URL_ENV: &str = "ORATOR_API_URL";
/// Environment variable holding the request timeout in seconds (0 disables it)
pub const REQUEST_TIMEOUT_ENV: &str = "ORATOR_REQUEST_TIMEOUT_SECS";

/// Connection settings for the analysis service
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://127.0.0.1:5005`
    pub base_url: String,

    /// Upper bound for a single request; `None` waits forever
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5005".to_string(),
            request_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl ServiceConfig {
    /// Read overrides from the environment on top of the defaults
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.base_url = url;
        }

        if let Ok(raw) = std::env::var(REQUEST_TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                format!(
                    "{} must be a whole number of seconds: {:?}",
                    REQUEST_TIMEOUT_ENV, raw
                )
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disable the client-side timeout
    pub fn without_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Analysis service URL must start with http:// or https://: {}",
                self.base_url
            ));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err("Request timeout must be positive".to_string());
        }
        Ok(())
    }
}

/// Settings for one game
///
/// These mirror the setup screen sliders and survive a reset.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Which exercise to play
    pub kind: GameKind,

    /// Number of prompts in a discrete game
    pub prompt_count: usize,

    /// Seconds allowed per prompt in a discrete game
    pub step_secs: u32,

    /// Total length of a duration game
    pub session_secs: u32,

    /// Seconds between cues in a duration game
    pub cue_interval_secs: u32,

    /// Topic to speak about in a duration game
    pub topic: Option<String>,

    /// Word pool for the triple step game
    pub difficulty: Difficulty,

    /// Pause between entering Playing and the first step
    pub start_delay: Duration,

    /// Pause between two steps
    pub settle_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::rapid_fire()
    }
}

impl GameConfig {
    /// Rapid-fire analogies: 10 prompts, 5 seconds each
    pub fn rapid_fire() -> Self {
        Self {
            kind: GameKind::RapidFire,
            prompt_count: 10,
            step_secs: 5,
            session_secs: 0,
            cue_interval_secs: 0,
            topic: None,
            difficulty: Difficulty::default(),
            start_delay: Duration::from_secs(1),
            settle_delay: Duration::from_millis(800),
        }
    }

    /// The conductor: three minutes on a topic, a new energy target every 8 seconds
    pub fn conductor(topic: impl Into<String>) -> Self {
        Self {
            kind: GameKind::Conductor,
            session_secs: 180,
            cue_interval_secs: 8,
            topic: Some(topic.into()),
            ..Self::rapid_fire()
        }
    }

    /// Triple step: two minutes on a topic, a new word every 30 seconds
    pub fn triple_step(topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            kind: GameKind::TripleStep,
            session_secs: 120,
            cue_interval_secs: 30,
            topic: Some(topic.into()),
            difficulty,
            ..Self::rapid_fire()
        }
    }

    /// Set the number of prompts
    pub fn with_prompt_count(mut self, count: usize) -> Self {
        self.prompt_count = count;
        self
    }

    /// Set the seconds per prompt
    pub fn with_step_secs(mut self, secs: u32) -> Self {
        self.step_secs = secs;
        self
    }

    /// Set the session length of a duration game
    pub fn with_session_secs(mut self, secs: u32) -> Self {
        self.session_secs = secs;
        self
    }

    /// Set the cue interval of a duration game
    pub fn with_cue_interval_secs(mut self, secs: u32) -> Self {
        self.cue_interval_secs = secs;
        self
    }

    /// Set both cosmetic pauses
    pub fn with_delays(mut self, start_delay: Duration, settle_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self.settle_delay = settle_delay;
        self
    }

    /// Remove both cosmetic pauses
    pub fn without_delays(self) -> Self {
        self.with_delays(Duration::ZERO, Duration::ZERO)
    }

    /// Seconds each step's countdown runs for
    pub fn step_duration_secs(&self) -> u32 {
        if self.kind.is_continuous() {
            self.cue_interval_secs
        } else {
            self.step_secs
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.kind.is_continuous() {
            if self.session_secs == 0 {
                return Err("Session length must be positive".to_string());
            }
            if self.cue_interval_secs == 0 {
                return Err("Cue interval must be positive".to_string());
            }
            match self.topic.as_deref().map(str::trim) {
                Some(topic) if !topic.is_empty() => {}
                _ => return Err("Please select or enter a topic to speak about.".to_string()),
            }
        } else {
            if self.step_secs == 0 {
                return Err("Time per prompt must be positive".to_string());
            }
            if self.prompt_count == 0 || self.prompt_count > ANALOGY_PROMPTS.len() {
                return Err(format!(
                    "Number of prompts must be between 1 and {}",
                    ANALOGY_PROMPTS.len()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5005");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_service_config_builder() {
        let config = ServiceConfig::default()
            .with_base_url("https://speech.example.com")
            .without_timeout();
        assert!(config.request_timeout.is_none());
        assert!(config.validate().is_ok());

        let config = config.with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_game_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.kind, GameKind::RapidFire);
        assert_eq!(config.prompt_count, 10);
        assert_eq!(config.step_secs, 5);
        assert_eq!(config.step_duration_secs(), 5);
        assert!(config.validate().is_ok());

        let conductor = GameConfig::conductor("Building Strong Teams");
        assert_eq!(conductor.session_secs, 180);
        assert_eq!(conductor.step_duration_secs(), 8);
        assert!(conductor.validate().is_ok());

        let triple = GameConfig::triple_step("Health and Wellness", Difficulty::Hard);
        assert_eq!(triple.session_secs, 120);
        assert_eq!(triple.cue_interval_secs, 30);
        assert!(triple.validate().is_ok());
    }

    #[test]
    fn test_game_validation() {
        assert!(GameConfig::rapid_fire().with_prompt_count(0).validate().is_err());
        assert!(GameConfig::rapid_fire().with_prompt_count(21).validate().is_err());
        assert!(GameConfig::rapid_fire().with_step_secs(0).validate().is_err());
        assert!(GameConfig::conductor("  ").validate().is_err());
        assert!(GameConfig::conductor("Topic")
            .with_session_secs(0)
            .validate()
            .is_err());
    }
}
