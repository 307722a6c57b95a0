use serde::Serialize;

/// Phase of a game session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Configuring the game, nothing recorded yet
    #[default]
    Setup,
    /// Steps are being timed and recorded
    Playing,
    /// Waiting for the analysis service to score the session
    Processing,
    /// Results are available
    Results,
    /// Scoring failed; retry or reset
    Error,
}

impl GamePhase {
    pub fn is_setup(&self) -> bool {
        matches!(self, GamePhase::Setup)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, GamePhase::Playing)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, GamePhase::Processing)
    }

    /// Results or Error: the session is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Results | GamePhase::Error)
    }

    pub fn can_reset(&self) -> bool {
        self.is_terminal()
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, GamePhase::Error)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamePhase::Setup => write!(f, "Setup"),
            GamePhase::Playing => write!(f, "Playing"),
            GamePhase::Processing => write!(f, "Processing"),
            GamePhase::Results => write!(f, "Results"),
            GamePhase::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_and_retry_rules() {
        assert!(!GamePhase::Setup.can_reset());
        assert!(!GamePhase::Playing.can_reset());
        assert!(!GamePhase::Processing.can_reset());
        assert!(GamePhase::Results.can_reset());
        assert!(GamePhase::Error.can_reset());

        assert!(GamePhase::Error.can_retry());
        assert!(!GamePhase::Results.can_retry());
    }

    #[test]
    fn test_default_is_setup() {
        assert!(GamePhase::default().is_setup());
        assert_eq!(GamePhase::Processing.to_string(), "Processing");
    }
}
