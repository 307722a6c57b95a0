//! Error types for Orator
//!
//! One error enum covers the capture device, the analysis service and the
//! session state machine.

use thiserror::Error;

/// Orator errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OratorError {
    /// Microphone capability was refused or never granted
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    /// Capture device could not be opened or failed mid-stream
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Network or server failure talking to the analysis service
    #[error("{0}")]
    TransportError(String),

    /// The analysis service answered with a body we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An action was requested from a phase that does not allow it
    #[error("Cannot {action} while {phase}")]
    InvalidTransition { action: String, phase: String },

    /// A step is already running
    #[error("A step is already in progress")]
    StepInFlight,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Encoding the captured audio failed
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
}

impl OratorError {
    pub(crate) fn invalid_transition(action: &str, phase: impl std::fmt::Display) -> Self {
        OratorError::InvalidTransition {
            action: action.to_string(),
            phase: phase.to_string(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors let the current game continue (or be retried),
    /// while non-recoverable errors need user intervention.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The user has to grant access before any game can start
            OratorError::PermissionDenied(_) => false,
            // The step is skipped, the game goes on
            OratorError::DeviceUnavailable(_) => true,
            // Transient network trouble, retry is offered
            OratorError::TransportError(_) => true,
            OratorError::InvalidResponse(_) => true,
            OratorError::InvalidTransition { .. } => false,
            OratorError::StepInFlight => true,
            OratorError::ConfigError(_) => false,
            OratorError::AudioProcessingError(_) => true,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            OratorError::PermissionDenied(_) => {
                "Microphone permission is required to play this game.".to_string()
            }
            OratorError::DeviceUnavailable(_) => {
                "Microphone unavailable. Please check your audio device.".to_string()
            }
            OratorError::TransportError(message) => message.clone(),
            OratorError::InvalidResponse(_) => {
                "The analysis service returned an unexpected answer. Please try again.".to_string()
            }
            OratorError::InvalidTransition { .. } => {
                "That action is not available right now.".to_string()
            }
            OratorError::StepInFlight => "Please wait for the current prompt to finish.".to_string(),
            OratorError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            OratorError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
        }
    }
}

/// Result type alias for Orator operations
pub type Result<T> = std::result::Result<T, OratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_displays_server_message() {
        let err = OratorError::TransportError("Session not found".to_string());
        assert_eq!(err.to_string(), "Session not found");
        assert_eq!(err.user_message(), "Session not found");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = OratorError::invalid_transition("reset", "Processing");
        assert_eq!(err.to_string(), "Cannot reset while Processing");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_permission_denied_is_fatal() {
        assert!(!OratorError::PermissionDenied("denied".into()).is_recoverable());
        assert!(OratorError::DeviceUnavailable("busy".into()).is_recoverable());
    }
}
