//! Speaking games and the session state machine that drives them

pub mod controller;
pub mod events;
pub mod kind;
pub mod phase;
pub mod prompts;
pub mod results;
pub mod session;

pub use controller::{SessionController, StepCompletion};
pub use events::{EventBus, GameEvent};
pub use kind::{Cue, Difficulty, GameKind};
pub use phase::GamePhase;
pub use results::{
    fallback_report, ConductorReport, FallbackContext, PromptReport, Report, SessionResults,
};
pub use session::{Session, Step};
