use super::kind::Cue;
use super::phase::GamePhase;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Events emitted by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The controller entered a new phase
    PhaseChanged(GamePhase),

    /// A step's countdown and capture started
    StepStarted { index: usize, cue: Cue, secs: u32 },

    /// A step finished; `uploaded` tells whether its recording reached the service
    StepCompleted {
        index: usize,
        recorded: bool,
        uploaded: bool,
    },

    /// Capture could not start or stop for a step
    CaptureFailed { index: usize, message: String },

    /// Upload of a step's recording failed
    UploadFailed { index: usize, message: String },

    /// The session clock of a duration game ran out
    SessionExpired { elapsed_secs: u32 },

    /// Completion failed and results were synthesized locally
    FallbackUsed { reason: String },

    /// The session ended in the error phase
    Failed(String),
}

/// Fan-out of controller events to any number of observers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer
    pub fn subscribe(&mut self) -> UnboundedReceiver<GameEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event, dropping observers that went away
    pub fn emit(&mut self, event: GameEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_receives_events() {
        let mut bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(GameEvent::PhaseChanged(GamePhase::Playing));

        assert_eq!(
            first.try_recv().unwrap(),
            GameEvent::PhaseChanged(GamePhase::Playing)
        );
        assert_eq!(
            second.try_recv().unwrap(),
            GameEvent::PhaseChanged(GamePhase::Playing)
        );
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(GameEvent::Failed("boom".into()));

        assert_eq!(bus.subscriber_count(), 1);
        drop(kept);
    }
}
