//! Extraction lifecycle states

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage of one extraction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractState {
    Idle,
    Connected,
    Executing,
    Streaming,
    Cleanup,
    Completed,
    Failed,
}

impl ExtractState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, ExtractState::Completed | ExtractState::Failed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(self, next: ExtractState) -> bool {
        use ExtractState::*;
        match (self, next) {
            (Idle, Connected) | (Idle, Failed) => true,
            (Connected, Executing) | (Executing, Streaming) => true,
            (Connected | Executing | Streaming, Cleanup) => true,
            (Cleanup, Completed) | (Cleanup, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ExtractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractState::Idle => "idle",
            ExtractState::Connected => "connected",
            ExtractState::Executing => "executing",
            ExtractState::Streaming => "streaming",
            ExtractState::Cleanup => "cleanup",
            ExtractState::Completed => "completed",
            ExtractState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Records the states one pass went through
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<ExtractState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            history: vec![ExtractState::Idle],
        }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn current(&self) -> ExtractState {
        self.history
            .last()
            .copied()
            .unwrap_or(ExtractState::Idle)
    }

    /// Move to `next`
    ///
    /// Illegal transitions are programming errors in the pipeline and are
    /// caught by debug assertions; release builds record them anyway.
    pub fn advance(&mut self, next: ExtractState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal extract transition {} -> {}",
            self.current(),
            next
        );
        tracing::trace!(from = %self.current(), to = %next, "Extract state change");
        self.history.push(next);
    }

    /// Every state in order, starting at `Idle`
    pub fn history(&self) -> &[ExtractState] {
        &self.history
    }

    /// Consume the tracker
    pub fn into_history(self) -> Vec<ExtractState> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExtractState::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = StateTracker::new();
        for state in [Connected, Executing, Streaming, Cleanup, Completed] {
            tracker.advance(state);
        }
        assert_eq!(
            tracker.history(),
            &[Idle, Connected, Executing, Streaming, Cleanup, Completed]
        );
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn test_cleanup_precedes_terminal_state() {
        for from in [Connected, Executing, Streaming] {
            assert!(from.can_transition_to(Cleanup));
            assert!(!from.can_transition_to(Completed));
            assert!(!from.can_transition_to(Failed));
        }
        assert!(Idle.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Cleanup));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [Idle, Connected, Executing, Streaming, Cleanup, Completed, Failed] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }
}
