//! The per-engine state machine and its legal transition graph.

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    Stopped,
    Starting,
    Running,
    Paused,
    Crashed,
    Stopping,
}

impl EngineState {
    /// Transitions are linear (`STOPPED -> STARTING -> RUNNING -> STOPPING
    /// -> STOPPED`) except `CRASHED`, reachable from any non-terminal state
    /// and only left via a supervisor-driven `STOPPED -> STARTING` restart.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        match (self, next) {
            (Stopped, Starting) => true,
            (Starting, Running) => true,
            (Starting, Crashed) => true,
            (Running, Stopping) => true,
            (Running, Paused) => true,
            (Paused, Running) => true,
            (Paused, Stopping) => true,
            (Running, Crashed) => true,
            (Paused, Crashed) => true,
            (Stopping, Stopped) => true,
            (Stopping, Crashed) => true,
            (Crashed, Starting) => true,
            _ => false,
        }
    }

    pub fn validate_transition(self, next: EngineState) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }

    pub fn is_terminal_idle(self) -> bool {
        matches!(self, EngineState::Stopped)
    }
}
