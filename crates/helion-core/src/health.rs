//! The engine's per-cycle self-reported health snapshot.

use crate::{EngineState, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub symbol: Symbol,
    pub state: EngineState,
    pub uptime_seconds: u64,
    pub last_heartbeat_unix: u64,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub position_count: u32,
    pub daily_pnl_pct: f64,
}

impl EngineHealth {
    pub fn stopped(symbol: Symbol) -> Self {
        Self {
            symbol,
            state: EngineState::Stopped,
            uptime_seconds: 0,
            last_heartbeat_unix: 0,
            error_count: 0,
            last_error: None,
            position_count: 0,
            daily_pnl_pct: 0.0,
        }
    }

    pub fn is_stale(&self, now_unix: u64, heartbeat_timeout_secs: u64) -> bool {
        self.state == EngineState::Running
            && now_unix.saturating_sub(self.last_heartbeat_unix) > heartbeat_timeout_secs
    }
}
