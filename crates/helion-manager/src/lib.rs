//! `EngineManager`: the process-wide lifecycle owner and the only public
//! control surface onto the trading engines. Everything above this crate
//! (the `helion-bot` binary, an operator CLI/RPC surface) talks to a single
//! `EngineManager`, never to individual `TradingEngine`s directly.

pub mod config;
pub mod error;
pub mod manager;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result};
pub use manager::{EngineManager, ManagerStatus};
