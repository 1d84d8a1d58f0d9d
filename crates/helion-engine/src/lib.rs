//! `TradingEngine`: the per-symbol signal -> risk -> execution loop, plus
//! the rolling feature window it builds each cycle from its `SymbolQueue`.

pub mod engine;
pub mod error;
pub mod features;

pub use engine::{spawn_trading_engine, EngineConfig, TradingEngineHandle};
pub use error::{EngineError, Result};
pub use features::FeatureWindow;
