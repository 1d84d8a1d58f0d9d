//! Domain types shared by every Helion crate: the data model — symbols,
//! market data, bars, features/predictions/signals, orders, positions, and
//! the engine state machine and its health/equity/restart bookkeeping.
//!
//! Nothing in this crate spawns a task or touches I/O; it is the vocabulary
//! the rest of the workspace is built from.

pub mod decimal;
pub mod engine_state;
pub mod equity;
pub mod error;
pub mod health;
pub mod market;
pub mod order;
pub mod position;
pub mod prediction;
pub mod restart_ledger;
pub mod symbol;

pub use decimal::{Price, Size};
pub use engine_state::EngineState;
pub use equity::EquityBook;
pub use error::{CoreError, Result};
pub use health::EngineHealth;
pub use market::{AuxiliaryFields, Bar, MarketData, BAR_INTERVAL_MS};
pub use order::{ClientOrderId, Order, OrderSide, OrderStatus};
pub use position::Position;
pub use prediction::{Features, Prediction, Side, Signal};
pub use restart_ledger::RestartLedger;
pub use symbol::Symbol;
