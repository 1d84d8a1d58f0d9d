//! The `MarketFeeder` and `SymbolQueue`: the single subscriber to the
//! exchange's live tick stream, and the bounded drop-oldest channel that
//! fans its ticks out to per-symbol `TradingEngine` consumers.

pub mod dispatcher;
pub mod error;
pub mod feeder;
pub mod gap_fill;
pub mod queue;

pub use dispatcher::Dispatcher;
pub use error::{FeedError, FeedResult};
pub use feeder::{FeederConfig, MarketFeeder};
pub use gap_fill::gap_fill;
pub use queue::{PushOutcome, SymbolQueue};
