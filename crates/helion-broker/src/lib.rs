//! The abstract broker capability.
//!
//! This is the only seam between the engine core and a concrete exchange.
//! No module outside this crate knows the wire protocol of any exchange;
//! everything downstream speaks in terms of this trait.

pub mod error;
pub mod mock;

pub use error::{BrokerError, Result};

use async_trait::async_trait;
use helion_core::{Bar, MarketData, Order, Symbol};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct BrokerOrderAck {
    pub order_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Balances {
    pub by_asset: HashMap<String, Decimal>,
}

/// An abstract trading venue. Implementations own wire-protocol concerns
/// (auth, signing, reconnection at the transport level); callers only see
/// the operations named in the external-interfaces contract.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn fetch_historical_bars(
        &self,
        symbol: &Symbol,
        timeframe_ms: u64,
        limit: usize,
    ) -> Result<Vec<Bar>>;

    /// Opens the live stream and returns the receiving end of a channel the
    /// implementation feeds forever. The `MarketFeeder` owns reconnection
    /// semantics; the broker's job here is just to hand back a fresh
    /// channel on demand.
    async fn stream_ticks(&self) -> Result<mpsc::Receiver<MarketData>>;

    /// Must honor `client_order_id` idempotency: a duplicate ID submitted
    /// twice is deduplicated broker-side and returns the same ack.
    async fn submit_order(&self, order: &Order) -> Result<BrokerOrderAck>;

    async fn get_balances(&self) -> Result<Balances>;

    async fn get_positions(&self) -> Result<Vec<(Symbol, Decimal)>>;
}
