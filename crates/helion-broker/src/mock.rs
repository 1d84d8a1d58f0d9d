//! A deterministic in-memory broker used by tests and local `validate-config`
//! dry runs. Never used in production — grounded purely as a test double.

use crate::{Balances, Broker, BrokerError, BrokerOrderAck, Result};
use async_trait::async_trait;
use helion_core::{Bar, ClientOrderId, MarketData, Order, Price, Size, Symbol};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Paper broker: serves flat synthetic history, never streams live ticks
/// unless fed via [`MockBroker::inject_tick`], and deduplicates orders by
/// `client_order_id` the way a real venue's idempotency key would.
pub struct MockBroker {
    starting_price: Price,
    submitted: Mutex<HashMap<ClientOrderId, BrokerOrderAck>>,
    next_order_id: AtomicU64,
    tick_tx: Mutex<Option<mpsc::Sender<MarketData>>>,
}

impl MockBroker {
    pub fn new(starting_price: Price) -> Self {
        Self {
            starting_price,
            submitted: Mutex::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
            tick_tx: Mutex::new(None),
        }
    }

    /// Pushes a tick into whatever stream is currently open, if any.
    pub fn inject_tick(&self, md: MarketData) {
        if let Some(tx) = self.tick_tx.lock().as_ref() {
            let _ = tx.try_send(md);
        }
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().len()
    }
}

#[async_trait]
impl Broker for MockBroker {
    async fn fetch_historical_bars(
        &self,
        _symbol: &Symbol,
        timeframe_ms: u64,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let mut bars = Vec::with_capacity(limit);
        for i in 0..limit {
            bars.push(Bar {
                timestamp_ms: (i as u64) * timeframe_ms,
                open: self.starting_price,
                high: self.starting_price,
                low: self.starting_price,
                close: self.starting_price,
                volume: Size::ZERO,
            });
        }
        Ok(bars)
    }

    async fn stream_ticks(&self) -> Result<mpsc::Receiver<MarketData>> {
        let (tx, rx) = mpsc::channel(256);
        *self.tick_tx.lock() = Some(tx);
        Ok(rx)
    }

    async fn submit_order(&self, order: &Order) -> Result<BrokerOrderAck> {
        let mut submitted = self.submitted.lock();
        if let Some(existing) = submitted.get(&order.client_order_id) {
            return Ok(existing.clone());
        }
        let order_id = format!("mock-{}", self.next_order_id.fetch_add(1, Ordering::Relaxed));
        let ack = BrokerOrderAck { order_id };
        submitted.insert(order.client_order_id.clone(), ack.clone());
        Ok(ack)
    }

    async fn get_balances(&self) -> Result<Balances> {
        Ok(Balances::default())
    }

    async fn get_positions(&self) -> Result<Vec<(Symbol, Decimal)>> {
        Ok(Vec::new())
    }
}
