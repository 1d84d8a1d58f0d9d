//! Routes ticks from the feeder's single execution context to exactly one
//! per-symbol `SymbolQueue`, by symbol. Installed as the feeder's `on_tick`.

use crate::queue::{PushOutcome, SymbolQueue};
use dashmap::DashMap;
use helion_core::{MarketData, Symbol};
use helion_telemetry::Metrics;
use std::sync::Arc;
use tracing::trace;

#[derive(Clone, Default)]
pub struct Dispatcher {
    queues: Arc<DashMap<Symbol, Arc<SymbolQueue>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, symbol: Symbol, queue: Arc<SymbolQueue>) {
        self.queues.insert(symbol, queue);
    }

    pub fn unregister(&self, symbol: &Symbol) {
        self.queues.remove(symbol);
    }

    /// Non-blocking by construction: `SymbolQueue::push` never waits.
    /// A tick for a symbol with no registered queue is dropped silently —
    /// it never leaks to a different symbol's consumer.
    pub fn dispatch(&self, md: MarketData) {
        match self.queues.get(&md.symbol) {
            Some(queue) => {
                let symbol = md.symbol.to_string();
                Metrics::tick_received(&symbol);
                if queue.push(md) == PushOutcome::DisplacedOne {
                    Metrics::tick_dropped(&symbol);
                }
            }
            None => trace!(symbol = %md.symbol, "tick for unregistered symbol dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_core::{AuxiliaryFields, Price, Size};
    use rust_decimal_macros::dec;

    fn tick(symbol: &str) -> MarketData {
        MarketData {
            symbol: Symbol::new(symbol),
            price: Price::new(dec!(1)),
            spread: Price::new(dec!(0)),
            volume: Size::new(dec!(1)),
            timestamp_ms: 0,
            auxiliary: AuxiliaryFields::default(),
        }
    }

    #[test]
    fn tick_for_symbol_x_never_lands_in_symbol_y_queue() {
        let dispatcher = Dispatcher::new();
        let btc_queue = Arc::new(SymbolQueue::new(8));
        let eth_queue = Arc::new(SymbolQueue::new(8));
        dispatcher.register(Symbol::new("BTC/USDT"), btc_queue.clone());
        dispatcher.register(Symbol::new("ETH/USDT"), eth_queue.clone());

        dispatcher.dispatch(tick("BTC/USDT"));

        assert_eq!(btc_queue.len(), 1);
        assert_eq!(eth_queue.len(), 0);
    }

    #[test]
    fn tick_for_unregistered_symbol_is_dropped_not_misrouted() {
        let dispatcher = Dispatcher::new();
        let queue = Arc::new(SymbolQueue::new(8));
        dispatcher.register(Symbol::new("BTC/USDT"), queue.clone());

        dispatcher.dispatch(tick("DOGE/USDT"));

        assert_eq!(queue.len(), 0);
    }
}
