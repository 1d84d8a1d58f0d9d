//! Translates Signals into broker order submissions.
//!
//! # Execute pipeline (strict order)
//!
//! 1. `kill_switch_engaged` → `{ok:false, reason:"kill_switch"}`
//! 2. `!risk.can_open_new_position` → `{ok:false, reason:"risk_block"}`
//! 3. exposure over limit → engage kill-switch("exposure_limit"), block
//! 4. rate-limiter wait (unbounded)
//! 5. compute deterministic `client_order_id`
//! 6. submit to broker

use crate::exposure::ExposureTracker;
use crate::kill_switch::KillSwitch;
use crate::order_ledger::OrderLedger;
use crate::position_book::PositionBook;
use crate::rate_limiter::RateLimiter;
use helion_broker::Broker;
use helion_core::{ClientOrderId, Order, OrderStatus, Signal};
use helion_risk::RiskManager;
use helion_telemetry::Metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub ok: bool,
    pub reason: Option<String>,
    pub order_id: Option<String>,
    pub client_order_id: Option<ClientOrderId>,
}

impl ExecutionResult {
    fn blocked(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            order_id: None,
            client_order_id: None,
        }
    }

    fn filled(order_id: String, client_order_id: ClientOrderId) -> Self {
        Self {
            ok: true,
            reason: None,
            order_id: Some(order_id),
            client_order_id: Some(client_order_id),
        }
    }
}

#[derive(Clone)]
pub struct ExecutorConfig {
    pub rate_rps: u32,
    pub exposure_limit_usd: Decimal,
    pub coarse_window_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            rate_rps: 5,
            exposure_limit_usd: Decimal::from(100_000),
            coarse_window_ms: 1000,
        }
    }
}

pub struct OrderExecutor<B: Broker> {
    broker: Arc<B>,
    risk: Arc<RiskManager>,
    config: ExecutorConfig,
    kill_switch: KillSwitch,
    rate_limiter: RateLimiter,
    exposure: ExposureTracker,
    positions: PositionBook,
    orders: OrderLedger,
}

impl<B: Broker> OrderExecutor<B> {
    pub fn new(broker: Arc<B>, risk: Arc<RiskManager>, config: ExecutorConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_rps);
        Self {
            broker,
            risk,
            config,
            kill_switch: KillSwitch::new(),
            rate_limiter,
            exposure: ExposureTracker::new(),
            positions: PositionBook::new(),
            orders: OrderLedger::new(),
        }
    }

    /// Current tracked position for `symbol`, folded from every fill this
    /// executor has submitted. Flat if the symbol has never traded.
    pub fn position(&self, symbol: &helion_core::Symbol) -> helion_core::Position {
        self.positions.get(symbol)
    }

    /// Last recorded lifecycle status for a client order, if any.
    pub fn order_status(&self, id: &ClientOrderId) -> Option<OrderStatus> {
        self.orders.status(id)
    }

    pub async fn execute(&self, signal: Signal) -> ExecutionResult {
        if self.risk.global_stop_engaged() && !self.kill_switch.is_engaged() {
            self.kill_switch.engage("global_stop");
        }

        if self.kill_switch.is_engaged() {
            Metrics::order_submitted(signal.symbol.as_str(), "kill_switch");
            return ExecutionResult::blocked("kill_switch");
        }

        if !self.risk.can_open_new_position(&signal.symbol) {
            Metrics::risk_block(signal.symbol.as_str(), "risk_block");
            Metrics::order_submitted(signal.symbol.as_str(), "risk_block");
            return ExecutionResult::blocked("risk_block");
        }

        let current_exposure = self.exposure.exposure_notional(&signal.symbol, signal.price_hint);
        if current_exposure + signal.size_notional_usd > self.config.exposure_limit_usd {
            self.kill_switch.engage("exposure_limit");
            warn!(symbol = %signal.symbol, "exposure limit breached, kill switch engaged");
            Metrics::order_submitted(signal.symbol.as_str(), "exposure_limit");
            return ExecutionResult::blocked("exposure_limit");
        }

        self.rate_limiter.acquire().await;

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis() as u64;

        let price_hint = signal.price_hint;
        let quantity = if price_hint.is_zero() {
            helion_core::Size::ZERO
        } else {
            helion_core::Size::new(signal.size_notional_usd / price_hint.inner())
        };

        let order = Order::new(
            signal.symbol.clone(),
            signal.side,
            quantity,
            now_ms,
            self.config.coarse_window_ms,
        );

        self.orders.record(&order.client_order_id, OrderStatus::New);

        match self.broker.submit_order(&order).await {
            Ok(ack) => {
                self.exposure.add(&signal.symbol, signal.size_notional_usd);
                self.risk.on_order_filled(
                    &signal.symbol,
                    true,
                    signal.size_notional_usd,
                    Decimal::ZERO,
                );
                self.positions.record_fill(&signal.symbol, order.side, quantity, price_hint);
                self.orders.record(&order.client_order_id, OrderStatus::Filled);
                info!(symbol = %signal.symbol, order_id = %ack.order_id, client_order_id = %order.client_order_id, "order submitted");
                Metrics::order_submitted(signal.symbol.as_str(), "ok");
                ExecutionResult::filled(ack.order_id, order.client_order_id)
            }
            Err(e) => {
                self.orders.record(&order.client_order_id, OrderStatus::Rejected);
                warn!(symbol = %signal.symbol, error = %e, "broker submission failed");
                Metrics::order_submitted(signal.symbol.as_str(), "broker_error");
                ExecutionResult {
                    ok: false,
                    reason: Some("broker_error".to_string()),
                    order_id: None,
                    client_order_id: Some(order.client_order_id),
                }
            }
        }
    }

    pub fn engage_kill_switch(&self, reason: impl Into<String>) {
        self.kill_switch.engage(reason);
    }

    pub fn disengage_kill_switch(&self) {
        self.kill_switch.disengage();
    }

    pub fn kill_switch_engaged(&self) -> bool {
        self.kill_switch.is_engaged()
    }

    pub fn kill_switch_reason(&self) -> Option<String> {
        self.kill_switch.reason()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helion_broker::mock::MockBroker;
    use helion_core::{OrderSide, Price, Symbol};
    use helion_risk::RiskPolicy;
    use rust_decimal_macros::dec;

    fn signal(symbol: &str, notional: Decimal) -> Signal {
        Signal {
            symbol: Symbol::new(symbol),
            side: OrderSide::Buy,
            size_notional_usd: notional,
            price_hint: Price::new(dec!(100)),
            generated_at_ms: 0,
        }
    }

    fn executor() -> OrderExecutor<MockBroker> {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        OrderExecutor::new(broker, risk, ExecutorConfig::default())
    }

    #[tokio::test]
    async fn happy_path_execute_succeeds_and_opens_a_position() {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        let executor = OrderExecutor::new(broker, risk.clone(), ExecutorConfig::default());

        let result = executor.execute(signal("BTC/USDT", dec!(100))).await;
        assert!(result.ok);
        assert!(result.client_order_id.is_some());
        assert_eq!(risk.summary().positions_open, 1);

        let position = executor.position(&Symbol::new("BTC/USDT"));
        assert_eq!(position.quantity, helion_core::Size::new(dec!(1)));
        assert_eq!(
            executor.order_status(result.client_order_id.as_ref().unwrap()),
            Some(OrderStatus::Filled)
        );
    }

    #[tokio::test]
    async fn kill_switch_blocks_subsequent_executes() {
        let executor = executor();
        executor.engage_kill_switch("manual");
        let result = executor.execute(signal("BTC/USDT", dec!(100))).await;
        assert!(!result.ok);
        assert_eq!(result.reason.as_deref(), Some("kill_switch"));
    }

    #[tokio::test]
    async fn global_stop_auto_engages_kill_switch() {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        risk.on_position_closed(&Symbol::new("BTC/USDT"), dec!(-350));
        let executor = OrderExecutor::new(broker, risk, ExecutorConfig::default());

        let result = executor.execute(signal("BTC/USDT", dec!(100))).await;

        assert!(!result.ok);
        assert_eq!(result.reason.as_deref(), Some("kill_switch"));
        assert!(executor.kill_switch_engaged());
        assert_eq!(executor.kill_switch_reason().as_deref(), Some("global_stop"));
    }

    #[tokio::test]
    async fn exposure_over_limit_engages_kill_switch_and_blocks() {
        let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));
        let risk = Arc::new(RiskManager::new(RiskPolicy::default(), dec!(10000)));
        let mut config = ExecutorConfig::default();
        config.exposure_limit_usd = dec!(150);
        let executor = OrderExecutor::new(broker, risk, config);

        let first = executor.execute(signal("BTC/USDT", dec!(100))).await;
        assert!(first.ok);

        let second = executor.execute(signal("BTC/USDT", dec!(100))).await;
        assert!(!second.ok);
        assert_eq!(second.reason.as_deref(), Some("exposure_limit"));
        assert!(executor.kill_switch_engaged());
    }

    #[tokio::test]
    async fn identical_signal_retried_in_same_coarse_window_is_idempotent() {
        let executor = executor();
        let sig = signal("BTC/USDT", dec!(100));

        let first = executor.execute(sig.clone()).await;
        let second = executor.execute(sig).await;

        assert_eq!(first.client_order_id, second.client_order_id);
    }
}
