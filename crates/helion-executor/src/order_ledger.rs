//! Tracks each client order's lifecycle status, enforcing
//! `OrderStatus::can_follow` so a terminal status is never silently
//! overwritten by a stale or out-of-order update.

use dashmap::DashMap;
use helion_core::{ClientOrderId, OrderStatus};
use tracing::warn;

#[derive(Default)]
pub struct OrderLedger {
    status_by_id: DashMap<ClientOrderId, OrderStatus>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `next` for `id`. The first call for a given `id` always
    /// succeeds (there is no prior status). Later calls that would violate
    /// the lifecycle are logged and dropped rather than applied.
    pub fn record(&self, id: &ClientOrderId, next: OrderStatus) {
        match self.status_by_id.get(id).map(|s| *s) {
            None => {
                self.status_by_id.insert(id.clone(), next);
            }
            Some(prior) if next.can_follow(prior) => {
                self.status_by_id.insert(id.clone(), next);
            }
            Some(prior) => {
                warn!(client_order_id = %id, ?prior, ?next, "dropped illegal order status transition");
            }
        }
    }

    pub fn status(&self, id: &ClientOrderId) -> Option<OrderStatus> {
        self.status_by_id.get(id).map(|s| *s)
    }
}
