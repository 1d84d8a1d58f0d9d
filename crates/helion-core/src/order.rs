//! Orders and their deterministic, idempotent client order IDs.

use crate::{Price, Size, Symbol};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// +1 for buy, -1 for sell; convenient for signed notional math.
    pub fn sign(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A deterministic 20-hex-character client order ID.
///
/// Derived from `hash(symbol | side | quantity | coarse_timestamp)`. Two
/// orders with identical fields produce identical IDs by construction
/// (idempotency contract); orders differing in any field collide only with
/// probability `2^-80` from the truncated digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// `coarse_window_ms` should be wide enough that an intended retry
    /// within the window collides on purpose (the executor uses 1000ms),
    /// but narrow enough that two genuinely distinct orders in the same
    /// second are rare in practice for a single symbol.
    pub fn derive(symbol: &Symbol, side: OrderSide, quantity: Size, coarse_timestamp: u64) -> Self {
        let material = format!(
            "{}|{}|{}|{}",
            symbol.as_str(),
            side,
            quantity.inner(),
            coarse_timestamp
        );
        let digest = Sha256::digest(material.as_bytes());
        let hex = hex::encode(digest);
        Self(hex[..20].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single lifecycle an order may pass through:
/// `NEW -> (PARTIAL_FILL)* -> FILLED | REJECTED | CANCELLED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartialFill,
    Filled,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    /// Whether `self` may legally follow `prior` in the lifecycle.
    pub fn can_follow(self, prior: OrderStatus) -> bool {
        use OrderStatus::*;
        match prior {
            New => matches!(self, PartialFill | Filled | Rejected | Cancelled),
            PartialFill => matches!(self, PartialFill | Filled | Cancelled),
            Filled | Rejected | Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub client_order_id: ClientOrderId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub quantity: Size,
    pub created_at_ms: u64,
}

impl Order {
    /// `coarse_window_ms` fixes the retry-collision window; the caller
    /// (the executor) computes `floor(now_ms / coarse_window_ms)`.
    pub fn new(
        symbol: Symbol,
        side: OrderSide,
        quantity: Size,
        created_at_ms: u64,
        coarse_window_ms: u64,
    ) -> Self {
        let coarse_timestamp = created_at_ms / coarse_window_ms.max(1);
        let client_order_id = ClientOrderId::derive(&symbol, side, quantity, coarse_timestamp);
        Self {
            client_order_id,
            symbol,
            side,
            quantity,
            created_at_ms,
        }
    }
}
