//! Tracks per-symbol `Position` state, folded from executed orders. Updated
//! optimistically on successful submission, mirroring `ExposureTracker`.

use dashmap::DashMap;
use helion_core::{OrderSide, Position, Price, Size, Symbol};

#[derive(Default)]
pub struct PositionBook {
    positions: DashMap<Symbol, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fill(&self, symbol: &Symbol, side: OrderSide, quantity: Size, price: Price) {
        self.positions
            .entry(symbol.clone())
            .or_insert_with(Position::flat)
            .apply_fill(side, quantity, price);
    }

    pub fn get(&self, symbol: &Symbol) -> Position {
        self.positions.get(symbol).map(|p| *p).unwrap_or_else(Position::flat)
    }
}
