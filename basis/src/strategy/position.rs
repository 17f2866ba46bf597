use basis_instrument::{Side, exchange::ExchangeRole};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-exchange position snapshot, derived from the monotonic fold of filled trades.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct PositionEntry {
    pub side: Side,
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

impl PositionEntry {
    /// Signed quantity: buy = +quantity, sell = -quantity.
    pub fn signed_quantity(&self) -> Decimal {
        match self.side {
            Side::Buy => self.quantity,
            Side::Sell => -self.quantity,
        }
    }
}

/// Positions across the delta-neutral pair.
///
/// Invariant: `delta = spot signed quantity + futures signed quantity`. For a correctly
/// executed delta-neutral trade `|delta_usdt|` stays below the venue minimum order value.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct PositionsState {
    pub positions: HashMap<ExchangeRole, PositionEntry>,
}

impl PositionsState {
    /// Fold a fill into the position of the provided role at the weighted-average price.
    ///
    /// Same-side fills extend the position; opposite-side fills reduce it, flipping side
    /// when crossing through zero.
    pub fn apply_fill(&mut self, role: ExchangeRole, side: Side, quantity: Decimal, price: Decimal) {
        if quantity <= Decimal::ZERO {
            return;
        }

        let Some(entry) = self.positions.get_mut(&role) else {
            self.positions.insert(
                role,
                PositionEntry {
                    side,
                    quantity,
                    avg_price: price,
                },
            );
            return;
        };

        if entry.side == side {
            // Extend: weighted-average entry price
            let total = entry.quantity + quantity;
            entry.avg_price =
                (entry.avg_price * entry.quantity + price * quantity) / total;
            entry.quantity = total;
            return;
        }

        // Reduce, possibly crossing through zero
        if quantity < entry.quantity {
            entry.quantity -= quantity;
        } else if quantity == entry.quantity {
            self.positions.remove(&role);
        } else {
            entry.quantity = quantity - entry.quantity;
            entry.side = side;
            entry.avg_price = price;
        }
    }

    pub fn entry(&self, role: ExchangeRole) -> Option<&PositionEntry> {
        self.positions.get(&role)
    }

    /// Signed quantity of the provided role, zero when flat.
    pub fn signed_quantity(&self, role: ExchangeRole) -> Decimal {
        self.positions
            .get(&role)
            .map(PositionEntry::signed_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Net base exposure across both legs.
    pub fn delta(&self) -> Decimal {
        self.positions
            .values()
            .map(PositionEntry::signed_quantity)
            .sum()
    }

    /// Net quote exposure at the provided mark price.
    pub fn delta_usdt(&self, mark_price: Decimal) -> Decimal {
        self.delta() * mark_price
    }

    /// Determine if any leg holds a position larger than the provided dust threshold.
    pub fn holds_position(&self, dust_threshold: Decimal) -> bool {
        self.positions
            .values()
            .any(|entry| entry.quantity > dust_threshold)
    }
}
