use crate::order::id::{ClientOrderId, OrderId};
use basis_instrument::{Side, instrument::name::InstrumentNameExchange};
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `Order` related identifiers.
pub mod id;

/// Order open and cancel request types.
pub mod request;

/// Normalised Basis order.
///
/// Created on placement, mutated by venue events and fill polling, terminal when
/// [`OrderStatus::is_terminal`]. Quantities are exact [`Decimal`]s - this is the accounting
/// boundary where hot-path `f64`s stop.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Order {
    pub id: OrderId,
    pub client_order_id: Option<ClientOrderId>,
    pub instrument: InstrumentNameExchange,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Decimal,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    pub time_exchange: DateTime<Utc>,
    pub fee: Option<Decimal>,
}

impl Order {
    /// Quantity still working on the venue.
    pub fn quantity_remaining(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// Determine if this order can no longer generate fills.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum OrderKind {
    Market,
    Limit,
    LimitMaker,
    ImmediateOrCancel,
    FillOrKill,
    StopLimit,
    StopMarket,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum TimeInForce {
    GoodUntilCancelled,
    ImmediateOrCancel,
    FillOrKill,
}

/// Venue order lifecycle status.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Determine if the status communicates the order can no longer generate fills.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_status_is_terminal() {
        struct TestCase {
            input: OrderStatus,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: working order
                input: OrderStatus::New,
                expected: false,
            },
            TestCase {
                // TC1: partial fills can still fill further
                input: OrderStatus::PartiallyFilled,
                expected: false,
            },
            TestCase {
                // TC2: fully filled
                input: OrderStatus::Filled,
                expected: true,
            },
            TestCase {
                // TC3: cancelled
                input: OrderStatus::Canceled,
                expected: true,
            },
            TestCase {
                // TC4: rejected
                input: OrderStatus::Rejected,
                expected: true,
            },
            TestCase {
                // TC5: expired
                input: OrderStatus::Expired,
                expected: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.is_terminal(), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_order_quantity_remaining() {
        let order = Order {
            id: OrderId::from("1"),
            client_order_id: None,
            instrument: InstrumentNameExchange::from("BTC_USDT"),
            side: Side::Buy,
            kind: OrderKind::Limit,
            price: dec!(100),
            quantity: dec!(5),
            filled_quantity: dec!(3),
            status: OrderStatus::PartiallyFilled,
            time_in_force: TimeInForce::GoodUntilCancelled,
            time_exchange: Default::default(),
            fee: None,
        };

        assert_eq!(order.quantity_remaining(), dec!(2));
    }
}
