use crate::order::{
    OrderKind, TimeInForce,
    id::{ClientOrderId, OrderId},
};
use basis_instrument::{Side, instrument::name::InstrumentNameExchange};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to open an order on a venue.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct OpenOrderRequest {
    pub instrument: InstrumentNameExchange,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    pub client_order_id: Option<ClientOrderId>,
}

/// Request to cancel a working order on a venue.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct CancelOrderRequest {
    pub instrument: InstrumentNameExchange,
    pub id: OrderId,
}
