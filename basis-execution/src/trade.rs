use crate::order::id::OrderId;
use basis_instrument::{Side, instrument::name::InstrumentNameExchange};
use chrono::{DateTime, Utc};
use derive_more::{Constructor, From};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, From, Constructor,
)]
pub struct TradeId(pub SmolStr);

/// Normalised fill generated by an [`Order`](crate::order::Order).
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct Trade<AssetKey> {
    pub id: TradeId,
    pub instrument: InstrumentNameExchange,
    pub order_id: OrderId,
    pub time_exchange: DateTime<Utc>,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fees: AssetFees<AssetKey>,
}

impl<AssetKey> Trade<AssetKey> {
    pub fn value_quote(&self) -> Decimal {
        self.price * self.quantity.abs()
    }
}

impl<AssetKey> Display for Trade<AssetKey>
where
    AssetKey: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ instrument: {}, side: {}, price: {}, quantity: {}, time: {} }}",
            self.instrument, self.side, self.price, self.quantity, self.time_exchange
        )
    }
}

/// Venue-reported fees associated with a [`Trade`].
///
/// Carried for reconciliation only - accounting uses the per-instrument taker fee from
/// [`SymbolInfo`](basis_instrument::instrument::SymbolInfo).
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct AssetFees<AssetKey> {
    pub asset: Option<AssetKey>,
    pub fees: Decimal,
}

impl<AssetKey> Default for AssetFees<AssetKey> {
    fn default() -> Self {
        Self {
            asset: None,
            fees: Decimal::ZERO,
        }
    }
}
