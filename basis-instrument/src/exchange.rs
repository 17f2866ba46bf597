use crate::instrument::kind::MarketDataInstrumentKind;
use serde::{Deserialize, Serialize};

/// Unique identifier for an exchange server.
///
/// ### Notes
/// An exchange may have a distinct server per
/// [`MarketDataInstrumentKind`](crate::instrument::kind::MarketDataInstrumentKind). For example,
/// GateioSpot and GateioPerpetualsUsd have distinct APIs, and are therefore represented as
/// unique variants.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename = "exchange", rename_all = "snake_case")]
pub enum ExchangeId {
    Mock,
    MexcSpot,
    GateioSpot,
    GateioPerpetualsUsd,
}

impl ExchangeId {
    /// Return the &str representation of this [`ExchangeId`]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Mock => "mock",
            ExchangeId::MexcSpot => "mexc_spot",
            ExchangeId::GateioSpot => "gateio_spot",
            ExchangeId::GateioPerpetualsUsd => "gateio_perpetuals_usd",
        }
    }

    /// Market type served by this venue.
    pub fn market_kind(&self) -> MarketDataInstrumentKind {
        match self {
            ExchangeId::Mock | ExchangeId::MexcSpot | ExchangeId::GateioSpot => {
                MarketDataInstrumentKind::Spot
            }
            ExchangeId::GateioPerpetualsUsd => MarketDataInstrumentKind::Perpetual,
        }
    }

    /// Determine if this venue supports market data for the provided
    /// [`MarketDataInstrumentKind`].
    pub fn supports_instrument_kind(&self, kind: MarketDataInstrumentKind) -> bool {
        self.market_kind() == kind
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a venue plays within a delta-neutral spot/futures pair.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeRole {
    Spot,
    Futures,
}

impl ExchangeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeRole::Spot => "spot",
            ExchangeRole::Futures => "futures",
        }
    }

    /// Role of the opposite leg.
    pub fn inverse(&self) -> Self {
        match self {
            ExchangeRole::Spot => ExchangeRole::Futures,
            ExchangeRole::Futures => ExchangeRole::Spot,
        }
    }
}

impl std::fmt::Display for ExchangeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
