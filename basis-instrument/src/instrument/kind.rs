use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Defines the kind of market an instrument trades on.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MarketDataInstrumentKind {
    Spot,
    Perpetual,
}

impl Default for MarketDataInstrumentKind {
    fn default() -> Self {
        Self::Spot
    }
}

impl Display for MarketDataInstrumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MarketDataInstrumentKind::Spot => "spot",
                MarketDataInstrumentKind::Perpetual => "perpetual",
            }
        )
    }
}
