use crate::asset::AssetNameInternal;
use derive_more::Constructor;
use kind::MarketDataInstrumentKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Instrument kinds.
///
/// eg/ `Spot`, `Perpetual`
pub mod kind;

/// Instrument name newtypes.
pub mod name;

/// Venue trading rules for an instrument.
pub mod spec;

pub use spec::SymbolInfo;

/// Instrument describing a tradable market on a venue.
///
/// Structural equality over `(base, quote, kind)` makes this the primary key for all
/// per-symbol state.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct MarketDataInstrument {
    pub base: AssetNameInternal,
    pub quote: AssetNameInternal,
    #[serde(rename = "instrument_kind")]
    pub kind: MarketDataInstrumentKind,
}

impl MarketDataInstrument {
    /// Determine if this instrument trades on a futures-style venue.
    pub fn is_futures(&self) -> bool {
        matches!(self.kind, MarketDataInstrumentKind::Perpetual)
    }
}

impl<S> From<(S, S, MarketDataInstrumentKind)> for MarketDataInstrument
where
    S: Into<AssetNameInternal>,
{
    fn from((base, quote, kind): (S, S, MarketDataInstrumentKind)) -> Self {
        Self::new(base.into(), quote.into(), kind)
    }
}

impl Display for MarketDataInstrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.base, self.quote, self.kind)
    }
}
