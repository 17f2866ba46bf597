use basis_instrument::{
    Keyed,
    instrument::{MarketDataInstrument, kind::MarketDataInstrumentKind},
};
use std::fmt::Debug;

/// Instrument related data that defines an associated unique `Key`.
///
/// Verbose `InstrumentData` is used to subscribe to market data feeds, and its unique `Key` is
/// then used to identify consumed [MarketEvents](crate::event::MarketEvent).
pub trait InstrumentData
where
    Self: Clone + Debug + Send + Sync,
{
    type Key: Debug + Clone + Eq + Send + Sync;
    fn key(&self) -> &Self::Key;
    fn kind(&self) -> &MarketDataInstrumentKind;
}

impl<InstrumentKey> InstrumentData for Keyed<InstrumentKey, MarketDataInstrument>
where
    InstrumentKey: Debug + Clone + Eq + Send + Sync,
{
    type Key = InstrumentKey;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn kind(&self) -> &MarketDataInstrumentKind {
        &self.value.kind
    }
}

impl InstrumentData for MarketDataInstrument {
    type Key = Self;

    fn key(&self) -> &Self::Key {
        self
    }

    fn kind(&self) -> &MarketDataInstrumentKind {
        &self.kind
    }
}
