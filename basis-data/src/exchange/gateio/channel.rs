use super::Gateio;
use crate::{
    Identifier,
    instrument::InstrumentData,
    subscription::{
        Subscription,
        book::{BookTickers, OrderBooksL2},
        trade::PublicTrades,
    },
};
use basis_instrument::instrument::kind::MarketDataInstrumentKind;
use serde::Serialize;

/// Type that defines how to translate a Basis [`Subscription`] into a
/// [`Gateio`](super::Gateio) channel to be subscribed to.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/>
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct GateioChannel(pub &'static str);

impl GateioChannel {
    /// Gate.io [`MarketDataInstrumentKind::Spot`] real-time best bid/ask channel.
    ///
    /// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#best-bid-or-ask-price>
    pub const SPOT_BOOK_TICKER: Self = Self("spot.book_ticker");

    /// Gate.io [`MarketDataInstrumentKind::Perpetual`] real-time best bid/ask channel.
    ///
    /// See docs: <https://www.gate.io/docs/developers/futures/ws/en/#best-ask-bid-subscription>
    pub const FUTURES_BOOK_TICKER: Self = Self("futures.book_ticker");

    /// Gate.io [`MarketDataInstrumentKind::Spot`] incremental OrderBook channel.
    ///
    /// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#changed-order-book-levels>
    pub const ORDER_BOOK_L2: Self = Self("spot.order_book_update");

    /// Gate.io [`MarketDataInstrumentKind::Spot`] real-time trades channel.
    ///
    /// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#public-trades-channel>
    pub const SPOT_TRADES: Self = Self("spot.trades");

    /// Gate.io [`MarketDataInstrumentKind::Perpetual`] real-time trades channel.
    ///
    /// See docs: <https://www.gate.io/docs/developers/futures/ws/en/#trades-subscription>
    pub const FUTURES_TRADES: Self = Self("futures.trades");
}

impl<Server, Instrument> Identifier<GateioChannel>
    for Subscription<Gateio<Server>, Instrument, PublicTrades>
where
    Instrument: InstrumentData,
{
    fn id(&self) -> GateioChannel {
        match self.instrument.kind() {
            MarketDataInstrumentKind::Spot => GateioChannel::SPOT_TRADES,
            MarketDataInstrumentKind::Perpetual => GateioChannel::FUTURES_TRADES,
        }
    }
}

impl<Server, Instrument> Identifier<GateioChannel>
    for Subscription<Gateio<Server>, Instrument, BookTickers>
where
    Instrument: InstrumentData,
{
    fn id(&self) -> GateioChannel {
        match self.instrument.kind() {
            MarketDataInstrumentKind::Spot => GateioChannel::SPOT_BOOK_TICKER,
            MarketDataInstrumentKind::Perpetual => GateioChannel::FUTURES_BOOK_TICKER,
        }
    }
}

impl<Server, Instrument> Identifier<GateioChannel>
    for Subscription<Gateio<Server>, Instrument, OrderBooksL2>
{
    fn id(&self) -> GateioChannel {
        GateioChannel::ORDER_BOOK_L2
    }
}

impl AsRef<str> for GateioChannel {
    fn as_ref(&self) -> &str {
        self.0
    }
}
