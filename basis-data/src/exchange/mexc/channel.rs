use super::Mexc;
use crate::{
    Identifier,
    subscription::{Subscription, book::BookTickers, trade::PublicTrades},
};
use serde::Serialize;

/// Defines how to translate a Basis [`Subscription`] into a [`MexcChannel`]
/// base string for WebSocket subscriptions.
///
/// The actual subscription topic sent to MEXC is dynamically constructed by appending
/// "@<interval>@<symbol>" to this base channel string. For example:
/// "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".
///
/// Important: these channels push Protocol Buffers (.pb) binary frames.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#websocket-market-data>
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct MexcChannel(pub &'static str);

impl MexcChannel {
    /// Base channel string for [`Mexc`]'s real-time public aggregated book ticker stream.
    pub const AGGREGATED_BOOK_TICKER_PB: Self = Self("spot@public.aggre.bookTicker.v3.api.pb");

    /// Base channel string for [`Mexc`]'s aggregated deals stream.
    ///
    /// Used for [`PublicTrades`] subscriptions.
    pub const AGGREGATED_DEALS_PB: Self = Self("spot@public.aggre.deals.v3.api.pb");
}

impl<Instrument> Identifier<MexcChannel> for Subscription<Mexc, Instrument, BookTickers> {
    fn id(&self) -> MexcChannel {
        MexcChannel::AGGREGATED_BOOK_TICKER_PB
    }
}

impl<Instrument> Identifier<MexcChannel> for Subscription<Mexc, Instrument, PublicTrades> {
    fn id(&self) -> MexcChannel {
        MexcChannel::AGGREGATED_DEALS_PB
    }
}

impl AsRef<str> for MexcChannel {
    fn as_ref(&self) -> &str {
        self.0
    }
}
