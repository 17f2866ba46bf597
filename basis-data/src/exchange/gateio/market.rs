use super::Gateio;
use crate::{
    Identifier,
    subscription::{Subscription, SubscriptionKind},
};
use basis_instrument::instrument::MarketDataInstrument;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, StrExt, format_smolstr};

/// Type that defines how to translate a Basis [`Subscription`] into a
/// [`Gateio`] market that can be subscribed to.
///
/// The payload is a list because the incremental OrderBook channel takes the update
/// frequency alongside the currency pair, eg/ `["BTC_USDT", "100ms"]`.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/>
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct GateioMarket(pub Vec<SmolStr>);

impl<Server, Kind> Identifier<GateioMarket>
    for Subscription<Gateio<Server>, MarketDataInstrument, Kind>
where
    Kind: SubscriptionKind,
{
    fn id(&self) -> GateioMarket {
        gateio_market(&self.instrument, self.kind.as_str() == "l2")
    }
}

impl GateioMarket {
    pub fn as_str_vec(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.as_str()).collect()
    }
}

impl AsRef<str> for GateioMarket {
    fn as_ref(&self) -> &str {
        self.0[0].as_str()
    }
}

fn gateio_market(instrument: &MarketDataInstrument, l2: bool) -> GateioMarket {
    let MarketDataInstrument { base, quote, .. } = instrument;

    let mut payload = vec![format_smolstr!("{base}_{quote}").to_uppercase_smolstr()];
    if l2 {
        payload.push(format_smolstr!("100ms"));
    }
    GateioMarket(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::book::{BookTickers, OrderBooksL2};
    use basis_instrument::instrument::kind::MarketDataInstrumentKind;

    #[test]
    fn test_gateio_market_book_ticker() {
        let sub = Subscription::<Gateio<crate::exchange::gateio::spot::GateioServerSpot>, MarketDataInstrument, _>::new(
            Gateio::default(),
            MarketDataInstrument::from(("btc", "usdt", MarketDataInstrumentKind::Spot)),
            BookTickers,
        );

        assert_eq!(
            Identifier::<GateioMarket>::id(&sub),
            GateioMarket(vec![SmolStr::new("BTC_USDT")])
        );
    }

    #[test]
    fn test_gateio_market_l2_includes_frequency() {
        let sub = Subscription::<Gateio<crate::exchange::gateio::spot::GateioServerSpot>, MarketDataInstrument, _>::new(
            Gateio::default(),
            MarketDataInstrument::from(("eth", "usdt", MarketDataInstrumentKind::Spot)),
            OrderBooksL2,
        );

        assert_eq!(
            Identifier::<GateioMarket>::id(&sub),
            GateioMarket(vec![SmolStr::new("ETH_USDT"), SmolStr::new("100ms")])
        );
    }
}
