use super::Mexc;
use crate::{
    Identifier,
    subscription::{Subscription, SubscriptionKind},
};
use basis_instrument::instrument::MarketDataInstrument;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, StrExt, format_smolstr};

/// Type that defines how to translate a Basis [`Subscription`] into a
/// [`Mexc`] market that can be subscribed to.
///
/// eg/ "BTCUSDT"
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#websocket-market-data>
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct MexcMarket(pub SmolStr);

impl<Kind> Identifier<MexcMarket> for Subscription<Mexc, MarketDataInstrument, Kind>
where
    Kind: SubscriptionKind,
{
    fn id(&self) -> MexcMarket {
        let MarketDataInstrument { base, quote, .. } = &self.instrument;
        MexcMarket(format_smolstr!("{base}{quote}").to_uppercase_smolstr())
    }
}

impl AsRef<str> for MexcMarket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::book::BookTickers;
    use basis_instrument::instrument::kind::MarketDataInstrumentKind;

    #[test]
    fn test_mexc_market() {
        let sub = Subscription::<Mexc, MarketDataInstrument, _>::new(
            Mexc,
            MarketDataInstrument::from(("btc", "usdt", MarketDataInstrumentKind::Spot)),
            BookTickers,
        );

        assert_eq!(
            Identifier::<MexcMarket>::id(&sub),
            MexcMarket(SmolStr::new("BTCUSDT"))
        );
    }
}
