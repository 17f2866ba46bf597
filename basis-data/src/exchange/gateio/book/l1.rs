use crate::{
    Identifier,
    event::{MarketEvent, MarketIter},
    exchange::{
        gateio::{channel::GateioChannel, message::GateioMessage},
        subscription::ExchangeSub,
    },
    subscription::book::BookTicker,
};
use basis_instrument::exchange::ExchangeId;
use basis_integration::{de::de_str, subscription::SubscriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GateioSpotBookTicker = GateioMessage<GateioSpotBookTickerInner>;
pub type GateioFuturesBookTicker = GateioMessage<GateioFuturesBookTickerInner>;

/// [`Gateio`](super::super::Gateio) spot real-time best bid/ask message.
///
/// ### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#best-bid-or-ask-price>
/// ```json
/// {
///     "t": 1606293275123,
///     "u": 48733182,
///     "s": "BTC_USDT",
///     "b": "19177.79",
///     "B": "0.0003341504",
///     "a": "19179.38",
///     "A": "0.09"
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioSpotBookTickerInner {
    #[serde(alias = "s", deserialize_with = "de_spot_book_ticker_subscription_id")]
    pub subscription_id: SubscriptionId,
    #[serde(
        alias = "t",
        deserialize_with = "basis_integration::de::de_u64_epoch_ms_as_datetime_utc",
        default = "Utc::now"
    )]
    pub time: DateTime<Utc>,
    #[serde(alias = "u")]
    pub update_id: u64,
    #[serde(alias = "b", deserialize_with = "de_str")]
    pub best_bid_price: f64,
    #[serde(alias = "B", deserialize_with = "de_str")]
    pub best_bid_amount: f64,
    #[serde(alias = "a", deserialize_with = "de_str")]
    pub best_ask_price: f64,
    #[serde(alias = "A", deserialize_with = "de_str")]
    pub best_ask_amount: f64,
}

/// [`Gateio`](super::super::Gateio) perpetual futures real-time best bid/ask message.
///
/// Sizes are denominated in whole contracts, so they arrive as JSON numbers rather than
/// decimal strings.
///
/// ### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/futures/ws/en/#best-ask-bid-subscription>
/// ```json
/// {
///     "t": 1615366379123,
///     "u": 2517661076,
///     "s": "BTC_USDT",
///     "b": "54696.6",
///     "B": 37000,
///     "a": "54696.7",
///     "A": 47061
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioFuturesBookTickerInner {
    #[serde(alias = "s", deserialize_with = "de_futures_book_ticker_subscription_id")]
    pub subscription_id: SubscriptionId,
    #[serde(
        alias = "t",
        deserialize_with = "basis_integration::de::de_u64_epoch_ms_as_datetime_utc",
        default = "Utc::now"
    )]
    pub time: DateTime<Utc>,
    #[serde(alias = "u")]
    pub update_id: u64,
    #[serde(alias = "b", deserialize_with = "de_str")]
    pub best_bid_price: f64,
    #[serde(alias = "B")]
    pub best_bid_amount: f64,
    #[serde(alias = "a", deserialize_with = "de_str")]
    pub best_ask_price: f64,
    #[serde(alias = "A")]
    pub best_ask_amount: f64,
}

impl Identifier<Option<SubscriptionId>> for GateioSpotBookTicker {
    fn id(&self) -> Option<SubscriptionId> {
        Some(self.data.subscription_id.clone())
    }
}

impl Identifier<Option<SubscriptionId>> for GateioFuturesBookTicker {
    fn id(&self) -> Option<SubscriptionId> {
        Some(self.data.subscription_id.clone())
    }
}

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, GateioSpotBookTicker)>
    for MarketIter<InstrumentKey, BookTicker>
{
    fn from(
        (exchange_id, instrument, ticker): (ExchangeId, InstrumentKey, GateioSpotBookTicker),
    ) -> Self {
        Self(vec![Ok(MarketEvent {
            time_exchange: ticker.data.time,
            time_received: Utc::now(),
            exchange: exchange_id,
            instrument,
            kind: BookTicker {
                time_exchange: ticker.data.time,
                bid_price: ticker.data.best_bid_price,
                bid_amount: ticker.data.best_bid_amount,
                ask_price: ticker.data.best_ask_price,
                ask_amount: ticker.data.best_ask_amount,
                update_id: Some(ticker.data.update_id),
            },
        })])
    }
}

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, GateioFuturesBookTicker)>
    for MarketIter<InstrumentKey, BookTicker>
{
    fn from(
        (exchange_id, instrument, ticker): (ExchangeId, InstrumentKey, GateioFuturesBookTicker),
    ) -> Self {
        Self(vec![Ok(MarketEvent {
            time_exchange: ticker.data.time,
            time_received: Utc::now(),
            exchange: exchange_id,
            instrument,
            kind: BookTicker {
                time_exchange: ticker.data.time,
                bid_price: ticker.data.best_bid_price,
                bid_amount: ticker.data.best_bid_amount,
                ask_price: ticker.data.best_ask_price,
                ask_amount: ticker.data.best_ask_amount,
                update_id: Some(ticker.data.update_id),
            },
        })])
    }
}

pub fn de_spot_book_ticker_subscription_id<'de, D>(
    deserializer: D,
) -> Result<SubscriptionId, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    <&str as Deserialize>::deserialize(deserializer)
        .map(|market| ExchangeSub::from((GateioChannel::SPOT_BOOK_TICKER, market)).id())
}

pub fn de_futures_book_ticker_subscription_id<'de, D>(
    deserializer: D,
) -> Result<SubscriptionId, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    <&str as Deserialize>::deserialize(deserializer)
        .map(|market| ExchangeSub::from((GateioChannel::FUTURES_BOOK_TICKER, market)).id())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod de {
        use super::*;

        #[test]
        fn test_gateio_spot_book_ticker_inner() {
            struct TestCase {
                input: &'static str,
                expected: GateioSpotBookTickerInner,
            }

            let time = Utc::now();

            let tests = vec![
                TestCase {
                    // TC0: valid spot book ticker
                    input: r#"
                    {
                        "u":16710819973,
                        "s":"ETH_USDT",
                        "b":"1215.27000000",
                        "B":"32.49110000",
                        "a":"1215.28000000",
                        "A":"13.93900000"
                    }
                    "#,
                    expected: GateioSpotBookTickerInner {
                        update_id: 16710819973,
                        subscription_id: SubscriptionId::from("spot.book_ticker|ETH_USDT"),
                        time,
                        best_bid_price: 1215.27,
                        best_bid_amount: 32.4911,
                        best_ask_price: 1215.28,
                        best_ask_amount: 13.939,
                    },
                },
                TestCase {
                    // TC1: valid spot book ticker
                    input: r#"
                    {
                        "u":16710819974,
                        "s":"BTC_USDT",
                        "b":"16858.90",
                        "B":"13.692",
                        "a":"16859.00",
                        "A":"30.219"
                    }
                    "#,
                    expected: GateioSpotBookTickerInner {
                        update_id: 16710819974,
                        subscription_id: SubscriptionId::from("spot.book_ticker|BTC_USDT"),
                        time,
                        best_bid_price: 16858.90,
                        best_bid_amount: 13.692,
                        best_ask_price: 16859.00,
                        best_ask_amount: 30.219,
                    },
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                let actual =
                    serde_json::from_str::<GateioSpotBookTickerInner>(test.input).unwrap();
                let actual = GateioSpotBookTickerInner { time, ..actual };
                assert_eq!(actual, test.expected, "TC{} failed", index);
            }
        }

        #[test]
        fn test_gateio_futures_book_ticker_inner() {
            let input = r#"
            {
                "t": 1615366379123,
                "u": 2517661076,
                "s": "BTC_USDT",
                "b": "54696.6",
                "B": 37000,
                "a": "54696.7",
                "A": 47061
            }
            "#;

            let actual = serde_json::from_str::<GateioFuturesBookTickerInner>(input).unwrap();
            assert_eq!(
                actual.subscription_id,
                SubscriptionId::from("futures.book_ticker|BTC_USDT")
            );
            assert_eq!(actual.update_id, 2517661076);
            assert_eq!(actual.best_bid_price, 54696.6);
            assert_eq!(actual.best_bid_amount, 37000.0);
            assert_eq!(actual.best_ask_price, 54696.7);
            assert_eq!(actual.best_ask_amount, 47061.0);
        }
    }
}
