use self::{
    channel::MexcChannel,
    market::MexcMarket,
    subscription::{MexcAggInterval, MexcWsMethod, MexcWsSub},
    validator::MexcWebSocketSubValidator,
};
use crate::{
    ExchangeWsPbStream, Identifier, NoInitialSnapshots,
    exchange::{Connector, StreamSelector, subscription::ExchangeSub},
    instrument::InstrumentData,
    subscriber::WebSocketSubscriber,
    subscription::{Map, book::BookTickers, trade::PublicTrades},
    transformer::stateless::StatelessTransformer,
};
use basis_instrument::exchange::ExchangeId;
use basis_integration::{
    error::SocketError, protocol::websocket::WsMessage, subscription::SubscriptionId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use url::Url;

pub mod book;
pub mod channel;
pub mod market;
pub mod proto;
pub mod subscription;
pub mod trade;
pub mod validator;

/// MEXC WebSocket API base URL for public market data streams.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#websocket-market-data>
pub const BASE_URL_MEXC: &str = "wss://wbs-api.mexc.com/ws";

/// [`Mexc`] spot exchange connector.
///
/// MEXC uses Protocol Buffers for its V3 WebSocket public data streams, with JSON
/// subscription acknowledgements on the same connection.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Mexc;

impl Connector for Mexc {
    const ID: ExchangeId = ExchangeId::MexcSpot;
    type Channel = MexcChannel;
    type Market = MexcMarket;
    type Subscriber = WebSocketSubscriber;
    type SubValidator = MexcWebSocketSubValidator;
    type SubResponse = self::subscription::MexcSubResponse;

    fn url() -> Result<Url, SocketError> {
        Url::parse(BASE_URL_MEXC).map_err(SocketError::UrlParse)
    }

    fn requests(exchange_subs: Vec<ExchangeSub<Self::Channel, Self::Market>>) -> Vec<WsMessage> {
        if exchange_subs.is_empty() {
            return Vec::new();
        }
        let interval = MexcAggInterval::default();

        let topics = exchange_subs
            .into_iter()
            .map(|sub| format!("{}@{}@{}", sub.channel.0, interval.as_str(), sub.market.0))
            .collect::<Vec<String>>();

        let subscription = MexcWsSub {
            method: MexcWsMethod::Subscription,
            params: Cow::Owned(topics),
            id: Utc::now().timestamp_millis() as u64,
        };

        match serde_json::to_string(&subscription) {
            Ok(payload) => vec![WsMessage::text(payload)],
            Err(error) => {
                tracing::error!(%error, "failed to serialise Mexc subscription request");
                Vec::new()
            }
        }
    }

    fn expected_responses<InstrumentKey>(_: &Map<InstrumentKey>) -> usize {
        // All topics are batched into a single SUBSCRIPTION request
        1
    }
}

impl std::fmt::Display for Mexc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mexc")
    }
}

impl<'de> Deserialize<'de> for Mexc {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let input = <String as Deserialize>::deserialize(deserializer)?;
        if input.as_str() == Self::ID.as_str() {
            Ok(Self)
        } else {
            Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(input.as_str()),
                &Self::ID.as_str(),
            ))
        }
    }
}

impl Serialize for Mexc {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(Self::ID.as_str())
    }
}

impl Identifier<Option<SubscriptionId>> for proto::PushDataV3ApiWrapper {
    fn id(&self) -> Option<SubscriptionId> {
        // Messages are tagged with a `channel` containing the base topic, interval and
        // symbol (eg/ "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT").
        // `SubscriptionId`s for `Mexc` streams are stored as "{base_channel}|{symbol}",
        // so the parts are parsed here to match.
        let mut parts = self.channel.rsplitn(3, '@');

        let symbol_from_channel = parts.next();
        let _interval = parts.next();
        let base_channel = parts.next();

        match (symbol_from_channel, base_channel) {
            (Some(symbol), Some(base)) => {
                let symbol = self.symbol.as_deref().unwrap_or(symbol);
                Some(SubscriptionId::from(format!("{base}|{symbol}")))
            }
            _ => Some(SubscriptionId::from(self.channel.as_str())),
        }
    }
}

impl<Instrument> StreamSelector<Instrument, BookTickers> for Mexc
where
    Instrument: InstrumentData,
{
    type SnapFetcher = NoInitialSnapshots;
    type Stream = ExchangeWsPbStream<
        StatelessTransformer<Self, Instrument::Key, BookTickers, proto::PushDataV3ApiWrapper>,
    >;
}

impl<Instrument> StreamSelector<Instrument, PublicTrades> for Mexc
where
    Instrument: InstrumentData,
{
    type SnapFetcher = NoInitialSnapshots;
    type Stream = ExchangeWsPbStream<
        StatelessTransformer<Self, Instrument::Key, PublicTrades, proto::PushDataV3ApiWrapper>,
    >;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_data_wrapper_subscription_id() {
        struct TestCase {
            input: proto::PushDataV3ApiWrapper,
            expected: Option<SubscriptionId>,
        }

        let tests = vec![
            TestCase {
                // TC0: channel with interval and symbol
                input: proto::PushDataV3ApiWrapper {
                    channel: "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".to_string(),
                    symbol: None,
                    symbol_id: None,
                    create_time: None,
                    send_time: None,
                    body: None,
                },
                expected: Some(SubscriptionId::from(
                    "spot@public.aggre.bookTicker.v3.api.pb|BTCUSDT",
                )),
            },
            TestCase {
                // TC1: explicit symbol field takes precedence
                input: proto::PushDataV3ApiWrapper {
                    channel: "spot@public.aggre.bookTicker.v3.api.pb@100ms@OTHER".to_string(),
                    symbol: Some("ETHUSDT".to_string()),
                    symbol_id: None,
                    create_time: None,
                    send_time: None,
                    body: None,
                },
                expected: Some(SubscriptionId::from(
                    "spot@public.aggre.bookTicker.v3.api.pb|ETHUSDT",
                )),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.id(), test.expected, "TC{} failed", index);
        }
    }
}
