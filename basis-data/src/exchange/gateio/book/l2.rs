use super::GateioLevel;
use crate::exchange::gateio::channel::GateioChannel;
use crate::{
    Identifier, SnapshotFetcher,
    books::OrderBook,
    error::DataError,
    event::{MarketEvent, MarketIter},
    exchange::{
        Connector,
        gateio::{market::GateioMarket, message::GateioMessage, spot::GateioSpot},
        subscription::ExchangeSub,
    },
    instrument::InstrumentData,
    subscription::{
        Map, Subscription,
        book::{OrderBookEvent, OrderBooksL2},
    },
    transformer::ExchangeTransformer,
};
use async_trait::async_trait;
use basis_instrument::exchange::ExchangeId;
use basis_integration::{
    Transformer, error::SocketError, protocol::websocket::WsMessage,
    subscription::SubscriptionId,
};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// [`GateioSpot`] HTTP OrderBook L2 snapshot url.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#retrieve-order-book>
pub const HTTP_BOOK_L2_SNAPSHOT_URL_GATEIO_SPOT: &str =
    "https://api.gateio.ws/api/v4/spot/order_book";

/// [`GateioSpot`] OrderBook L2 snapshot fetched via the REST API before incremental
/// WebSocket updates are applied.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioOrderBookL2Snapshot {
    pub id: u64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub current: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub update: Option<DateTime<Utc>>,
    pub bids: Vec<GateioLevel>,
    pub asks: Vec<GateioLevel>,
}

impl From<GateioOrderBookL2Snapshot> for OrderBookEvent {
    fn from(snapshot: GateioOrderBookL2Snapshot) -> Self {
        Self::Snapshot(OrderBook::new(
            snapshot.id,
            snapshot.update,
            snapshot.bids,
            snapshot.asks,
        ))
    }
}

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, GateioOrderBookL2Snapshot)>
    for MarketEvent<InstrumentKey, OrderBookEvent>
{
    fn from(
        (exchange, instrument, snapshot): (ExchangeId, InstrumentKey, GateioOrderBookL2Snapshot),
    ) -> Self {
        let time_received = Utc::now();
        Self {
            time_exchange: snapshot.update.unwrap_or(time_received),
            time_received,
            exchange,
            instrument,
            kind: OrderBookEvent::from(snapshot),
        }
    }
}

#[derive(Debug)]
pub struct GateioSpotOrderBooksL2SnapshotFetcher;

impl SnapshotFetcher<GateioSpot, OrderBooksL2> for GateioSpotOrderBooksL2SnapshotFetcher {
    fn fetch_snapshots<Instrument>(
        subscriptions: &[Subscription<GateioSpot, Instrument, OrderBooksL2>],
    ) -> impl Future<Output = Result<Vec<MarketEvent<Instrument::Key, OrderBookEvent>>, SocketError>>
    + Send
    where
        Instrument: InstrumentData,
        Subscription<GateioSpot, Instrument, OrderBooksL2>: Identifier<GateioMarket>,
    {
        let l2_snapshot_futures = subscriptions.iter().map(|sub| {
            // Construct initial OrderBook snapshot GET url
            let market = sub.id();
            let snapshot_url = format!(
                "{}?currency_pair={}&limit=100&with_id=true",
                HTTP_BOOK_L2_SNAPSHOT_URL_GATEIO_SPOT,
                market.as_ref(),
            );

            async move {
                // Fetch initial OrderBook snapshot via HTTP
                let snapshot = reqwest::get(snapshot_url)
                    .await
                    .map_err(SocketError::Http)?
                    .json::<GateioOrderBookL2Snapshot>()
                    .await
                    .map_err(SocketError::Http)?;

                Ok(MarketEvent::from((
                    ExchangeId::GateioSpot,
                    sub.instrument.key().clone(),
                    snapshot,
                )))
            }
        });

        try_join_all(l2_snapshot_futures)
    }
}

#[derive(Debug, Constructor)]
pub struct GateioOrderBookL2Meta<InstrumentKey, Sequencer> {
    pub key: InstrumentKey,
    pub sequencer: Sequencer,
}

#[derive(Debug)]
pub struct GateioSpotOrderBooksL2Transformer<InstrumentKey> {
    instrument_map: Map<GateioOrderBookL2Meta<InstrumentKey, GateioSpotOrderBookL2Sequencer>>,
}

#[async_trait]
impl<InstrumentKey> ExchangeTransformer<GateioSpot, InstrumentKey, OrderBooksL2>
    for GateioSpotOrderBooksL2Transformer<InstrumentKey>
where
    InstrumentKey: Clone + PartialEq + Send + Sync,
{
    async fn init(
        instrument_map: Map<InstrumentKey>,
        initial_snapshots: &[MarketEvent<InstrumentKey, OrderBookEvent>],
        _: UnboundedSender<WsMessage>,
    ) -> Result<Self, DataError> {
        let instrument_map = instrument_map
            .0
            .into_iter()
            .map(|(sub_id, instrument_key)| {
                let snapshot = initial_snapshots
                    .iter()
                    .find(|snapshot| snapshot.instrument == instrument_key)
                    .ok_or_else(|| DataError::InitialSnapshotMissing(sub_id.clone()))?;

                let OrderBookEvent::Snapshot(snapshot) = &snapshot.kind else {
                    return Err(DataError::InitialSnapshotInvalid(String::from(
                        "expected OrderBookEvent::Snapshot but found OrderBookEvent::Update",
                    )));
                };

                let sequencer = GateioSpotOrderBookL2Sequencer::new(snapshot.sequence());

                Ok((
                    sub_id,
                    GateioOrderBookL2Meta::new(instrument_key, sequencer),
                ))
            })
            .collect::<Result<Map<_>, _>>()?;

        Ok(Self { instrument_map })
    }
}

impl<InstrumentKey> Transformer for GateioSpotOrderBooksL2Transformer<InstrumentKey>
where
    InstrumentKey: Clone,
{
    type Error = DataError;
    type Input = GateioOrderBookL2;
    type Output = MarketEvent<InstrumentKey, OrderBookEvent>;
    type OutputIter = Vec<Result<Self::Output, Self::Error>>;

    fn transform(&mut self, input: Self::Input) -> Self::OutputIter {
        // Determine if the message has an identifiable SubscriptionId
        let subscription_id = match input.id() {
            Some(subscription_id) => subscription_id,
            None => return vec![],
        };

        // Find Instrument associated with Input and transform
        let instrument = match self.instrument_map.find_mut(&subscription_id) {
            Ok(instrument) => instrument,
            Err(unidentifiable) => return vec![Err(DataError::from(unidentifiable))],
        };

        // Drop any outdated updates & validate sequence for relevant updates
        let valid_update = match instrument.sequencer.validate_sequence(input) {
            Ok(Some(valid_update)) => valid_update,
            Ok(None) => return vec![],
            Err(error) => return vec![Err(error)],
        };

        MarketIter::<InstrumentKey, OrderBookEvent>::from((
            GateioSpot::ID,
            instrument.key.clone(),
            valid_update,
        ))
        .0
    }
}

/// Tracks the `last_update_id` of a local [`GateioSpot`] OrderBook, dropping stale updates
/// and surfacing sequence gaps.
///
/// ### How to maintain the local order book
/// 1. Subscribe `spot.order_book_update` with a 100ms update frequency.
/// 2. Retrieve the base order book via REST with `with_id=true` and record its id (`baseId`).
/// 3. An update is applicable when `U <= baseId+1 <= u` - amounts are absolute, zero deletes
///    the price level.
/// 4. Updates with `u < baseId+1` are stale and dropped.
/// 5. An update with `U > baseId+1` means updates were lost - the local book must be
///    reconstructed from a fresh snapshot.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#order-book-update-notification>
#[derive(Debug, Constructor)]
pub struct GateioSpotOrderBookL2Sequencer {
    pub last_update_id: u64,
}

impl GateioSpotOrderBookL2Sequencer {
    pub fn validate_sequence(
        &mut self,
        update: GateioOrderBookL2,
    ) -> Result<Option<GateioOrderBookL2>, DataError> {
        // Stale update entirely before the snapshot - drop
        if update.data.last_update_id < self.last_update_id + 1 {
            return Ok(None);
        }

        // Gap between the local book and the update - force resync
        if update.data.first_update_id > self.last_update_id + 1 {
            return Err(DataError::InvalidSequence {
                prev_last_update_id: self.last_update_id,
                first_update_id: update.data.first_update_id,
            });
        }

        self.last_update_id = update.data.last_update_id;
        Ok(Some(update))
    }
}

pub type GateioOrderBookL2 = GateioMessage<GateioOrderBookL2Update>;

/// [`GateioSpot`] incremental OrderBook Level2 WebSocket message.
///
/// ### Payload Examples
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#changed-order-book-levels>
/// ```json
/// {
///    "t": 1606294781123,
///    "e": "depthUpdate",
///    "E": 1606294781,
///    "s": "BTC_USDT",
///    "U": 48776301,
///    "u": 48776306,
///    "b": [
///      ["19137.74", "0.0001"],
///      ["19088.37", "0"]
///    ],
///    "a": [
///      ["19137.75", "0.6135"]
///    ]
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioOrderBookL2Update {
    #[serde(alias = "s", deserialize_with = "de_ob_l2_subscription_id")]
    pub subscription_id: SubscriptionId,
    #[serde(default, rename = "t", with = "chrono::serde::ts_milliseconds_option")]
    pub time_engine: Option<DateTime<Utc>>,
    #[serde(rename = "U")]
    pub first_update_id: u64,
    #[serde(rename = "u")]
    pub last_update_id: u64,
    #[serde(rename = "b")]
    pub bids: Vec<GateioLevel>,
    #[serde(rename = "a")]
    pub asks: Vec<GateioLevel>,
}

impl Identifier<Option<SubscriptionId>> for GateioOrderBookL2 {
    fn id(&self) -> Option<SubscriptionId> {
        Some(self.data.subscription_id.clone())
    }
}

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, GateioOrderBookL2)>
    for MarketIter<InstrumentKey, OrderBookEvent>
{
    fn from(
        (exchange, instrument, message): (ExchangeId, InstrumentKey, GateioOrderBookL2),
    ) -> Self {
        let time_received = Utc::now();
        Self(vec![Ok(MarketEvent {
            time_exchange: message.data.time_engine.unwrap_or(time_received),
            time_received,
            exchange,
            instrument,
            kind: OrderBookEvent::Update(OrderBook::new(
                message.data.last_update_id,
                message.data.time_engine,
                message.data.bids,
                message.data.asks,
            )),
        })])
    }
}

pub fn de_ob_l2_subscription_id<'de, D>(deserializer: D) -> Result<SubscriptionId, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    <&str as Deserialize>::deserialize(deserializer)
        .map(|market| ExchangeSub::from((GateioChannel::ORDER_BOOK_L2, market)).id())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod de {
        use super::*;

        #[test]
        fn test_gateio_order_book_l2_update() {
            struct TestCase {
                input: &'static str,
                expected: GateioOrderBookL2Update,
            }

            let tests = vec![TestCase {
                // TC0: valid spot GateioOrderBookL2Update
                input: r#"
                    {
                        "s":"BTC_USDT",
                        "U": 48776301,
                        "u": 48776306,
                        "b": [
                            [
                                "4.00000000",
                                "431.00000000"
                            ]
                        ],
                        "a": [
                            [
                                "4.00000200",
                                "12.00000000"
                            ]
                        ]
                    }
                    "#,
                expected: GateioOrderBookL2Update {
                    subscription_id: SubscriptionId::from("spot.order_book_update|BTC_USDT"),
                    time_engine: Default::default(),
                    first_update_id: 48776301,
                    last_update_id: 48776306,
                    bids: vec![GateioLevel {
                        price: 4.0,
                        amount: 431.0,
                    }],
                    asks: vec![GateioLevel {
                        price: 4.000002,
                        amount: 12.0,
                    }],
                },
            }];

            for (index, test) in tests.into_iter().enumerate() {
                assert_eq!(
                    serde_json::from_str::<GateioOrderBookL2Update>(test.input).unwrap(),
                    test.expected,
                    "TC{} failed",
                    index
                );
            }
        }
    }

    fn update(first_update_id: u64, last_update_id: u64) -> GateioOrderBookL2 {
        GateioMessage {
            channel: "spot.order_book_update".to_string(),
            error: None,
            data: GateioOrderBookL2Update {
                subscription_id: SubscriptionId::from("spot.order_book_update|BTC_USDT"),
                time_engine: None,
                first_update_id,
                last_update_id,
                bids: vec![],
                asks: vec![],
            },
        }
    }

    #[test]
    fn test_sequencer_validate_sequence() {
        struct TestCase {
            sequencer: GateioSpotOrderBookL2Sequencer,
            input: GateioOrderBookL2,
            expected: Result<Option<u64>, DataError>,
        }

        let tests = vec![
            TestCase {
                // TC0: applicable update spanning last_update_id+1
                sequencer: GateioSpotOrderBookL2Sequencer::new(100),
                input: update(99, 103),
                expected: Ok(Some(103)),
            },
            TestCase {
                // TC1: stale update entirely before the snapshot - dropped
                sequencer: GateioSpotOrderBookL2Sequencer::new(100),
                input: update(90, 100),
                expected: Ok(None),
            },
            TestCase {
                // TC2: gap detected (eg/ ids 100,101 applied then 103 arrives) - resync
                sequencer: GateioSpotOrderBookL2Sequencer::new(101),
                input: update(103, 104),
                expected: Err(DataError::InvalidSequence {
                    prev_last_update_id: 101,
                    first_update_id: 103,
                }),
            },
        ];

        for (index, mut test) in tests.into_iter().enumerate() {
            let actual = test
                .sequencer
                .validate_sequence(test.input)
                .map(|update| update.map(|update| update.data.last_update_id));

            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_sequencer_advances_last_update_id() {
        let mut sequencer = GateioSpotOrderBookL2Sequencer::new(100);

        assert!(sequencer.validate_sequence(update(100, 101)).is_ok());
        assert_eq!(sequencer.last_update_id, 101);

        assert!(sequencer.validate_sequence(update(102, 105)).is_ok());
        assert_eq!(sequencer.last_update_id, 105);
    }
}
