use self::subscription::ExchangeSub;
use crate::{
    MarketStream, SnapshotFetcher,
    instrument::InstrumentData,
    subscriber::{Subscriber, validator::SubscriptionValidator},
    subscription::{Map, SubscriptionKind},
};
use basis_instrument::exchange::ExchangeId;
use basis_integration::{Validator, error::SocketError, protocol::websocket::WsMessage};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};
use url::Url;

/// `Mexc` [`Connector`] and [`StreamSelector`] implementations.
pub mod mexc;

/// `GateioSpot` & `GateioPerpetualsUsd` [`Connector`] and [`StreamSelector`] implementations.
pub mod gateio;

/// Defines the generic [`ExchangeSub`] containing a market and channel combination used by an
/// exchange [`Connector`] to build [`WsMessage`] subscription payloads.
pub mod subscription;

/// Default [`Duration`] the [`Connector::SubValidator`] will wait to receive all success responses
/// to actioned `Subscription` requests.
pub const DEFAULT_SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Defines the [`MarketStream`] kind associated with an exchange
/// `Subscription` [`SubscriptionKind`].
///
/// ### Notes
/// Must be implemented by an exchange [`Connector`] if it supports a specific
/// [`SubscriptionKind`].
pub trait StreamSelector<Instrument, Kind>
where
    Self: Connector,
    Instrument: InstrumentData,
    Kind: SubscriptionKind,
{
    type SnapFetcher: SnapshotFetcher<Self, Kind>;
    type Stream: MarketStream<Self, Instrument, Kind>;
}

/// Primary exchange abstraction. Defines how to translate Basis types into exchange specific
/// types, as well as connecting, subscribing, and interacting with the exchange server.
///
/// ### Notes
/// This must be implemented for a new exchange integration! Venue quirks (ping method,
/// message format, subscription shape) are captured by the associated types and methods of
/// this trait rather than by code forks in the stream machinery.
pub trait Connector
where
    Self: Clone + Default + Debug + Sized,
{
    /// Unique identifier for the exchange server being connected with.
    const ID: ExchangeId;

    /// Type that defines how to translate a Basis `Subscription` into an exchange specific
    /// channel to be subscribed to.
    ///
    /// ### Examples
    /// - `GateioChannel("spot.book_ticker")`
    /// - `MexcChannel("spot@public.aggre.bookTicker.v3.api.pb")`
    type Channel: AsRef<str>;

    /// Type that defines how to translate a Basis `Subscription` into an exchange specific
    /// market that can be subscribed to.
    ///
    /// ### Examples
    /// - `GateioMarket("BTC_USDT")`
    /// - `MexcMarket("BTCUSDT")`
    type Market: AsRef<str>;

    /// [`Subscriber`] type that establishes a connection with the exchange server, and actions
    /// `Subscription`s over the socket.
    type Subscriber: Subscriber;

    /// [`SubscriptionValidator`] type that listens to responses from the exchange server and
    /// validates if the actioned `Subscription`s were successful.
    type SubValidator: SubscriptionValidator;

    /// Deserialisable type that the [`Self::SubValidator`] expects to receive from the exchange
    /// server in response to the `Subscription` [`Self::requests`] sent over the
    /// [`WebSocket`](basis_integration::protocol::websocket::WebSocket). Implements
    /// [`Validator`] in order to determine if [`Self`] communicates a successful `Subscription`
    /// outcome.
    type SubResponse: Validator + Debug + DeserializeOwned;

    /// Base [`Url`] of the exchange server being connected with.
    fn url() -> Result<Url, SocketError>;

    /// Defines [`PingInterval`] of custom application-level
    /// [`WebSocket`](basis_integration::protocol::websocket::WebSocket) pings for the exchange
    /// server being connected with.
    ///
    /// Defaults to `None`, meaning that no custom pings are sent.
    fn ping_interval() -> Option<PingInterval> {
        None
    }

    /// Defines how to translate a collection of [`ExchangeSub`]s into the [`WsMessage`]
    /// subscription payloads sent to the exchange server.
    fn requests(exchange_subs: Vec<ExchangeSub<Self::Channel, Self::Market>>) -> Vec<WsMessage>;

    /// Number of `Subscription` responses expected from the exchange server in response to the
    /// requests sent. Used to validate all `Subscription`s were accepted.
    fn expected_responses<InstrumentKey>(map: &Map<InstrumentKey>) -> usize {
        map.0.len()
    }

    /// Expected [`Duration`] the [`SubscriptionValidator`] will wait to receive all success
    /// responses to actioned `Subscription` requests.
    fn subscription_timeout() -> Duration {
        DEFAULT_SUBSCRIPTION_TIMEOUT
    }
}

/// Used when an exchange serves different
/// [`MarketDataInstrumentKind`](basis_instrument::instrument::kind::MarketDataInstrumentKind)
/// market data on distinct servers, allowing all the [`Connector`] logic to be identical apart
/// from what this trait provides.
///
/// ### Examples
/// - `GateioServerSpot`
/// - `GateioServerPerpetualsUsd`
pub trait ExchangeServer: Default + Debug + Clone + Send {
    const ID: ExchangeId;
    fn websocket_url() -> &'static str;
}

/// Defines the frequency and construction function for custom
/// [`WebSocket`](basis_integration::protocol::websocket::WebSocket) pings - used for venues
/// that require additional application-level pings.
#[derive(Debug)]
pub struct PingInterval {
    pub interval: tokio::time::Interval,
    pub ping: fn() -> WsMessage,
}
