use self::{channel::GateioChannel, market::GateioMarket, subscription::GateioSubResponse};
use crate::{
    exchange::{Connector, ExchangeServer, subscription::ExchangeSub},
    subscriber::{WebSocketSubscriber, validator::WebSocketSubValidator},
};
use basis_instrument::exchange::ExchangeId;
use basis_integration::{error::SocketError, protocol::websocket::WsMessage};
use serde_json::json;
use std::marker::PhantomData;
use url::Url;

/// Defines the type that translates a Basis [`Subscription`](crate::subscription::Subscription)
/// into a [`Gateio`] channel used for generating [`Connector::requests`].
pub mod channel;

/// Defines the type that translates a Basis [`Subscription`](crate::subscription::Subscription)
/// into a [`Gateio`] market used for generating [`Connector::requests`].
pub mod market;

/// Generic [`GateioMessage<T>`](message::GateioMessage) envelope common to all Gate.io servers.
pub mod message;

/// [`Subscription`](crate::subscription::Subscription) response type and response
/// [`Validator`](basis_integration::Validator) common to all Gate.io servers.
pub mod subscription;

/// Book ticker and L2 OrderBook types.
pub mod book;

/// [`ExchangeServer`] and [`StreamSelector`](super::StreamSelector) implementations for
/// [`GateioSpot`](spot::GateioSpot).
pub mod spot;

/// [`ExchangeServer`] and [`StreamSelector`](super::StreamSelector) implementations for
/// [`GateioPerpetualsUsd`](perpetual::GateioPerpetualsUsd).
pub mod perpetual;

/// Generic [`Gateio<Server>`](Gateio) exchange.
///
/// ### Notes
/// An [`ExchangeServer`] implementation exists for
/// [`GateioSpot`](spot::GateioSpot) and [`GateioPerpetualsUsd`](perpetual::GateioPerpetualsUsd).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Gateio<Server> {
    server: PhantomData<Server>,
}

impl<Server> Connector for Gateio<Server>
where
    Server: ExchangeServer,
{
    const ID: ExchangeId = Server::ID;
    type Channel = GateioChannel;
    type Market = GateioMarket;
    type Subscriber = WebSocketSubscriber;
    type SubValidator = WebSocketSubValidator;
    type SubResponse = GateioSubResponse;

    fn url() -> Result<Url, SocketError> {
        Url::parse(Server::websocket_url()).map_err(SocketError::UrlParse)
    }

    fn requests(exchange_subs: Vec<ExchangeSub<Self::Channel, Self::Market>>) -> Vec<WsMessage> {
        exchange_subs
            .into_iter()
            .map(|ExchangeSub { channel, market }| {
                WsMessage::text(
                    json!({
                        "time": chrono::Utc::now().timestamp(),
                        "channel": channel.as_ref(),
                        "event": "subscribe",
                        "payload": market.as_str_vec()
                    })
                    .to_string(),
                )
            })
            .collect()
    }
}

impl<'de, Server> serde::Deserialize<'de> for Gateio<Server>
where
    Server: ExchangeServer,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let input = <String as serde::Deserialize>::deserialize(deserializer)?;
        if input.as_str() == Self::ID.as_str() {
            Ok(Self::default())
        } else {
            Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(input.as_str()),
                &Self::ID.as_str(),
            ))
        }
    }
}

impl<Server> serde::Serialize for Gateio<Server>
where
    Server: ExchangeServer,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(Self::ID.as_str())
    }
}
