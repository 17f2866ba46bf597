use super::super::message::GateioMessage;
use crate::{
    Identifier,
    event::{MarketEvent, MarketIter},
    exchange::subscription::ExchangeSub,
    subscription::trade::PublicTrade,
};
use basis_instrument::{Side, exchange::ExchangeId};
use basis_integration::subscription::SubscriptionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terse type alias for a [`GateioPerpetualsUsd`](super::GateioPerpetualsUsd) real-time trades
/// WebSocket message.
pub type GateioFuturesTrades = GateioMessage<Vec<GateioFuturesTradeInner>>;

/// [`GateioPerpetualsUsd`](super::GateioPerpetualsUsd) real-time trade WebSocket message.
///
/// Negative `size` communicates a taker sell.
///
/// ### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/futures/ws/en/#trades-api>
/// ```json
/// {
///   "id": 27753479,
///   "create_time": 1545136464,
///   "create_time_ms": 1545136464123,
///   "price": "96.4",
///   "size": -108,
///   "contract": "BTC_USDT"
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioFuturesTradeInner {
    #[serde(rename = "contract")]
    pub market: String,
    #[serde(
        rename = "create_time_ms",
        deserialize_with = "basis_integration::de::de_u64_epoch_ms_as_datetime_utc"
    )]
    pub time: DateTime<Utc>,
    pub id: u64,
    #[serde(deserialize_with = "basis_integration::de::de_str")]
    pub price: f64,
    #[serde(rename = "size")]
    pub amount: f64,
}

impl Identifier<Option<SubscriptionId>> for GateioFuturesTrades {
    fn id(&self) -> Option<SubscriptionId> {
        self.data
            .first()
            .map(|trade| ExchangeSub::from((&self.channel, &trade.market)).id())
    }
}

impl<InstrumentKey: Clone> From<(ExchangeId, InstrumentKey, GateioFuturesTrades)>
    for MarketIter<InstrumentKey, PublicTrade>
{
    fn from(
        (exchange, instrument, trades): (ExchangeId, InstrumentKey, GateioFuturesTrades),
    ) -> Self {
        trades
            .data
            .into_iter()
            .map(|trade| {
                Ok(MarketEvent {
                    time_exchange: trade.time,
                    time_received: Utc::now(),
                    exchange,
                    instrument: instrument.clone(),
                    kind: PublicTrade {
                        id: trade.id.to_string(),
                        price: trade.price,
                        amount: trade.amount.abs(),
                        side: if trade.amount.is_sign_positive() {
                            Side::Buy
                        } else {
                            Side::Sell
                        },
                    },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod de {
        use super::*;

        #[test]
        fn test_gateio_message_perpetual_trades() {
            let input = r#"
            {
              "time": 1669843487,
              "time_ms": 1669843487733,
              "channel": "futures.trades",
              "event": "update",
              "result": [
                {
                  "contract": "ETH_USDT",
                  "create_time": 1669843487,
                  "create_time_ms": 1669843487724,
                  "id": 180276616,
                  "price": "1287",
                  "size": -3
                }
              ]
            }
            "#;

            let trades = serde_json::from_str::<GateioFuturesTrades>(input).unwrap();
            let events = MarketIter::<&str, PublicTrade>::from((
                ExchangeId::GateioPerpetualsUsd,
                "eth_usdt",
                trades,
            ))
            .0
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

            assert_eq!(events.len(), 1);
            assert_eq!(events[0].kind.side, Side::Sell);
            assert_eq!(events[0].kind.amount, 3.0);
        }
    }
}
