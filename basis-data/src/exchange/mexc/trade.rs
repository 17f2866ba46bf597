use super::{
    book::{ms_epoch_to_datetime_utc, parse_f64},
    proto,
};
use crate::{
    error::DataError,
    event::{MarketEvent, MarketIter},
    subscription::trade::PublicTrade,
};
use basis_instrument::{Side, exchange::ExchangeId};
use chrono::Utc;

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, proto::PushDataV3ApiWrapper)>
    for MarketIter<InstrumentKey, PublicTrade>
where
    InstrumentKey: Clone,
{
    fn from(
        (exchange_id, instrument, wrapper): (
            ExchangeId,
            InstrumentKey,
            proto::PushDataV3ApiWrapper,
        ),
    ) -> Self {
        let time_received = Utc::now();

        let Some(proto::push_data_v3_api_wrapper::Body::PublicAggreDeals(deals)) = wrapper.body
        else {
            // Non deals bodies are not relevant to this stream
            return Self(vec![]);
        };

        let events = deals
            .deals
            .iter()
            .map(|deal| {
                let price = parse_f64("price", &deal.price)?;
                let amount = parse_f64("quantity", &deal.quantity)?;
                let side = match deal.trade_type {
                    1 => Side::Buy,
                    2 => Side::Sell,
                    other => {
                        return Err(DataError::Socket(format!(
                            "unsupported Mexc deal trade_type: {other}"
                        )));
                    }
                };
                let time_exchange =
                    ms_epoch_to_datetime_utc(deal.time).unwrap_or(time_received);

                Ok(MarketEvent {
                    time_exchange,
                    time_received,
                    exchange: exchange_id,
                    instrument: instrument.clone(),
                    kind: PublicTrade {
                        id: deal.time.to_string(),
                        price,
                        amount,
                        side,
                    },
                })
            })
            .collect();

        Self(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_aggre_deals_into_public_trades() {
        let wrapper = proto::PushDataV3ApiWrapper {
            channel: "spot@public.aggre.deals.v3.api.pb@100ms@BTCUSDT".to_string(),
            symbol: Some("BTCUSDT".to_string()),
            symbol_id: None,
            create_time: Some(1609459200000),
            send_time: Some(1609459200500),
            body: Some(proto::push_data_v3_api_wrapper::Body::PublicAggreDeals(
                proto::PublicAggreDealsV3Api {
                    deals: vec![
                        proto::PublicAggreDealItem {
                            price: "50000.5".to_string(),
                            quantity: "0.5".to_string(),
                            trade_type: 1,
                            time: 1609459200100,
                        },
                        proto::PublicAggreDealItem {
                            price: "50001.0".to_string(),
                            quantity: "0.25".to_string(),
                            trade_type: 2,
                            time: 1609459200200,
                        },
                    ],
                    event_type: "spot@public.aggre.deals.v3.api.pb".to_string(),
                },
            )),
        };

        let events =
            MarketIter::<&str, PublicTrade>::from((ExchangeId::MexcSpot, "btc_usdt", wrapper))
                .0
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind.side, Side::Buy);
        assert_eq!(events[0].kind.price, 50000.5);
        assert_eq!(events[1].kind.side, Side::Sell);
        assert_eq!(events[1].kind.amount, 0.25);
    }

    #[test]
    fn test_unsupported_trade_type_is_error() {
        let wrapper = proto::PushDataV3ApiWrapper {
            channel: "spot@public.aggre.deals.v3.api.pb@100ms@BTCUSDT".to_string(),
            symbol: None,
            symbol_id: None,
            create_time: None,
            send_time: None,
            body: Some(proto::push_data_v3_api_wrapper::Body::PublicAggreDeals(
                proto::PublicAggreDealsV3Api {
                    deals: vec![proto::PublicAggreDealItem {
                        price: "50000.5".to_string(),
                        quantity: "0.5".to_string(),
                        trade_type: 9,
                        time: 1609459200100,
                    }],
                    event_type: "spot@public.aggre.deals.v3.api.pb".to_string(),
                },
            )),
        };

        let events =
            MarketIter::<&str, PublicTrade>::from((ExchangeId::MexcSpot, "btc_usdt", wrapper)).0;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(DataError::Socket(_))));
    }
}
