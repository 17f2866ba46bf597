use super::proto;
use crate::{
    error::DataError,
    event::{MarketEvent, MarketIter},
    subscription::book::BookTicker,
};
use basis_instrument::exchange::ExchangeId;
use chrono::{DateTime, Utc};

pub(super) fn ms_epoch_to_datetime_utc(ms: i64) -> Result<DateTime<Utc>, DataError> {
    if ms < 0 {
        return Err(DataError::Socket(format!(
            "unsupported Mexc timestamp: invalid unix_epoch_ms (negative): {ms}"
        )));
    }
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        DataError::Socket(format!(
            "unsupported Mexc timestamp: invalid unix_epoch_ms: {ms}"
        ))
    })
}

pub(super) fn parse_f64(field: &'static str, value: &str) -> Result<f64, DataError> {
    value.parse::<f64>().map_err(|error| {
        DataError::Socket(format!(
            "failed to parse {field} from Mexc message: '{value}', error: {error}"
        ))
    })
}

impl<InstrumentKey> From<(ExchangeId, InstrumentKey, proto::PushDataV3ApiWrapper)>
    for MarketIter<InstrumentKey, BookTicker>
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

        let Some(proto::push_data_v3_api_wrapper::Body::PublicAggreBookTicker(ticker)) =
            wrapper.body
        else {
            // Non book ticker bodies are not relevant to this stream
            return Self(vec![]);
        };

        let time_exchange = wrapper
            .send_time
            .or(wrapper.create_time)
            .and_then(|ms| ms_epoch_to_datetime_utc(ms).ok())
            .unwrap_or(time_received);

        let parsed = parse_f64("bid_price", &ticker.bid_price)
            .and_then(|bid_price| {
                parse_f64("bid_quantity", &ticker.bid_quantity).map(|bid_amount| (bid_price, bid_amount))
            })
            .and_then(|(bid_price, bid_amount)| {
                parse_f64("ask_price", &ticker.ask_price)
                    .map(|ask_price| (bid_price, bid_amount, ask_price))
            })
            .and_then(|(bid_price, bid_amount, ask_price)| {
                parse_f64("ask_quantity", &ticker.ask_quantity)
                    .map(|ask_amount| (bid_price, bid_amount, ask_price, ask_amount))
            });

        let (bid_price, bid_amount, ask_price, ask_amount) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => return Self(vec![Err(error)]),
        };

        Self(vec![Ok(MarketEvent {
            time_exchange,
            time_received,
            exchange: exchange_id,
            instrument,
            kind: BookTicker {
                time_exchange,
                bid_price,
                bid_amount,
                ask_price,
                ask_amount,
                update_id: None,
            },
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_integration::de::datetime_utc_from_epoch_duration;
    use std::time::Duration;

    fn wrapper(
        body: Option<proto::push_data_v3_api_wrapper::Body>,
    ) -> proto::PushDataV3ApiWrapper {
        proto::PushDataV3ApiWrapper {
            channel: "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".to_string(),
            symbol: Some("BTCUSDT".to_string()),
            symbol_id: None,
            create_time: Some(1609459200000),
            send_time: Some(1609459200500),
            body,
        }
    }

    #[test]
    fn test_public_aggre_book_ticker_into_book_ticker() {
        let input = wrapper(Some(
            proto::push_data_v3_api_wrapper::Body::PublicAggreBookTicker(
                proto::PublicAggreBookTickerV3Api {
                    bid_price: "50000.5".to_string(),
                    bid_quantity: "0.1".to_string(),
                    ask_price: "50001".to_string(),
                    ask_quantity: "0.2".to_string(),
                },
            ),
        ));

        let events = MarketIter::<&str, BookTicker>::from((ExchangeId::MexcSpot, "btc_usdt", input))
            .0
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];

        let expected_time = datetime_utc_from_epoch_duration(Duration::from_millis(1609459200500));
        assert_eq!(event.exchange, ExchangeId::MexcSpot);
        assert_eq!(event.time_exchange, expected_time);
        assert_eq!(event.kind.bid_price, 50000.5);
        assert_eq!(event.kind.bid_amount, 0.1);
        assert_eq!(event.kind.ask_price, 50001.0);
        assert_eq!(event.kind.ask_amount, 0.2);
    }

    #[test]
    fn test_public_aggre_book_ticker_invalid_price() {
        let input = wrapper(Some(
            proto::push_data_v3_api_wrapper::Body::PublicAggreBookTicker(
                proto::PublicAggreBookTickerV3Api {
                    bid_price: "not_a_number".to_string(),
                    bid_quantity: "0.1".to_string(),
                    ask_price: "50001".to_string(),
                    ask_quantity: "0.2".to_string(),
                },
            ),
        ));

        let events =
            MarketIter::<&str, BookTicker>::from((ExchangeId::MexcSpot, "btc_usdt", input)).0;

        assert_eq!(events.len(), 1);
        match &events[0] {
            Err(DataError::Socket(message)) => {
                assert!(message.contains("failed to parse bid_price"))
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_non_book_ticker_body_is_skipped() {
        let input = wrapper(None);

        let events =
            MarketIter::<&str, BookTicker>::from((ExchangeId::MexcSpot, "btc_usdt", input)).0;
        assert!(events.is_empty());
    }
}
